use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HabitError, HabitResult};

/// Opaque, stable habit identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Health,
    Fitness,
    Learning,
    Mindfulness,
    Productivity,
    Nutrition,
    Sleep,
    Creativity,
    Social,
    Finance,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Health,
        Category::Fitness,
        Category::Learning,
        Category::Mindfulness,
        Category::Productivity,
        Category::Nutrition,
        Category::Sleep,
        Category::Creativity,
        Category::Social,
        Category::Finance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Health => "Health",
            Category::Fitness => "Fitness",
            Category::Learning => "Learning",
            Category::Mindfulness => "Mindfulness",
            Category::Productivity => "Productivity",
            Category::Nutrition => "Nutrition",
            Category::Sleep => "Sleep",
            Category::Creativity => "Creativity",
            Category::Social => "Social",
            Category::Finance => "Finance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| HabitError::UnknownCategory(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub icon: String,
    pub tag: Category,
    pub streak: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_ICON: &str = "✅";

/// Form input for a habit that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub icon: String,
    pub tag: Category,
}

impl NewHabit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: DEFAULT_ICON.to_string(),
            tag: Category::default(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_tag(mut self, tag: Category) -> Self {
        self.tag = tag;
        self
    }

    pub(crate) fn into_habit(self, id: HabitId, created_at: DateTime<Utc>) -> HabitResult<Habit> {
        let name = validate_name(&self.name)?;
        Ok(Habit {
            id,
            name,
            icon: self.icon,
            tag: self.tag,
            streak: 0,
            completed: false,
            created_at,
        })
    }
}

/// Edit of the user-facing fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub tag: Option<Category>,
}

impl HabitUpdate {
    pub(crate) fn apply(self, habit: &mut Habit) -> HabitResult<()> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        if let Some(name) = name {
            habit.name = name;
        }
        if let Some(icon) = self.icon {
            habit.icon = icon;
        }
        if let Some(tag) = self.tag {
            habit.tag = tag;
        }
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> HabitResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitError::EmptyName);
    }
    Ok(trimmed.to_string())
}

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use habit_core::{
    date_key,
    heatmap::{DEFAULT_WEEKS, MAX_WEEKS},
};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub heatmap_weeks: usize,
    /// Fixed reference date; `None` means the local calendar date.
    pub today: Option<NaiveDate>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|name| std::env::var(name).ok()))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("HABIT_DATA_PATH") {
            let path = path.trim();
            if !path.is_empty() {
                info!(path, "using snapshot path from environment");
                config.data_path = PathBuf::from(path);
            }
        }
        if let Some(weeks) = lookup("HABIT_HEATMAP_WEEKS") {
            if let Ok(value) = weeks.trim().parse::<usize>() {
                if (1..=MAX_WEEKS).contains(&value) {
                    config.heatmap_weeks = value;
                } else {
                    warn!(value, "ignoring HABIT_HEATMAP_WEEKS");
                }
            }
        }
        if let Some(raw) = lookup("HABIT_TODAY") {
            match date_key::parse_key(raw.trim()) {
                Ok(day) => config.today = Some(day),
                Err(err) => warn!(%err, "ignoring HABIT_TODAY"),
            }
        }
        config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("habits.json"),
            heatmap_weeks: DEFAULT_WEEKS,
            today: None,
        }
    }
}

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analytics::{self, CategoryShare};
use crate::calendar::{self, CalendarMonth};
use crate::error::{HabitError, HabitResult};
use crate::habit::{Habit, HabitId, HabitUpdate, NewHabit};
use crate::heatmap::{self, HeatmapCell, WeekRow, DAYS_PER_WEEK};
use crate::ledger::CompletionLedger;
use crate::notifications::{self, NotificationRequest};
use crate::progress::{self, TodayProgress};
use crate::streak;

/// Serializable form handed to and received from persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub completion_ledger: CompletionLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: usize,
    pub today: TodayProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedHabit {
    pub habit: Habit,
    pub pruned_completions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitHistory {
    pub habit_id: HabitId,
    pub graph: String,
    pub streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitTracker {
    habits: Vec<Habit>,
    ledger: CompletionLedger,
}

impl HabitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from persistence, dropping completions of unknown habits.
    pub fn from_snapshot(snapshot: Snapshot) -> HabitResult<Self> {
        let mut seen: HashSet<&HabitId> = HashSet::new();
        for habit in &snapshot.habits {
            if !seen.insert(&habit.id) {
                return Err(HabitError::DuplicateHabit(habit.id.clone()));
            }
        }
        let known: HashSet<HabitId> = snapshot.habits.iter().map(|h| h.id.clone()).collect();

        let mut ledger = snapshot.completion_ledger;
        let dangling = ledger.retain_habits(|id| known.contains(id));
        if dangling > 0 {
            info!(dangling, "dropped completions referencing unknown habits");
        }

        Ok(Self {
            habits: snapshot.habits,
            ledger,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            habits: self.habits.clone(),
            completion_ledger: self.ledger.clone(),
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub fn habit(&self, id: &HabitId) -> HabitResult<&Habit> {
        self.habits
            .iter()
            .find(|habit| &habit.id == id)
            .ok_or_else(|| HabitError::HabitNotFound(id.clone()))
    }

    fn habit_mut(&mut self, id: &HabitId) -> HabitResult<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|habit| &habit.id == id)
            .ok_or_else(|| HabitError::HabitNotFound(id.clone()))
    }

    pub fn add_habit(&mut self, habit: Habit) -> HabitResult<()> {
        if self.habits.iter().any(|existing| existing.id == habit.id) {
            return Err(HabitError::DuplicateHabit(habit.id));
        }
        crate::habit::validate_name(&habit.name)?;
        self.habits.push(habit);
        Ok(())
    }

    pub fn create_habit(
        &mut self,
        new_habit: NewHabit,
        created_at: DateTime<Utc>,
    ) -> HabitResult<Habit> {
        let habit = new_habit.into_habit(HabitId::generate(), created_at)?;
        self.add_habit(habit.clone())?;
        Ok(habit)
    }

    pub fn update_habit(&mut self, id: &HabitId, update: HabitUpdate) -> HabitResult<Habit> {
        let habit = self.habit_mut(id)?;
        update.apply(habit)?;
        Ok(habit.clone())
    }

    /// Removes the habit and every completion that references it.
    pub fn delete_habit(&mut self, id: &HabitId) -> HabitResult<RemovedHabit> {
        let index = self
            .habits
            .iter()
            .position(|habit| &habit.id == id)
            .ok_or_else(|| HabitError::HabitNotFound(id.clone()))?;
        let habit = self.habits.remove(index);
        let pruned_completions = self.ledger.remove_habit_everywhere(id);
        Ok(RemovedHabit {
            habit,
            pruned_completions,
        })
    }

    /// Flips completion of `id` on `day`; returns `true` when it is now completed.
    ///
    /// The habit's streak counter moves by one in the toggle direction and
    /// never drops below zero. The `completed` flag tracks `today` only.
    pub fn toggle(&mut self, id: &HabitId, day: NaiveDate, today: NaiveDate) -> HabitResult<bool> {
        // Look the habit up first so an unknown id leaves the ledger untouched.
        self.habit(id)?;
        let completed = self.ledger.toggle(day, id);
        let habit = self.habit_mut(id)?;
        habit.streak = if completed {
            habit.streak.saturating_add(1)
        } else {
            habit.streak.saturating_sub(1)
        };
        if day == today {
            habit.completed = completed;
        }
        debug!(habit = %id, %day, completed, streak = habit.streak, "toggled completion");
        Ok(completed)
    }

    /// Records a completion unless one already exists; returns whether anything changed.
    pub fn mark_complete(
        &mut self,
        id: &HabitId,
        day: NaiveDate,
        today: NaiveDate,
    ) -> HabitResult<bool> {
        self.habit(id)?;
        if self.ledger.contains(day, id) {
            return Ok(false);
        }
        self.toggle(id, day, today)
    }

    /// Re-derives every habit's `completed` flag from the ledger, e.g. after midnight.
    pub fn refresh_completed_flags(&mut self, today: NaiveDate) {
        let done = self.ledger.get_by_date(today);
        for habit in &mut self.habits {
            habit.completed = done.contains(&habit.id);
        }
    }

    pub fn reset_ledger(&mut self) {
        self.ledger.clear();
        for habit in &mut self.habits {
            habit.completed = false;
            habit.streak = 0;
        }
    }

    /// Every habit, with `completed` reflecting `day` instead of today.
    pub fn habits_on(&self, day: NaiveDate) -> Vec<Habit> {
        let done = self.ledger.get_by_date(day);
        self.habits
            .iter()
            .map(|habit| Habit {
                completed: done.contains(&habit.id),
                ..habit.clone()
            })
            .collect()
    }

    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        streak::current_streak(&self.ledger, today)
    }

    pub fn longest_streak(&self) -> u32 {
        streak::longest_streak(&self.ledger)
    }

    pub fn total_completed(&self) -> usize {
        streak::total_completed(&self.ledger)
    }

    pub fn today_progress(&self, today: NaiveDate) -> TodayProgress {
        progress::today_progress(&self.ledger, self.habits.len(), today)
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        Statistics {
            current_streak: self.current_streak(today),
            longest_streak: self.longest_streak(),
            total_completed: self.total_completed(),
            today: self.today_progress(today),
        }
    }

    pub fn heatmap(&self, weeks: usize, reference: NaiveDate) -> Vec<WeekRow> {
        heatmap::build_grid(&self.ledger, weeks, reference)
    }

    pub fn heatmap_cells(
        &self,
        weeks: usize,
        reference: NaiveDate,
    ) -> Vec<[HeatmapCell; DAYS_PER_WEEK]> {
        heatmap::heatmap_cells(&self.ledger, weeks, reference)
    }

    pub fn calendar_month(&self, year: i32, month: u32, today: NaiveDate) -> Option<CalendarMonth> {
        calendar::calendar_month(year, month, &self.ledger, &self.habits, today)
    }

    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        analytics::category_breakdown(&self.habits)
    }

    pub fn habits_by_streak(&self) -> Vec<Habit> {
        analytics::habits_by_streak(&self.habits)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn habit_history(
        &self,
        id: &HabitId,
        days: usize,
        today: NaiveDate,
    ) -> HabitResult<HabitHistory> {
        let habit = self.habit(id)?;
        Ok(HabitHistory {
            habit_id: habit.id.clone(),
            graph: streak::habit_history_graph(&self.ledger, id, days, today),
            streak: streak::habit_current_streak(&self.ledger, id, today),
        })
    }

    pub fn pending_reminders(
        &self,
        today: NaiveDate,
        at: DateTime<Utc>,
    ) -> Vec<NotificationRequest> {
        notifications::pending_reminders(&self.habits, &self.ledger, today, at)
    }
}

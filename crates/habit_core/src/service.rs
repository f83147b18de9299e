use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::{
    analytics::CategoryShare,
    calendar::CalendarMonth,
    habit::{Habit, HabitId, HabitUpdate, NewHabit},
    heatmap::{HeatmapCell, WeekRow, DAYS_PER_WEEK},
    notifications::NotificationSink,
    tracker::{HabitHistory, HabitTracker, RemovedHabit, Snapshot, Statistics},
};

/// Persistence collaborator. The service never saves implicitly; hosts call
/// [`HabitService::save`] after the mutations they want to keep.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}

pub struct HabitService {
    state: RwLock<HabitTracker>,
    store: Option<Box<dyn SnapshotStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

#[derive(Default)]
pub struct HabitServiceBuilder {
    snapshot: Option<Snapshot>,
    store: Option<Box<dyn SnapshotStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the service with `snapshot` instead of loading from the store.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let snapshot = match (self.snapshot, &self.store) {
            (Some(snapshot), _) => snapshot,
            (None, Some(store)) => store
                .load()
                .context("failed to load habit snapshot")?
                .unwrap_or_default(),
            (None, None) => Snapshot::default(),
        };
        let tracker = HabitTracker::from_snapshot(snapshot)?;
        info!(
            habits = tracker.habits().len(),
            active_days = tracker.ledger().active_days(),
            "habit service ready"
        );
        Ok(HabitService {
            state: RwLock::new(tracker),
            store: self.store,
            notification_sink: self.notification_sink,
        })
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    /// Runs `f` against one consistent view of the state.
    pub fn read<T>(&self, f: impl FnOnce(&HabitTracker) -> T) -> T {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.read().snapshot()
    }

    pub fn save(&self) -> Result<()> {
        let Some(store) = &self.store else {
            debug!("no snapshot store configured; skipping save");
            return Ok(());
        };
        let snapshot = self.snapshot();
        store.save(&snapshot).context("failed to save habit snapshot")?;
        info!(habits = snapshot.habits.len(), "habit snapshot saved");
        Ok(())
    }

    /// Replaces the in-memory state with whatever the store holds.
    pub fn reload(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = store
            .load()
            .context("failed to load habit snapshot")?
            .unwrap_or_default();
        let tracker = HabitTracker::from_snapshot(snapshot)?;
        *self.state.write() = tracker;
        Ok(())
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.state.read().habits().to_vec()
    }

    pub fn habit(&self, id: &HabitId) -> Result<Habit> {
        Ok(self.state.read().habit(id)?.clone())
    }

    pub fn get_by_date(&self, day: NaiveDate) -> BTreeSet<HabitId> {
        self.state.read().ledger().get_by_date(day).clone()
    }

    pub fn habits_on(&self, day: NaiveDate) -> Vec<Habit> {
        self.state.read().habits_on(day)
    }

    #[instrument(skip(self, new_habit), fields(name = %new_habit.name))]
    pub fn create_habit(&self, new_habit: NewHabit, created_at: DateTime<Utc>) -> Result<Habit> {
        let habit = self.state.write().create_habit(new_habit, created_at)?;
        info!(id = %habit.id, "habit created");
        Ok(habit)
    }

    #[instrument(skip(self, update))]
    pub fn update_habit(&self, id: &HabitId, update: HabitUpdate) -> Result<Habit> {
        Ok(self.state.write().update_habit(id, update)?)
    }

    #[instrument(skip(self))]
    pub fn delete_habit(&self, id: &HabitId) -> Result<RemovedHabit> {
        let removed = self.state.write().delete_habit(id)?;
        info!(pruned = removed.pruned_completions, "habit deleted");
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_habit(&removed.habit);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn toggle(&self, id: &HabitId, day: NaiveDate, today: NaiveDate) -> Result<bool> {
        Ok(self.state.write().toggle(id, day, today)?)
    }

    pub fn toggle_today(&self, id: &HabitId, today: NaiveDate) -> Result<bool> {
        self.toggle(id, today, today)
    }

    #[instrument(skip(self))]
    pub fn mark_complete(&self, id: &HabitId, day: NaiveDate, today: NaiveDate) -> Result<bool> {
        Ok(self.state.write().mark_complete(id, day, today)?)
    }

    pub fn refresh_completed_flags(&self, today: NaiveDate) {
        self.state.write().refresh_completed_flags(today);
    }

    pub fn reset_ledger(&self) {
        self.state.write().reset_ledger();
        info!("completion ledger reset");
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        self.state.read().statistics(today)
    }

    pub fn heatmap(&self, weeks: usize, reference: NaiveDate) -> Vec<WeekRow> {
        self.state.read().heatmap(weeks, reference)
    }

    pub fn heatmap_cells(
        &self,
        weeks: usize,
        reference: NaiveDate,
    ) -> Vec<[HeatmapCell; DAYS_PER_WEEK]> {
        self.state.read().heatmap_cells(weeks, reference)
    }

    pub fn calendar_month(&self, year: i32, month: u32, today: NaiveDate) -> Option<CalendarMonth> {
        self.state.read().calendar_month(year, month, today)
    }

    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        self.state.read().category_breakdown()
    }

    pub fn habits_by_streak(&self) -> Vec<Habit> {
        self.state.read().habits_by_streak()
    }

    pub fn habit_history(
        &self,
        id: &HabitId,
        days: usize,
        today: NaiveDate,
    ) -> Result<HabitHistory> {
        Ok(self.state.read().habit_history(id, days, today)?)
    }

    /// Schedules a reminder for every habit still open today; returns how many were sent.
    pub fn dispatch_reminders(&self, today: NaiveDate, at: DateTime<Utc>) -> usize {
        let Some(sink) = &self.notification_sink else {
            return 0;
        };
        // Collect under the lock, deliver after releasing it.
        let reminders = self.state.read().pending_reminders(today, at);
        let count = reminders.len();
        for reminder in reminders {
            sink.schedule(reminder);
        }
        debug!(count, "reminders dispatched");
        count
    }

    /// Completes the habit a reminder pointed at and withdraws the reminder.
    #[instrument(skip(self))]
    pub fn complete_from_reminder(&self, id: &HabitId, today: NaiveDate) -> Result<bool> {
        let (changed, habit) = {
            let mut state = self.state.write();
            let changed = state.mark_complete(id, today, today)?;
            (changed, state.habit(id)?.clone())
        };
        if let Some(sink) = &self.notification_sink {
            sink.clear_for_habit(&habit);
        }
        Ok(changed)
    }
}

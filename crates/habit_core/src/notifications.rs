use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, HabitId};
use crate::ledger::CompletionLedger;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    pub habit_id: HabitId,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Platform-specific notification adapters will implement this trait.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
    fn clear_for_habit(&self, habit: &Habit);
}

/// One reminder per habit that has no completion recorded for `today`.
pub fn pending_reminders(
    habits: &[Habit],
    ledger: &CompletionLedger,
    today: NaiveDate,
    at: DateTime<Utc>,
) -> Vec<NotificationRequest> {
    let done = ledger.get_by_date(today);
    habits
        .iter()
        .filter(|habit| !done.contains(&habit.id))
        .map(|habit| NotificationRequest {
            habit_id: habit.id.clone(),
            title: "Habit Reminder".to_string(),
            body: format!("{} {} is still open for today", habit.icon, habit.name),
            scheduled_for: at,
        })
        .collect()
}

pub mod analytics;
pub mod calendar;
pub mod date_key;
pub mod error;
pub mod habit;
pub mod heatmap;
pub mod ledger;
pub mod notifications;
pub mod progress;
pub mod service;
pub mod streak;
pub mod tracker;

pub use crate::error::{HabitError, HabitResult};
pub use crate::habit::{Category, Habit, HabitId, HabitUpdate, NewHabit};
pub use crate::ledger::CompletionLedger;
pub use crate::service::{HabitService, HabitServiceBuilder, SnapshotStore};
pub use crate::tracker::{HabitTracker, Snapshot, Statistics};

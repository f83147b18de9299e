use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::CompletionLedger;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TodayProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

impl TodayProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// Completed-vs-registered ratio for `today`.
pub fn today_progress(
    ledger: &CompletionLedger,
    habit_count: usize,
    today: NaiveDate,
) -> TodayProgress {
    TodayProgress::new(ledger.count_on(today), habit_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitId;

    #[test]
    fn no_habits_means_zero_percent() {
        let ledger = CompletionLedger::new();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let progress = today_progress(&ledger, 0, today);
        assert_eq!(progress, TodayProgress { completed: 0, total: 0, percentage: 0.0 });
    }

    #[test]
    fn ratio_of_completed_today() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut ledger = CompletionLedger::new();
        ledger.insert(today, HabitId::from("a"));
        ledger.insert(today.pred_opt().unwrap(), HabitId::from("b"));
        let progress = today_progress(&ledger, 4, today);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 4);
        assert!((progress.percentage - 25.0).abs() < f64::EPSILON);
    }
}

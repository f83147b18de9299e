use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::habit::{Habit, HabitId};
use crate::ledger::CompletionLedger;

pub const CALENDAR_CELLS: usize = 42;
const MAX_DOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayStatus {
    None,
    Partial,
    Good,
    Perfect,
}

impl DayStatus {
    pub fn classify(completed: usize, total: usize) -> Self {
        if completed == 0 {
            DayStatus::None
        } else if completed * 2 < total {
            DayStatus::Partial
        } else if completed < total {
            DayStatus::Good
        } else {
            DayStatus::Perfect
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub completed: usize,
    pub status: DayStatus,
    /// Up to three completed habits, in registry order.
    pub dots: Vec<HabitId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay]> {
        self.days.chunks(7)
    }
}

/// Returns `None` for an invalid `month` or a grid that leaves chrono's date range.
pub fn calendar_month(
    year: i32,
    month: u32,
    ledger: &CompletionLedger,
    habits: &[Habit],
    today: NaiveDate,
) -> Option<CalendarMonth> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let start = first.checked_sub_days(Days::new(leading))?;

    let mut days = Vec::with_capacity(CALENDAR_CELLS);
    let mut date = start;
    for index in 0..CALENDAR_CELLS {
        if index > 0 {
            date = date.succ_opt()?;
        }
        let completed_ids = ledger.get_by_date(date);
        let dots = habits
            .iter()
            .filter(|habit| completed_ids.contains(&habit.id))
            .take(MAX_DOTS)
            .map(|habit| habit.id.clone())
            .collect();
        days.push(CalendarDay {
            date,
            in_month: date.month() == month && date.year() == year,
            is_today: date == today,
            completed: completed_ids.len(),
            status: DayStatus::classify(completed_ids.len(), habits.len()),
            dots,
        });
    }

    Some(CalendarMonth { year, month, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::NewHabit;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habits(n: usize) -> Vec<Habit> {
        (0..n)
            .map(|i| {
                NewHabit::new(format!("habit {i}"))
                    .into_habit(HabitId::new(format!("h{i}")), Utc::now())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(DayStatus::classify(0, 4), DayStatus::None);
        assert_eq!(DayStatus::classify(1, 4), DayStatus::Partial);
        assert_eq!(DayStatus::classify(2, 4), DayStatus::Good);
        assert_eq!(DayStatus::classify(3, 4), DayStatus::Good);
        assert_eq!(DayStatus::classify(4, 4), DayStatus::Perfect);
        assert_eq!(DayStatus::classify(2, 5), DayStatus::Partial);
        assert_eq!(DayStatus::classify(1, 0), DayStatus::Perfect);
    }

    #[test]
    fn grid_is_padded_from_sunday() {
        // 2025-03-01 is a Saturday.
        let ledger = CompletionLedger::new();
        let view = calendar_month(2025, 3, &ledger, &[], date(2025, 3, 15)).unwrap();
        assert_eq!(view.days.len(), CALENDAR_CELLS);
        assert_eq!(view.days[0].date, date(2025, 2, 23));
        assert!(!view.days[0].in_month);
        assert_eq!(view.days[6].date, date(2025, 3, 1));
        assert!(view.days[6].in_month);
        assert_eq!(view.days[41].date, date(2025, 4, 5));
        assert!(view.days.iter().filter(|d| d.is_today).count() == 1);
        assert_eq!(view.weeks().count(), 6);
    }

    #[test]
    fn dots_follow_registry_order_and_cap_at_three() {
        let registry = habits(5);
        let mut ledger = CompletionLedger::new();
        let day = date(2025, 6, 10);
        for habit in registry.iter().rev() {
            ledger.insert(day, habit.id.clone());
        }
        let view = calendar_month(2025, 6, &ledger, &registry, day).unwrap();
        let cell = view.days.iter().find(|d| d.date == day).unwrap();
        assert_eq!(cell.completed, 5);
        assert_eq!(cell.status, DayStatus::Perfect);
        assert_eq!(
            cell.dots,
            vec![HabitId::from("h0"), HabitId::from("h1"), HabitId::from("h2")]
        );
    }

    #[test]
    fn invalid_month_yields_none() {
        let ledger = CompletionLedger::new();
        assert!(calendar_month(2025, 13, &ledger, &[], date(2025, 1, 1)).is_none());
        assert!(calendar_month(2025, 0, &ledger, &[], date(2025, 1, 1)).is_none());
    }
}

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::ledger::CompletionLedger;

pub const DAYS_PER_WEEK: usize = 7;
/// Width of the dashboard heatmap.
pub const DEFAULT_WEEKS: usize = 13;
/// Ten years of rows; larger requests are clamped.
pub const MAX_WEEKS: usize = 520;
/// Weeks between two month labels.
const LABEL_STRIDE: usize = 4;

pub type WeekRow = [usize; DAYS_PER_WEEK];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeatLevel {
    Empty,
    Active,
}

impl HeatLevel {
    pub fn for_count(count: usize) -> Self {
        if count == 0 {
            HeatLevel::Empty
        } else {
            HeatLevel::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    /// `None` when the cell falls before the earliest representable date.
    pub date: Option<NaiveDate>,
    pub count: usize,
    pub level: HeatLevel,
}

/// Days between `reference` and cell `[week][column]`.
pub fn days_back(week: usize, column: usize) -> u64 {
    (week * DAYS_PER_WEEK + (DAYS_PER_WEEK - 1 - column)) as u64
}

pub fn cell_date(reference: NaiveDate, week: usize, column: usize) -> Option<NaiveDate> {
    reference.checked_sub_days(Days::new(days_back(week, column)))
}

// Cell [w][d] is `6 - d` days before the row anchor `reference - 7w`.
pub fn build_grid(ledger: &CompletionLedger, weeks: usize, reference: NaiveDate) -> Vec<WeekRow> {
    (0..weeks.min(MAX_WEEKS))
        .map(|week| {
            std::array::from_fn(|column| {
                cell_date(reference, week, column)
                    .map(|day| ledger.count_on(day))
                    .unwrap_or(0)
            })
        })
        .collect()
}

pub fn heatmap_cells(
    ledger: &CompletionLedger,
    weeks: usize,
    reference: NaiveDate,
) -> Vec<[HeatmapCell; DAYS_PER_WEEK]> {
    (0..weeks.min(MAX_WEEKS))
        .map(|week| {
            std::array::from_fn(|column| {
                let date = cell_date(reference, week, column);
                let count = date.map(|day| ledger.count_on(day)).unwrap_or(0);
                HeatmapCell {
                    date,
                    count,
                    level: HeatLevel::for_count(count),
                }
            })
        })
        .collect()
}

/// Abbreviated month names of every fourth row's anchor day, first occurrence only.
pub fn month_labels(weeks: usize, reference: NaiveDate) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for week in (0..weeks.min(MAX_WEEKS)).step_by(LABEL_STRIDE) {
        let Some(anchor) = cell_date(reference, week, DAYS_PER_WEEK - 1) else {
            continue;
        };
        let label = anchor.format("%b").to_string();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

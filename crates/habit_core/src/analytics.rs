use serde::Serialize;

use crate::habit::{Category, Habit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub count: usize,
    /// Share of all habits, rounded to the nearest whole percent.
    pub percentage: u32,
}

/// Habits ordered by their streak counter, highest first. Ties keep registry order.
pub fn habits_by_streak(habits: &[Habit]) -> Vec<&Habit> {
    let mut sorted: Vec<&Habit> = habits.iter().collect();
    sorted.sort_by(|a, b| b.streak.cmp(&a.streak));
    sorted
}

/// One entry per category in use, in order of first appearance.
pub fn category_breakdown(habits: &[Habit]) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = Vec::new();
    for habit in habits {
        match shares.iter_mut().find(|share| share.category == habit.tag) {
            Some(share) => share.count += 1,
            None => shares.push(CategoryShare {
                category: habit.tag,
                count: 1,
                percentage: 0,
            }),
        }
    }
    let total = habits.len();
    for share in &mut shares {
        share.percentage = ((share.count as f64 / total as f64) * 100.0).round() as u32;
    }
    shares
}

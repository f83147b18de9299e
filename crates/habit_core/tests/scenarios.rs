use chrono::{Days, NaiveDate, Utc};
use habit_core::{HabitId, HabitTracker, NewHabit};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

fn tracker_with_habits(names: &[&str]) -> (HabitTracker, Vec<HabitId>) {
    let mut tracker = HabitTracker::new();
    let ids = names
        .iter()
        .map(|name| {
            tracker
                .create_habit(NewHabit::new(*name), Utc::now())
                .expect("create habit")
                .id
        })
        .collect();
    (tracker, ids)
}

#[test]
fn empty_ledger_with_three_habits() {
    let (tracker, _) = tracker_with_habits(&["Water", "Read", "Stretch"]);
    let stats = tracker.statistics(today());
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.longest_streak, 0);
    assert_eq!(stats.total_completed, 0);
    assert_eq!(stats.today.completed, 0);
    assert_eq!(stats.today.total, 3);
    assert_eq!(stats.today.percentage, 0.0);
}

#[test]
fn five_day_run_ending_today() {
    let (mut tracker, ids) = tracker_with_habits(&["Water"]);
    for n in 0..5 {
        tracker.toggle(&ids[0], days_ago(n), today()).unwrap();
    }
    // day 5 back is empty; one older completion must not extend the run
    tracker.toggle(&ids[0], days_ago(6), today()).unwrap();

    assert_eq!(tracker.current_streak(today()), 5);
    assert_eq!(tracker.longest_streak(), 5);
}

#[test]
fn empty_today_keeps_yesterdays_run() {
    let (mut tracker, ids) = tracker_with_habits(&["Water", "Read"]);
    tracker.toggle(&ids[0], days_ago(1), today()).unwrap();
    tracker.toggle(&ids[1], days_ago(2), today()).unwrap();

    assert_eq!(tracker.current_streak(today()), 2);
    assert_eq!(tracker.today_progress(today()).completed, 0);
}

#[test]
fn deleting_a_habit_prunes_all_its_days() {
    let (mut tracker, ids) = tracker_with_habits(&["Meditate", "Journal"]);
    for n in 0..10 {
        tracker.toggle(&ids[0], days_ago(n * 2), today()).unwrap();
    }
    for n in 0..4 {
        tracker.toggle(&ids[1], days_ago(n), today()).unwrap();
    }
    let before = tracker.total_completed();

    let removed = tracker.delete_habit(&ids[0]).unwrap();

    assert_eq!(removed.pruned_completions, 10);
    assert_eq!(tracker.total_completed(), before - 10);
    assert!(tracker
        .ledger()
        .days()
        .all(|(_, completed)| !completed.contains(&ids[0])));
    assert_eq!(tracker.habits().len(), 1);
}

#[test]
fn heatmap_tracks_toggles() {
    let (mut tracker, ids) = tracker_with_habits(&["Water", "Read"]);
    tracker.toggle(&ids[0], today(), today()).unwrap();
    tracker.toggle(&ids[1], today(), today()).unwrap();
    tracker.toggle(&ids[0], days_ago(8), today()).unwrap();

    let grid = tracker.heatmap(13, today());
    assert_eq!(grid.len(), 13);
    assert_eq!(grid[0][6], 2);
    // eight days back: row 1, column 6 - 1
    assert_eq!(grid[1][5], 1);
    let total: usize = grid.iter().flatten().sum();
    assert_eq!(total, 3);
}

#[test]
fn calendar_and_history_views_agree() {
    let (mut tracker, ids) = tracker_with_habits(&["Water", "Read"]);
    tracker.toggle(&ids[0], today(), today()).unwrap();
    tracker.toggle(&ids[0], days_ago(1), today()).unwrap();
    tracker.toggle(&ids[1], days_ago(1), today()).unwrap();

    let month = tracker.calendar_month(2025, 3, today()).unwrap();
    let cell = month.days.iter().find(|d| d.is_today).unwrap();
    assert_eq!(cell.completed, 1);

    let history = tracker.habit_history(&ids[0], 3, today()).unwrap();
    assert_eq!(history.graph, "_XX");
    assert_eq!(history.streak, 2);
}

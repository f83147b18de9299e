use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use habit_core::{
    calendar::{CalendarMonth, DayStatus},
    date_key,
    heatmap::{self, HeatmapCell, DAYS_PER_WEEK, MAX_WEEKS},
    notifications::{NotificationRequest, NotificationSink},
    streak::MAX_HISTORY_DAYS,
    Category, Habit, HabitId, HabitService, HabitUpdate, NewHabit,
};
use parking_lot::Mutex;
use tracing::info;

use crate::config::AppConfig;
use crate::store::JsonFileStore;

#[derive(Debug, Parser)]
#[command(name = "habit_tracker", about = "Track daily habits and streaks")]
pub struct Cli {
    /// Snapshot file; overrides HABIT_DATA_PATH.
    #[arg(long, global = true)]
    pub data: Option<std::path::PathBuf>,

    /// Reference date (YYYY-MM-DD); overrides HABIT_TODAY.
    #[arg(long, global = true, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new habit.
    Add(AddArgs),
    /// Change a habit's name, icon or category.
    Edit(EditArgs),
    /// Delete a habit and its completion history.
    Delete { id: String },
    /// Flip completion of a habit for a day (default: today).
    Toggle {
        id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List habits with their completion state for a day (default: today).
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Current streak, longest streak, totals and today's progress.
    Stats,
    /// Per-day completion counts for the last weeks.
    Heatmap {
        #[arg(long, value_parser = parse_weeks)]
        weeks: Option<usize>,
    },
    /// Month calendar with per-day status.
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Habit count per category.
    Categories,
    /// Habits ranked by streak.
    Top,
    /// Recent history of a single habit.
    History {
        id: String,
        #[arg(long, default_value_t = 14, value_parser = parse_days)]
        days: usize,
    },
    /// Show a reminder for every habit still open today.
    Remind,
    /// Complete a habit from its reminder (no-op when already done).
    Done { id: String },
    /// Clear every recorded completion and streak; habits are kept.
    Reset,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = habit_core::habit::DEFAULT_ICON)]
    pub icon: String,
    #[arg(long, default_value_t = Category::Health, value_parser = parse_category)]
    pub tag: Category,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long, value_parser = parse_category)]
    pub tag: Option<Category>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    date_key::parse_key(raw).map_err(|err| err.to_string())
}

fn parse_weeks(raw: &str) -> Result<usize, String> {
    parse_bounded(raw, MAX_WEEKS)
}

fn parse_days(raw: &str) -> Result<usize, String> {
    parse_bounded(raw, MAX_HISTORY_DAYS)
}

fn parse_bounded(raw: &str, max: usize) -> Result<usize, String> {
    let value: usize = raw.parse().map_err(|err: std::num::ParseIntError| err.to_string())?;
    if value > max {
        return Err(format!("at most {max} allowed"));
    }
    Ok(value)
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse::<Category>().map_err(|err| err.to_string())
}

/// Collects reminders so they can be printed once dispatch finishes.
#[derive(Default, Clone)]
struct Outbox {
    pending: Arc<Mutex<Vec<NotificationRequest>>>,
}

impl NotificationSink for Outbox {
    fn schedule(&self, notification: NotificationRequest) {
        self.pending.lock().push(notification);
    }

    fn clear_for_habit(&self, habit: &Habit) {
        self.pending.lock().retain(|pending| pending.habit_id != habit.id);
    }
}

impl Cli {
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(path) = &self.data {
            config.data_path = path.clone();
        }
        if let Some(day) = self.today {
            config.today = Some(day);
        }
    }
}

pub fn run(command: Command, config: &AppConfig, out: &mut impl Write) -> Result<()> {
    let outbox = Outbox::default();
    let service = HabitService::builder()
        .with_store(Box::new(JsonFileStore::new(&config.data_path)))
        .with_notification_sink(Box::new(outbox.clone()))
        .build()
        .context("failed to open habit data")?;
    let today = config.today();
    service.refresh_completed_flags(today);
    info!(?command, %today, "running command");

    match command {
        Command::Add(args) => {
            let habit = service.create_habit(
                NewHabit::new(args.name).with_icon(args.icon).with_tag(args.tag),
                Utc::now(),
            )?;
            service.save()?;
            writeln!(out, "added {} {} ({})", habit.icon, habit.name, habit.id)?;
        }
        Command::Edit(args) => {
            let update = HabitUpdate {
                name: args.name,
                icon: args.icon,
                tag: args.tag,
            };
            if update == HabitUpdate::default() {
                bail!("nothing to change; pass --name, --icon or --tag");
            }
            let habit = service.update_habit(&HabitId::new(args.id), update)?;
            service.save()?;
            writeln!(out, "updated {} {} [{}]", habit.icon, habit.name, habit.tag)?;
        }
        Command::Delete { id } => {
            let removed = service.delete_habit(&HabitId::new(id))?;
            service.save()?;
            writeln!(
                out,
                "deleted {} and {} completion(s)",
                removed.habit.name, removed.pruned_completions
            )?;
        }
        Command::Toggle { id, date } => {
            let id = HabitId::new(id);
            let day = date.unwrap_or(today);
            let completed = service.toggle(&id, day, today)?;
            service.save()?;
            let habit = service.habit(&id)?;
            let state = if completed { "done" } else { "not done" };
            writeln!(
                out,
                "{} {}: {} on {} (streak {})",
                habit.icon,
                habit.name,
                state,
                date_key::to_key(day),
                habit.streak
            )?;
        }
        Command::List { date } => {
            let day = date.unwrap_or(today);
            let habits = service.habits_on(day);
            if habits.is_empty() {
                writeln!(out, "no habits yet")?;
            }
            for habit in habits {
                let mark = if habit.completed { 'x' } else { ' ' };
                writeln!(
                    out,
                    "[{}] {} {} ({}) streak {}  {}",
                    mark, habit.icon, habit.name, habit.tag, habit.streak, habit.id
                )?;
            }
        }
        Command::Stats => {
            let stats = service.statistics(today);
            writeln!(out, "current streak: {} day(s)", stats.current_streak)?;
            writeln!(out, "longest streak: {} day(s)", stats.longest_streak)?;
            writeln!(out, "total completed: {}", stats.total_completed)?;
            writeln!(
                out,
                "today: {}/{} ({:.0}%)",
                stats.today.completed, stats.today.total, stats.today.percentage
            )?;
        }
        Command::Heatmap { weeks } => {
            let weeks = weeks.unwrap_or(config.heatmap_weeks);
            let cells = service.heatmap_cells(weeks, today);
            write_heatmap(out, &cells)?;
            let labels = heatmap::month_labels(weeks, today);
            if !labels.is_empty() {
                writeln!(out, "months: {}", labels.join(" "))?;
            }
        }
        Command::Calendar { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let Some(view) = service.calendar_month(year, month, today) else {
                bail!("no such month: {year}-{month:02}");
            };
            write_calendar(out, &view)?;
        }
        Command::Categories => {
            let shares = service.category_breakdown();
            if shares.is_empty() {
                writeln!(out, "no habits yet")?;
            }
            for share in shares {
                writeln!(
                    out,
                    "{:<13} {:>3} {:>3}%",
                    share.category, share.count, share.percentage
                )?;
            }
        }
        Command::Top => {
            for habit in service.habits_by_streak() {
                writeln!(out, "{:>4}  {} {}", habit.streak, habit.icon, habit.name)?;
            }
        }
        Command::History { id, days } => {
            let history = service.habit_history(&HabitId::new(id), days, today)?;
            writeln!(out, "{}", history.graph)?;
            writeln!(out, "streak: {} day(s)", history.streak)?;
        }
        Command::Remind => {
            let sent = service.dispatch_reminders(today, Utc::now());
            if sent == 0 {
                writeln!(out, "all habits done for today")?;
            }
            for reminder in outbox.pending.lock().drain(..) {
                writeln!(out, "{}: {} ({})", reminder.title, reminder.body, reminder.habit_id)?;
            }
        }
        Command::Done { id } => {
            let id = HabitId::new(id);
            let changed = service.complete_from_reminder(&id, today)?;
            service.save()?;
            let habit = service.habit(&id)?;
            if changed {
                writeln!(out, "{} {} done for today", habit.icon, habit.name)?;
            } else {
                writeln!(out, "{} {} was already done", habit.icon, habit.name)?;
            }
        }
        Command::Reset => {
            let cleared = service.statistics(today).total_completed;
            service.reset_ledger();
            service.save()?;
            writeln!(out, "cleared {cleared} completion(s)")?;
        }
    }
    Ok(())
}

/// One line per column, oldest week on the left.
fn write_heatmap(out: &mut impl Write, cells: &[[HeatmapCell; DAYS_PER_WEEK]]) -> Result<()> {
    for column in 0..DAYS_PER_WEEK {
        let label = cells
            .first()
            .and_then(|row| row[column].date)
            .map(|day| day.format("%a").to_string())
            .unwrap_or_else(|| "   ".to_string());
        let line: String = cells
            .iter()
            .rev()
            .map(|row| match row[column].count {
                0 => '.',
                n @ 1..=9 => char::from_digit(n as u32, 10).unwrap_or('+'),
                _ => '+',
            })
            .collect();
        writeln!(out, "{label} {line}")?;
    }
    Ok(())
}

fn write_calendar(out: &mut impl Write, view: &CalendarMonth) -> Result<()> {
    let title = NaiveDate::from_ymd_opt(view.year, view.month, 1)
        .map(|first| first.format("%B %Y").to_string())
        .unwrap_or_default();
    writeln!(out, "{title}")?;
    writeln!(out, " Su   Mo   Tu   We   Th   Fr   Sa")?;
    for week in view.weeks() {
        let line: Vec<String> = week
            .iter()
            .map(|day| {
                if !day.in_month {
                    return "    ".to_string();
                }
                let marker = match day.status {
                    DayStatus::None => ' ',
                    DayStatus::Partial => '~',
                    DayStatus::Good => '+',
                    DayStatus::Perfect => '*',
                };
                let (open, close) = if day.is_today { ('[', ']') } else { (' ', marker) };
                format!("{open}{:>2}{close}", day.date.day())
            })
            .collect();
        writeln!(out, "{}", line.join(" ").trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn config_in(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            data_path: dir.join("habits.json"),
            heatmap_weeks: 2,
            today: NaiveDate::from_ymd_opt(2025, 3, 12),
        }
    }

    fn run_to_string(command: Command, config: &AppConfig) -> String {
        let mut out = Vec::new();
        run(command, config, &mut out).expect("command succeeds");
        String::from_utf8(out).expect("utf8")
    }

    fn first_id(config: &AppConfig) -> String {
        let listing = run_to_string(Command::List { date: None }, config);
        listing
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().last())
            .expect("habit id")
            .to_string()
    }

    #[test]
    fn add_toggle_and_report() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());

        let added = run_to_string(
            Command::Add(AddArgs {
                name: "Drink water".into(),
                icon: "💧".into(),
                tag: Category::Health,
            }),
            &config,
        );
        assert!(added.starts_with("added 💧 Drink water"));
        let id = first_id(&config);

        let toggled = run_to_string(Command::Toggle { id: id.clone(), date: None }, &config);
        assert!(toggled.contains("done on 2025-03-12 (streak 1)"));
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 11);
        run_to_string(Command::Toggle { id: id.clone(), date: yesterday }, &config);

        let stats = run_to_string(Command::Stats, &config);
        assert!(stats.contains("current streak: 2 day(s)"));
        assert!(stats.contains("today: 1/1 (100%)"));

        let listing = run_to_string(Command::List { date: None }, &config);
        assert!(listing.starts_with("[x] 💧 Drink water (Health) streak 2"));

        let history = run_to_string(Command::History { id: id.clone(), days: 4 }, &config);
        assert!(history.starts_with("__XX\n"));

        let heatmap = run_to_string(Command::Heatmap { weeks: None }, &config);
        let rows: Vec<&str> = heatmap.lines().collect();
        assert_eq!(rows.len(), 8);
        assert!(rows[7].starts_with("months: "));
        assert!(rows[6].ends_with(".1"));
        assert!(rows[5].ends_with(".1"));

        let deleted = run_to_string(Command::Delete { id }, &config);
        assert!(deleted.contains("and 2 completion(s)"));
        let stats = run_to_string(Command::Stats, &config);
        assert!(stats.contains("total completed: 0"));
    }

    #[test]
    fn reminders_and_done() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        run_to_string(
            Command::Add(AddArgs {
                name: "Stretch".into(),
                icon: "🤸".into(),
                tag: Category::Fitness,
            }),
            &config,
        );
        let id = first_id(&config);

        let reminders = run_to_string(Command::Remind, &config);
        assert!(reminders.contains("Stretch is still open for today"));

        let done = run_to_string(Command::Done { id: id.clone() }, &config);
        assert!(done.contains("done for today"));
        let again = run_to_string(Command::Done { id }, &config);
        assert!(again.contains("already done"));

        let reminders = run_to_string(Command::Remind, &config);
        assert_eq!(reminders.trim(), "all habits done for today");
    }

    #[test]
    fn calendar_marks_today() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        let calendar = run_to_string(Command::Calendar { year: None, month: None }, &config);
        assert!(calendar.starts_with("March 2025\n"));
        assert!(calendar.contains("[12]"));
    }

    #[test]
    fn unknown_habit_is_an_error() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        let mut out = Vec::new();
        let err = run(
            Command::Toggle { id: "missing".into(), date: None },
            &config,
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn cli_parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "habit_tracker",
            "--today",
            "2025-01-02",
            "add",
            "--name",
            "Read",
            "--tag",
            "learning",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2025, 1, 2));
        match cli.command {
            Command::Add(args) => assert_eq!(args.tag, Category::Learning),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["habit_tracker", "--today", "2025-2-1", "stats"]).is_err());
    }

    #[test]
    fn oversized_sizes_are_rejected() {
        let huge = usize::MAX.to_string();
        for args in [
            vec!["habit_tracker", "history", "abc", "--days", huge.as_str()],
            vec!["habit_tracker", "history", "abc", "--days", "367"],
            vec!["habit_tracker", "heatmap", "--weeks", huge.as_str()],
            vec!["habit_tracker", "heatmap", "--weeks", "521"],
        ] {
            assert!(
                Cli::try_parse_from(args.iter().copied()).is_err(),
                "{args:?} should be rejected"
            );
        }
        let cli = Cli::try_parse_from(["habit_tracker", "heatmap", "--weeks", "520"]).unwrap();
        assert!(matches!(cli.command, Command::Heatmap { weeks: Some(520) }));
    }

    #[test]
    fn oversized_sizes_are_clamped_when_run_directly() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        run_to_string(
            Command::Add(AddArgs {
                name: "Walk".into(),
                icon: "🚶".into(),
                tag: Category::Health,
            }),
            &config,
        );
        let id = first_id(&config);

        let history = run_to_string(Command::History { id, days: usize::MAX }, &config);
        assert_eq!(history.lines().next().map(str::len), Some(MAX_HISTORY_DAYS));

        let heatmap = run_to_string(Command::Heatmap { weeks: Some(usize::MAX) }, &config);
        let first_row = heatmap.lines().next().unwrap();
        assert_eq!(first_row.chars().count(), 4 + MAX_WEEKS);
    }

    #[test]
    fn reset_clears_completions_but_keeps_habits() {
        let temp = tempdir().unwrap();
        let config = config_in(temp.path());
        run_to_string(
            Command::Add(AddArgs {
                name: "Journal".into(),
                icon: "📓".into(),
                tag: Category::Mindfulness,
            }),
            &config,
        );
        let id = first_id(&config);
        run_to_string(Command::Toggle { id: id.clone(), date: None }, &config);
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 11);
        run_to_string(Command::Toggle { id, date: yesterday }, &config);
        assert!(run_to_string(Command::Stats, &config).contains("total completed: 2"));

        let reset = run_to_string(Command::Reset, &config);
        assert_eq!(reset.trim(), "cleared 2 completion(s)");

        let stats = run_to_string(Command::Stats, &config);
        assert!(stats.contains("current streak: 0 day(s)"));
        assert!(stats.contains("total completed: 0"));
        assert!(stats.contains("today: 0/1 (0%)"));
        let listing = run_to_string(Command::List { date: None }, &config);
        assert!(listing.starts_with("[ ] 📓 Journal (Mindfulness) streak 0"));
    }
}

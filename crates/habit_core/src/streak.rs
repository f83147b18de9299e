use chrono::NaiveDate;

use crate::habit::HabitId;
use crate::ledger::CompletionLedger;

/// How far back the current-streak walk looks before giving up.
pub const MAX_LOOKBACK_DAYS: u64 = 366;
/// Longest sparkline [`habit_history_graph`] will draw.
pub const MAX_HISTORY_DAYS: usize = MAX_LOOKBACK_DAYS as usize;

/// Consecutive days with at least one completion. An empty `today` neither
/// breaks the run nor counts towards it.
pub fn current_streak(ledger: &CompletionLedger, today: NaiveDate) -> u32 {
    walk_back(today, |day| ledger.count_on(day) > 0)
}

pub fn longest_streak(ledger: &CompletionLedger) -> u32 {
    let mut longest = 0u32;
    let mut running = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for (day, _) in ledger.days() {
        let continues = previous.and_then(|prev| prev.succ_opt()) == Some(day);
        running = if continues { running.saturating_add(1) } else { 1 };
        longest = longest.max(running);
        previous = Some(day);
    }

    longest
}

pub fn total_completed(ledger: &CompletionLedger) -> usize {
    ledger.total_completed()
}

pub fn habit_current_streak(
    ledger: &CompletionLedger,
    habit_id: &HabitId,
    today: NaiveDate,
) -> u32 {
    walk_back(today, |day| ledger.contains(day, habit_id))
}

/// Sparkline of the last `days` days for one habit, oldest first:
/// `X` completed, `_` not. `days` is clamped to [`MAX_HISTORY_DAYS`].
pub fn habit_history_graph(
    ledger: &CompletionLedger,
    habit_id: &HabitId,
    days: usize,
    today: NaiveDate,
) -> String {
    let days = days.min(MAX_HISTORY_DAYS);
    let mut graph = String::with_capacity(days);
    for offset in (0..days as u64).rev() {
        let done = today
            .checked_sub_days(chrono::Days::new(offset))
            .is_some_and(|day| ledger.contains(day, habit_id));
        graph.push(if done { 'X' } else { '_' });
    }
    graph
}

fn walk_back(today: NaiveDate, mut active: impl FnMut(NaiveDate) -> bool) -> u32 {
    let mut streak = 0u32;
    let mut day = today;
    for offset in 0..MAX_LOOKBACK_DAYS {
        if active(day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_key;
use crate::error::{HabitError, HabitResult};
use crate::habit::HabitId;

static NO_COMPLETIONS: BTreeSet<HabitId> = BTreeSet::new();

/// Wire shape of the ledger: date key to habit ids.
pub type LedgerSnapshot = BTreeMap<String, Vec<HabitId>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LedgerSnapshot", into = "LedgerSnapshot")]
pub struct CompletionLedger {
    // Empty days are never stored; absent and empty read the same.
    days: BTreeMap<NaiveDate, BTreeSet<HabitId>>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `habit_id` on `day` and returns the new state
    /// (`true` when the habit is now completed).
    pub fn toggle(&mut self, day: NaiveDate, habit_id: &HabitId) -> bool {
        if self.remove(day, habit_id) {
            false
        } else {
            self.insert(day, habit_id.clone());
            true
        }
    }

    /// Returns `true` when the habit was not yet recorded for `day`.
    pub fn insert(&mut self, day: NaiveDate, habit_id: HabitId) -> bool {
        self.days.entry(day).or_default().insert(habit_id)
    }

    /// Returns `true` when the habit was recorded for `day`.
    pub fn remove(&mut self, day: NaiveDate, habit_id: &HabitId) -> bool {
        let Some(set) = self.days.get_mut(&day) else {
            return false;
        };
        let removed = set.remove(habit_id);
        if set.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    /// Drops `habit_id` from every day and returns how many completions were removed.
    pub fn remove_habit_everywhere(&mut self, habit_id: &HabitId) -> usize {
        self.retain_habits(|candidate| candidate != habit_id)
    }

    /// Keeps only completions whose habit satisfies `keep`; returns the number dropped.
    pub fn retain_habits(&mut self, mut keep: impl FnMut(&HabitId) -> bool) -> usize {
        let mut dropped = 0;
        self.days.retain(|_, set| {
            let before = set.len();
            set.retain(|id| keep(id));
            dropped += before - set.len();
            !set.is_empty()
        });
        if dropped > 0 {
            debug!(dropped, remaining_days = self.days.len(), "pruned ledger completions");
        }
        dropped
    }

    pub fn get_by_date(&self, day: NaiveDate) -> &BTreeSet<HabitId> {
        self.days.get(&day).unwrap_or(&NO_COMPLETIONS)
    }

    pub fn get_by_key(&self, key: &str) -> HabitResult<&BTreeSet<HabitId>> {
        Ok(self.get_by_date(date_key::parse_key(key)?))
    }

    pub fn count_on(&self, day: NaiveDate) -> usize {
        self.get_by_date(day).len()
    }

    pub fn contains(&self, day: NaiveDate, habit_id: &HabitId) -> bool {
        self.get_by_date(day).contains(habit_id)
    }

    /// Recorded days in chronological order. Every yielded set is non-empty.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &BTreeSet<HabitId>)> + '_ {
        self.days.iter().map(|(day, set)| (*day, set))
    }

    pub fn total_completed(&self) -> usize {
        self.days.values().map(BTreeSet::len).sum()
    }

    /// Number of days with at least one completion.
    pub fn active_days(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

impl TryFrom<LedgerSnapshot> for CompletionLedger {
    type Error = HabitError;

    fn try_from(snapshot: LedgerSnapshot) -> Result<Self, Self::Error> {
        let mut ledger = CompletionLedger::new();
        for (key, ids) in snapshot {
            let day = date_key::parse_key(&key)?;
            for id in ids {
                ledger.insert(day, id);
            }
        }
        Ok(ledger)
    }
}

impl From<CompletionLedger> for LedgerSnapshot {
    fn from(ledger: CompletionLedger) -> Self {
        ledger
            .days
            .into_iter()
            .map(|(day, set)| (date_key::to_key(day), set.into_iter().collect()))
            .collect()
    }
}

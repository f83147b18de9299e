use thiserror::Error;

use crate::habit::HabitId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    #[error("invalid date key `{key}`: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("habit `{0}` not found")]
    HabitNotFound(HabitId),

    #[error("habit `{0}` already exists")]
    DuplicateHabit(HabitId),

    #[error("habit name must not be blank")]
    EmptyName,

    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

pub type HabitResult<T> = Result<T, HabitError>;

//! Ratings users give to courses and instructors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_TEACHER_NAME_LEN: usize = 255;

/// How many catalog courses are offered for rating
pub const RATEABLE_COURSES_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("score must be between 1 and 5, got {0}")]
    ScoreOutOfRange(u8),
    #[error("unknown rating kind: {0}")]
    UnknownKind(String),
    #[error("teacher name is empty")]
    EmptyName,
    #[error("teacher name is longer than {MAX_TEACHER_NAME_LEN} bytes")]
    NameTooLong,
}

/// What is being rated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingKind {
    Course,
    Teacher,
}

impl RatingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingKind::Course => "course",
            RatingKind::Teacher => "teacher",
        }
    }
}

impl FromStr for RatingKind {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "course" => Ok(RatingKind::Course),
            "teacher" => Ok(RatingKind::Teacher),
            other => Err(RatingError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for RatingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A star score from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score(u8);

impl Score {
    pub const ALL: [Score; 5] = [Score(1), Score(2), Score(3), Score(4), Score(5)];

    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (1..=5).contains(&value) {
            Ok(Score(value))
        } else {
            Err(RatingError::ScoreOutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// The course or teacher picked before a score is given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingTarget {
    pub kind: RatingKind,
    pub target: String,
}

/// Validates an instructor's full name typed by the user
pub fn validate_teacher_name(name: &str) -> Result<String, RatingError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(RatingError::EmptyName);
    }

    if trimmed.len() > MAX_TEACHER_NAME_LEN {
        return Err(RatingError::NameTooLong);
    }

    Ok(trimmed.to_string())
}

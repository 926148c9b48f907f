//! Course recommendations built from completed survey answers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{cycle, Course, Step};
use crate::survey::SurveyAnswers;

/// Narrow `candidates` (courses for the chosen role) down to the survey answers.
///
/// Unanswered questions do not filter. Courses without a duration never match a
/// time frame. Duplicate titles are dropped, keeping the first occurrence.
pub fn recommend(candidates: Vec<Course>, answers: &SurveyAnswers) -> Vec<Course> {
    let mut seen = HashSet::new();

    candidates
        .into_iter()
        .filter(|c| answers.role.is_none_or(|role| c.role() == Some(role)))
        .filter(|c| answers.direction.is_none_or(|direction| c.direction() == Some(direction)))
        .filter(|c| answers.budget.is_none_or(|budget| budget.matches(c.price)))
        .filter(|c| match (answers.time, c.duration_weeks) {
            (None, _) => true,
            (Some(time), Some(weeks)) => time.matches(weeks),
            (Some(_), None) => false,
        })
        .filter(|c| seen.insert(c.title.clone()))
        .collect()
}

/// Recommendation results and the user's place in them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub courses: Vec<Course>,
    pub position: usize,
    /// Answers the list was built from, restored by "back to survey"
    pub answers: SurveyAnswers,
    pub message_id: Option<i32>,
}

impl Recommendations {
    pub fn new(courses: Vec<Course>, answers: SurveyAnswers) -> Self {
        Self {
            courses,
            position: 0,
            answers,
            message_id: None,
        }
    }

    pub fn current(&self) -> Option<&Course> {
        self.courses.get(self.position)
    }

    pub fn step(&mut self, step: Step) -> Option<&Course> {
        self.position = cycle(self.position, step, self.courses.len());
        self.current()
    }
}

//! # Course Survey Module
//!
//! The four-question survey used to pick courses for a user. Progress is a
//! plain value stored in the user's session; the bot layer only renders it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Direction, Role};

/// Expected length of the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrame {
    /// 1-4 weeks
    Short,
    /// 5-8 weeks
    Medium,
    /// More than 8 weeks
    Long,
}

impl TimeFrame {
    pub fn matches(&self, weeks: i32) -> bool {
        match self {
            TimeFrame::Short => weeks <= 4,
            TimeFrame::Medium => (5..=8).contains(&weeks),
            TimeFrame::Long => weeks > 8,
        }
    }
}

/// Price bracket in roubles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    UpTo10k,
    From10To20k,
    Over20k,
}

impl Budget {
    pub fn matches(&self, price: i32) -> bool {
        match self {
            Budget::UpTo10k => price <= 10_000,
            Budget::From10To20k => price > 10_000 && price <= 20_000,
            Budget::Over20k => price > 20_000,
        }
    }
}

/// Answers collected so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAnswers {
    pub role: Option<Role>,
    pub direction: Option<Direction>,
    pub time: Option<TimeFrame>,
    pub budget: Option<Budget>,
}

/// One survey question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyStep {
    Role,
    Direction,
    Time,
    Budget,
}

/// Survey questions in the order they are asked
pub const SURVEY_STEPS: [SurveyStep; 4] = [
    SurveyStep::Role,
    SurveyStep::Direction,
    SurveyStep::Time,
    SurveyStep::Budget,
];

const ROLE_OPTIONS: [Role; 4] = [Role::Students, Role::Aup, Role::Guide, Role::Pps];
const DIRECTION_OPTIONS: [Direction; 3] = [Direction::Finance, Direction::Management, Direction::Pedagogy];
const TIME_OPTIONS: [TimeFrame; 3] = [TimeFrame::Short, TimeFrame::Medium, TimeFrame::Long];
const BUDGET_OPTIONS: [Budget; 3] = [Budget::UpTo10k, Budget::From10To20k, Budget::Over20k];

impl SurveyStep {
    pub fn from_index(index: usize) -> Option<Self> {
        SURVEY_STEPS.get(index).copied()
    }

    pub fn prompt_key(&self) -> &'static str {
        match self {
            SurveyStep::Role => "survey-role-question",
            SurveyStep::Direction => "survey-direction-question",
            SurveyStep::Time => "survey-time-question",
            SurveyStep::Budget => "survey-budget-question",
        }
    }

    /// Localization keys of the answer buttons, in button order
    pub fn option_keys(&self) -> &'static [&'static str] {
        match self {
            SurveyStep::Role => &["survey-role-student", "survey-role-aup", "survey-role-guide", "survey-role-pps"],
            SurveyStep::Direction => &["direction-finance", "direction-management", "direction-pedagogy"],
            SurveyStep::Time => &["survey-time-short", "survey-time-medium", "survey-time-long"],
            SurveyStep::Budget => &["survey-budget-low", "survey-budget-mid", "survey-budget-high"],
        }
    }

    fn record(&self, answers: &mut SurveyAnswers, option: usize) -> Option<()> {
        match self {
            SurveyStep::Role => answers.role = Some(*ROLE_OPTIONS.get(option)?),
            SurveyStep::Direction => answers.direction = Some(*DIRECTION_OPTIONS.get(option)?),
            SurveyStep::Time => answers.time = Some(*TIME_OPTIONS.get(option)?),
            SurveyStep::Budget => answers.budget = Some(*BUDGET_OPTIONS.get(option)?),
        }
        Some(())
    }

    fn forget(&self, answers: &mut SurveyAnswers) {
        match self {
            SurveyStep::Role => answers.role = None,
            SurveyStep::Direction => answers.direction = None,
            SurveyStep::Time => answers.time = None,
            SurveyStep::Budget => answers.budget = None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurveyError {
    #[error("answer for question {got} while question {expected} is active")]
    StaleQuestion { expected: usize, got: usize },
    #[error("question {question} has no option {option}")]
    UnknownOption { question: usize, option: usize },
    #[error("survey is already complete")]
    Finished,
}

/// Result of recording an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyOutcome {
    Next,
    Completed(SurveyAnswers),
}

/// A user's position in the survey
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyProgress {
    pub step: usize,
    pub answers: SurveyAnswers,
    /// Message the survey is rendered into
    pub message_id: Option<i32>,
}

impl SurveyProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress positioned on the last question with earlier answers kept
    pub fn resume(answers: SurveyAnswers, message_id: Option<i32>) -> Self {
        Self {
            step: SURVEY_STEPS.len() - 1,
            answers,
            message_id,
        }
    }

    pub fn current(&self) -> Option<SurveyStep> {
        SurveyStep::from_index(self.step)
    }

    pub fn can_go_back(&self) -> bool {
        self.step > 0
    }

    pub fn answer(&mut self, question: usize, option: usize) -> Result<SurveyOutcome, SurveyError> {
        let step = self.current().ok_or(SurveyError::Finished)?;
        if question != self.step {
            return Err(SurveyError::StaleQuestion {
                expected: self.step,
                got: question,
            });
        }
        step.record(&mut self.answers, option)
            .ok_or(SurveyError::UnknownOption { question, option })?;

        self.step += 1;
        if self.step < SURVEY_STEPS.len() {
            Ok(SurveyOutcome::Next)
        } else {
            Ok(SurveyOutcome::Completed(self.answers))
        }
    }

    /// Step back one question, forgetting its answer. Returns false on the first question.
    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.step -= 1;
        if let Some(step) = self.current() {
            step.forget(&mut self.answers);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_frame_boundaries() {
        assert!(TimeFrame::Short.matches(4));
        assert!(!TimeFrame::Short.matches(5));
        assert!(TimeFrame::Medium.matches(5));
        assert!(TimeFrame::Medium.matches(8));
        assert!(!TimeFrame::Medium.matches(9));
        assert!(TimeFrame::Long.matches(9));
    }

    #[test]
    fn test_budget_boundaries() {
        assert!(Budget::UpTo10k.matches(10_000));
        assert!(!Budget::From10To20k.matches(10_000));
        assert!(Budget::From10To20k.matches(20_000));
        assert!(!Budget::Over20k.matches(20_000));
        assert!(Budget::Over20k.matches(20_001));
    }

    #[test]
    fn test_option_counts_match_values() {
        assert_eq!(SurveyStep::Role.option_keys().len(), ROLE_OPTIONS.len());
        assert_eq!(SurveyStep::Direction.option_keys().len(), DIRECTION_OPTIONS.len());
        assert_eq!(SurveyStep::Time.option_keys().len(), TIME_OPTIONS.len());
        assert_eq!(SurveyStep::Budget.option_keys().len(), BUDGET_OPTIONS.len());
    }

    #[test]
    fn test_full_survey() {
        let mut progress = SurveyProgress::new();
        assert_eq!(progress.answer(0, 1), Ok(SurveyOutcome::Next));
        assert_eq!(progress.answer(1, 0), Ok(SurveyOutcome::Next));
        assert_eq!(progress.answer(2, 2), Ok(SurveyOutcome::Next));
        let outcome = progress.answer(3, 1).unwrap();

        let expected = SurveyAnswers {
            role: Some(Role::Aup),
            direction: Some(Direction::Finance),
            time: Some(TimeFrame::Long),
            budget: Some(Budget::From10To20k),
        };
        assert_eq!(outcome, SurveyOutcome::Completed(expected));
        assert_eq!(progress.answer(3, 0), Err(SurveyError::Finished));
    }

    #[test]
    fn test_stale_and_unknown_answers_leave_progress_untouched() {
        let mut progress = SurveyProgress::new();
        progress.answer(0, 0).unwrap();

        assert_eq!(
            progress.answer(0, 2),
            Err(SurveyError::StaleQuestion { expected: 1, got: 0 })
        );
        assert_eq!(
            progress.answer(1, 7),
            Err(SurveyError::UnknownOption { question: 1, option: 7 })
        );
        assert_eq!(progress.step, 1);
        assert_eq!(progress.answers.role, Some(Role::Students));
        assert_eq!(progress.answers.direction, None);
    }

    #[test]
    fn test_back_forgets_previous_answer() {
        let mut progress = SurveyProgress::new();
        assert!(!progress.back());

        progress.answer(0, 3).unwrap();
        progress.answer(1, 2).unwrap();
        assert!(progress.back());
        assert_eq!(progress.step, 1);
        assert_eq!(progress.answers.direction, None);
        assert_eq!(progress.answers.role, Some(Role::Pps));
    }

    #[test]
    fn test_resume_lands_on_last_question() {
        let answers = SurveyAnswers {
            role: Some(Role::Guide),
            direction: Some(Direction::Pedagogy),
            time: Some(TimeFrame::Short),
            budget: Some(Budget::Over20k),
        };
        let mut progress = SurveyProgress::resume(answers, Some(42));
        assert_eq!(progress.current(), Some(SurveyStep::Budget));
        assert_eq!(progress.message_id, Some(42));

        let outcome = progress.answer(3, 0).unwrap();
        match outcome {
            SurveyOutcome::Completed(a) => {
                assert_eq!(a.role, Some(Role::Guide));
                assert_eq!(a.budget, Some(Budget::UpTo10k));
            }
            SurveyOutcome::Next => panic!("Survey should be complete"),
        }
    }
}

//! Per-user conversation state kept by the dispatcher between updates.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::catalog::{cycle, CatalogCursor, CourseFilter, Step};
use crate::rating::{validate_teacher_name, RatingError, RatingKind, RatingTarget};
use crate::recommendation::Recommendations;
use crate::survey::SurveyProgress;

/// What a free-text message from the user means right now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputState {
    #[default]
    Idle,
    AwaitingQuestion,
    AwaitingTeacherName,
}

/// Everything the bot remembers about one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub input: InputState,
    pub survey: Option<SurveyProgress>,
    pub catalog: Option<CatalogCursor>,
    pub recommended: Option<Recommendations>,
    pub rating: Option<RatingTarget>,
    /// Last menu message shown to the user
    pub menu_message_id: Option<i32>,
}

impl UserSession {
    /// State left behind when the user returns to the main menu
    pub fn reset_to_menu(&mut self) {
        self.input = InputState::Idle;
        self.survey = None;
        self.recommended = None;
    }

    /// Start a fresh survey, dropping any previous one and its results
    pub fn start_survey(&mut self) -> &mut SurveyProgress {
        self.recommended = None;
        self.survey.insert(SurveyProgress::new())
    }

    /// Filter of the open catalog listing, if any
    pub fn catalog_filter(&self) -> Option<CourseFilter> {
        self.catalog.map(|cursor| cursor.filter)
    }

    /// Move the catalog cursor over a listing of `len` courses.
    /// Returns the new position, or `None` when no listing is open.
    pub fn step_catalog(&mut self, step: Step, len: usize) -> Option<usize> {
        let cursor = self.catalog.as_mut()?;
        cursor.position = cycle(cursor.position, step, len);
        Some(cursor.position)
    }

    /// Current selection, if it is of `kind`
    pub fn selected_rating(&self, kind: RatingKind) -> Option<&RatingTarget> {
        self.rating.as_ref().filter(|target| target.kind == kind)
    }

    /// Accept a typed instructor name as the rating target.
    /// An invalid name leaves the chat waiting for another one.
    pub fn select_teacher(&mut self, text: &str) -> Result<&RatingTarget, RatingError> {
        let name = validate_teacher_name(text)?;
        self.input = InputState::Idle;
        Ok(self.rating.insert(RatingTarget {
            kind: RatingKind::Teacher,
            target: name,
        }))
    }
}

/// Type alias for the per-chat dialogue
pub type SessionDialogue = Dialogue<UserSession, InMemStorage<UserSession>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Direction;
    use crate::survey::SurveyAnswers;

    #[test]
    fn test_default_session_is_idle() {
        let session = UserSession::default();
        assert_eq!(session.input, InputState::Idle);
        assert!(session.survey.is_none());
        assert!(session.recommended.is_none());
    }

    #[test]
    fn test_reset_to_menu_keeps_catalog_and_rating() {
        let mut session = UserSession {
            input: InputState::AwaitingQuestion,
            survey: Some(SurveyProgress::new()),
            catalog: Some(CatalogCursor {
                filter: CourseFilter::Direction(Direction::Finance),
                position: 2,
            }),
            recommended: Some(Recommendations::new(Vec::new(), SurveyAnswers::default())),
            rating: Some(RatingTarget {
                kind: RatingKind::Course,
                target: "Finance 101".to_string(),
            }),
            menu_message_id: Some(7),
        };

        session.reset_to_menu();

        assert_eq!(session.input, InputState::Idle);
        assert!(session.survey.is_none());
        assert!(session.recommended.is_none());
        assert_eq!(session.catalog.map(|c| c.position), Some(2));
        assert!(session.rating.is_some());
    }

    #[test]
    fn test_start_survey_drops_old_results() {
        let mut session = UserSession {
            recommended: Some(Recommendations::default()),
            ..UserSession::default()
        };
        session.start_survey().message_id = Some(3);
        assert!(session.recommended.is_none());
        assert_eq!(session.survey.as_ref().map(|s| (s.step, s.message_id)), Some((0, Some(3))));
    }

    #[test]
    fn test_step_catalog_without_listing() {
        let mut session = UserSession::default();
        assert_eq!(session.catalog_filter(), None);
        assert_eq!(session.step_catalog(Step::Next, 5), None);
        assert!(session.catalog.is_none());
    }

    #[test]
    fn test_step_catalog_wraps() {
        let filter = CourseFilter::Direction(Direction::Finance);
        let mut session = UserSession {
            catalog: Some(CatalogCursor { filter, position: 2 }),
            ..UserSession::default()
        };

        assert_eq!(session.catalog_filter(), Some(filter));
        assert_eq!(session.step_catalog(Step::Next, 3), Some(0));
        assert_eq!(session.step_catalog(Step::Prev, 3), Some(2));
        assert_eq!(session.catalog.map(|c| c.position), Some(2));
    }

    #[test]
    fn test_selected_rating_matches_kind() {
        let session = UserSession {
            rating: Some(RatingTarget {
                kind: RatingKind::Course,
                target: "Budgeting".to_string(),
            }),
            ..UserSession::default()
        };

        assert_eq!(
            session.selected_rating(RatingKind::Course).map(|t| t.target.as_str()),
            Some("Budgeting")
        );
        assert!(session.selected_rating(RatingKind::Teacher).is_none());
        // Looking does not consume the selection
        assert!(session.rating.is_some());
    }

    #[test]
    fn test_select_teacher_accepts_valid_name() {
        let mut session = UserSession {
            input: InputState::AwaitingTeacherName,
            ..UserSession::default()
        };

        let target = session.select_teacher("  Anna Smirnova ").unwrap().clone();
        assert_eq!(target.kind, RatingKind::Teacher);
        assert_eq!(target.target, "Anna Smirnova");
        assert_eq!(session.input, InputState::Idle);
        assert_eq!(session.rating, Some(target));
    }

    #[test]
    fn test_select_teacher_keeps_waiting_on_invalid_name() {
        let course = RatingTarget {
            kind: RatingKind::Course,
            target: "Budgeting".to_string(),
        };
        let mut session = UserSession {
            input: InputState::AwaitingTeacherName,
            rating: Some(course.clone()),
            ..UserSession::default()
        };

        assert_eq!(session.select_teacher("   "), Err(RatingError::EmptyName));
        assert_eq!(session.select_teacher(&"a".repeat(256)), Err(RatingError::NameTooLong));
        assert_eq!(session.input, InputState::AwaitingTeacherName);
        assert_eq!(session.rating, Some(course));
    }
}

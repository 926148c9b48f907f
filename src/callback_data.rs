//! # Callback Data Module
//!
//! Every inline button carries a short string in its callback data. This
//! module maps those strings to a typed [`Callback`] and back, so handlers
//! never split strings themselves.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{CourseFilter, Step};
use crate::rating::{RatingKind, Score};

/// Telegram rejects callback data longer than this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackParseError {
    #[error("unknown callback data: {0}")]
    Unknown(String),
    #[error("malformed callback data {data}: {reason}")]
    Malformed { data: String, reason: String },
}

/// A button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    MainMenu,
    /// Counter button between the pager arrows
    Noop,

    Catalog,
    DirectionMenu,
    PostMenu,
    AvailabilityMenu,
    Filter(CourseFilter),
    CoursePage(Step),

    FaqTopics,
    FaqTopic(usize),
    FaqItem { topic: usize, item: usize },

    StartSurvey,
    SurveyAnswer { question: usize, option: usize },
    SurveyBack,
    SurveyExit,
    RecommendedPage(Step),
    RecommendedBack,

    Feedback,
    Contacts,
    AskQuestion,
    Rate,
    RateCourse,
    SelectCourse(i32),
    RateTeacher,
    Score { kind: RatingKind, score: Score },
}

fn malformed(data: &str, reason: impl Into<String>) -> CallbackParseError {
    CallbackParseError::Malformed {
        data: data.to_string(),
        reason: reason.into(),
    }
}

fn parse_index<T: FromStr>(data: &str, raw: &str) -> Result<T, CallbackParseError> {
    raw.parse()
        .map_err(|_| malformed(data, format!("'{raw}' is not a valid index")))
}

fn parse_pair(data: &str, raw: &str) -> Result<(usize, usize), CallbackParseError> {
    let (first, second) = raw
        .split_once('_')
        .ok_or_else(|| malformed(data, "expected two indices"))?;
    Ok((parse_index(data, first)?, parse_index(data, second)?))
}

fn parse_score(data: &str, kind: RatingKind, raw: &str) -> Result<Callback, CallbackParseError> {
    let value: u8 = parse_index(data, raw)?;
    let score = Score::new(value).map_err(|e| malformed(data, e.to_string()))?;
    Ok(Callback::Score { kind, score })
}

impl FromStr for Callback {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let callback = match data {
            "main_menu" => Callback::MainMenu,
            "none" => Callback::Noop,
            "catalog" => Callback::Catalog,
            "direction" => Callback::DirectionMenu,
            "post" => Callback::PostMenu,
            "availability" => Callback::AvailabilityMenu,
            "course_prev" => Callback::CoursePage(Step::Prev),
            "course_next" => Callback::CoursePage(Step::Next),
            "questions" => Callback::FaqTopics,
            "courses" => Callback::StartSurvey,
            "survey_back" => Callback::SurveyBack,
            "survey_main_menu" => Callback::SurveyExit,
            "recommended_prev" => Callback::RecommendedPage(Step::Prev),
            "recommended_next" => Callback::RecommendedPage(Step::Next),
            "recommended_back" => Callback::RecommendedBack,
            "feedback" => Callback::Feedback,
            "contact_information" => Callback::Contacts,
            "ask_question" => Callback::AskQuestion,
            "rate" => Callback::Rate,
            "rate_course" => Callback::RateCourse,
            "rate_teacher" => Callback::RateTeacher,
            _ => {
                if let Ok(filter) = data.parse::<CourseFilter>() {
                    Callback::Filter(filter)
                } else if let Some(rest) = data.strip_prefix("faq_topic_") {
                    Callback::FaqTopic(parse_index(data, rest)?)
                } else if let Some(rest) = data.strip_prefix("faq_item_") {
                    let (topic, item) = parse_pair(data, rest)?;
                    Callback::FaqItem { topic, item }
                } else if let Some(rest) = data.strip_prefix("survey_") {
                    let (question, option) = parse_pair(data, rest)?;
                    Callback::SurveyAnswer { question, option }
                } else if let Some(rest) = data.strip_prefix("select_course_") {
                    Callback::SelectCourse(parse_index(data, rest)?)
                } else if let Some(rest) = data.strip_prefix("rating_course_") {
                    parse_score(data, RatingKind::Course, rest)?
                } else if let Some(rest) = data.strip_prefix("rating_teacher_") {
                    parse_score(data, RatingKind::Teacher, rest)?
                } else {
                    return Err(CallbackParseError::Unknown(data.to_string()));
                }
            }
        };
        Ok(callback)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::MainMenu => f.write_str("main_menu"),
            Callback::Noop => f.write_str("none"),
            Callback::Catalog => f.write_str("catalog"),
            Callback::DirectionMenu => f.write_str("direction"),
            Callback::PostMenu => f.write_str("post"),
            Callback::AvailabilityMenu => f.write_str("availability"),
            Callback::Filter(filter) => f.write_str(filter.as_key()),
            Callback::CoursePage(Step::Prev) => f.write_str("course_prev"),
            Callback::CoursePage(Step::Next) => f.write_str("course_next"),
            Callback::FaqTopics => f.write_str("questions"),
            Callback::FaqTopic(topic) => write!(f, "faq_topic_{topic}"),
            Callback::FaqItem { topic, item } => write!(f, "faq_item_{topic}_{item}"),
            Callback::StartSurvey => f.write_str("courses"),
            Callback::SurveyAnswer { question, option } => write!(f, "survey_{question}_{option}"),
            Callback::SurveyBack => f.write_str("survey_back"),
            Callback::SurveyExit => f.write_str("survey_main_menu"),
            Callback::RecommendedPage(Step::Prev) => f.write_str("recommended_prev"),
            Callback::RecommendedPage(Step::Next) => f.write_str("recommended_next"),
            Callback::RecommendedBack => f.write_str("recommended_back"),
            Callback::Feedback => f.write_str("feedback"),
            Callback::Contacts => f.write_str("contact_information"),
            Callback::AskQuestion => f.write_str("ask_question"),
            Callback::Rate => f.write_str("rate"),
            Callback::RateCourse => f.write_str("rate_course"),
            Callback::SelectCourse(id) => write!(f, "select_course_{id}"),
            Callback::RateTeacher => f.write_str("rate_teacher"),
            Callback::Score { kind, score } => write!(f, "rating_{kind}_{}", score.value()),
        }
    }
}

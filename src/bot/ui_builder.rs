//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;
use tracing::warn;

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::callback_data::Callback;
use crate::catalog::{format_price, Access, Course, CourseFilter, Direction, FilterMenu, Role, Step};
use crate::config::CuratorContact;
use crate::faq::{self, FAQ_TOPICS};
use crate::rating::{RatingKind, Score};
use crate::recommendation::Recommendations;
use crate::survey::SurveyProgress;

/// A rendered message: text plus its inline keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
    /// Whether `text` uses Telegram HTML markup
    pub html: bool,
}

impl Screen {
    fn plain(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text,
            keyboard: InlineKeyboardMarkup::new(rows),
            html: false,
        }
    }

    fn html(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text,
            keyboard: InlineKeyboardMarkup::new(rows),
            html: true,
        }
    }
}

fn button(text: impl Into<String>, callback: Callback) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, callback.to_string())
}

fn url_button(text: String, url: &str) -> Option<InlineKeyboardButton> {
    match reqwest::Url::parse(url) {
        Ok(url) => Some(InlineKeyboardButton::url(text, url)),
        Err(e) => {
            warn!(url = url, error = %e, "Skipping link button with invalid URL");
            None
        }
    }
}

fn main_menu_row(lang: Option<&str>) -> Vec<InlineKeyboardButton> {
    vec![button(t_lang("btn-main-menu", lang), Callback::MainMenu)]
}

fn back_and_menu_column(back: Callback, lang: Option<&str>) -> Vec<Vec<InlineKeyboardButton>> {
    vec![
        vec![button(t_lang("btn-back", lang), back)],
        main_menu_row(lang),
    ]
}

/// Text with no buttons
pub fn notice(text: String) -> Screen {
    Screen::plain(text, Vec::new())
}

/// A request for free-text input, cancellable through the main menu
pub fn prompt(key: &str, lang: Option<&str>) -> Screen {
    Screen::plain(t_lang(key, lang), vec![main_menu_row(lang)])
}

pub fn main_menu(lang: Option<&str>) -> Screen {
    Screen::plain(
        t_lang("main-menu-title", lang),
        vec![
            vec![button(t_lang("menu-catalog", lang), Callback::Catalog)],
            vec![button(t_lang("menu-faq", lang), Callback::FaqTopics)],
            vec![button(t_lang("menu-survey", lang), Callback::StartSurvey)],
            vec![button(t_lang("menu-feedback", lang), Callback::Feedback)],
        ],
    )
}

pub fn catalog_menu(lang: Option<&str>) -> Screen {
    Screen::plain(
        t_lang("catalog-title", lang),
        vec![
            vec![button(t_lang("catalog-by-direction", lang), Callback::DirectionMenu)],
            vec![button(t_lang("catalog-by-post", lang), Callback::PostMenu)],
            vec![button(t_lang("catalog-by-availability", lang), Callback::AvailabilityMenu)],
            main_menu_row(lang),
        ],
    )
}

/// One of the three filter submenus of the catalog
pub fn filter_menu(menu: FilterMenu, lang: Option<&str>) -> Screen {
    let (title_key, filters): (&str, Vec<CourseFilter>) = match menu {
        FilterMenu::Direction => (
            "direction-menu-title",
            Direction::ALL.into_iter().map(CourseFilter::Direction).collect(),
        ),
        FilterMenu::Post => (
            "post-menu-title",
            Role::ALL.into_iter().map(CourseFilter::Role).collect(),
        ),
        FilterMenu::Availability => (
            "availability-menu-title",
            Access::ALL.into_iter().map(CourseFilter::Access).collect(),
        ),
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = filters
        .into_iter()
        .map(|filter| vec![button(t_lang(filter.label_key(), lang), Callback::Filter(filter))])
        .collect();
    rows.extend(back_and_menu_column(Callback::Catalog, lang));

    Screen::plain(t_lang(title_key, lang), rows)
}

fn menu_callback(menu: FilterMenu) -> Callback {
    match menu {
        FilterMenu::Direction => Callback::DirectionMenu,
        FilterMenu::Post => Callback::PostMenu,
        FilterMenu::Availability => Callback::AvailabilityMenu,
    }
}

fn duration_text(course: &Course, lang: Option<&str>) -> String {
    match course.duration_weeks {
        Some(weeks) => t_args_lang("duration-weeks", &[("weeks", &weeks.to_string())], lang),
        None => t_lang("duration-unknown", lang),
    }
}

fn access_text(course: &Course, lang: Option<&str>) -> String {
    if course.is_open() {
        t_lang("card-access-open", lang)
    } else {
        t_lang("card-access-limited", lang)
    }
}

/// Duration, price and availability lines shared by both course cards
fn course_facts(course: &Course, lang: Option<&str>) -> String {
    [
        t_args_lang("card-duration", &[("duration", &duration_text(course, lang))], lang),
        t_args_lang("card-price", &[("price", &format_price(course.price.into()))], lang),
        t_args_lang("card-access", &[("access", &access_text(course, lang))], lang),
    ]
    .join("\n")
}

fn pager_row(position: usize, total: usize, prev: Callback, next: Callback) -> Option<Vec<InlineKeyboardButton>> {
    (total > 1).then(|| {
        vec![
            button("⬅️", prev),
            button(format!("{}/{}", position + 1, total), Callback::Noop),
            button("➡️", next),
        ]
    })
}

fn course_link_row(course: &Course, lang: Option<&str>) -> Option<Vec<InlineKeyboardButton>> {
    let url = course.url.as_deref().filter(|u| !u.trim().is_empty())?;
    url_button(t_lang("btn-course-site", lang), url).map(|b| vec![b])
}

/// Catalog card for the course at `position` of a filtered listing
pub fn course_card(course: &Course, position: usize, total: usize, filter: CourseFilter, lang: Option<&str>) -> Screen {
    let category = course
        .category_key(filter)
        .map(|key| t_lang(key, lang))
        .unwrap_or_else(|| t_lang("category-unknown", lang));

    let text = format!(
        "<b>{}</b>\n\n{}\n\n{}\n{}",
        html::escape(&course.title),
        html::escape(&course.description),
        t_args_lang("card-category", &[("category", &category)], lang),
        course_facts(course, lang)
    );

    let mut rows = Vec::new();
    rows.extend(pager_row(
        position,
        total,
        Callback::CoursePage(Step::Prev),
        Callback::CoursePage(Step::Next),
    ));
    rows.extend(course_link_row(course, lang));
    rows.push(vec![
        button(t_lang("btn-back", lang), menu_callback(filter.parent_menu())),
        button(t_lang("btn-main-menu", lang), Callback::MainMenu),
    ]);

    Screen::html(text, rows)
}

pub fn courses_not_found(filter: CourseFilter, lang: Option<&str>) -> Screen {
    Screen::plain(
        t_lang("courses-not-found", lang),
        back_and_menu_column(menu_callback(filter.parent_menu()), lang),
    )
}

pub fn survey_no_results(lang: Option<&str>) -> Screen {
    Screen::plain(
        t_lang("survey-no-results", lang),
        vec![
            vec![button(t_lang("btn-back-to-survey", lang), Callback::RecommendedBack)],
            main_menu_row(lang),
        ],
    )
}

/// Card for the current recommendation, `None` when the list is empty
pub fn recommended_card(recommendations: &Recommendations, lang: Option<&str>) -> Option<Screen> {
    let course = recommendations.current()?;
    let total = recommendations.courses.len();

    let text = format!(
        "{}\n\n<b>{}</b>\n{}\n\n{}",
        t_lang("recommended-title", lang),
        html::escape(&course.title),
        html::escape(&course.description),
        course_facts(course, lang)
    );

    let mut rows = Vec::new();
    rows.extend(pager_row(
        recommendations.position,
        total,
        Callback::RecommendedPage(Step::Prev),
        Callback::RecommendedPage(Step::Next),
    ));
    rows.extend(course_link_row(course, lang));
    rows.push(vec![button(t_lang("btn-back-to-survey", lang), Callback::RecommendedBack)]);
    rows.push(main_menu_row(lang));

    Some(Screen::html(text, rows))
}

/// The current survey question, `None` once every question is answered
pub fn survey_question(progress: &SurveyProgress, lang: Option<&str>) -> Option<Screen> {
    let step = progress.current()?;

    let mut rows: Vec<Vec<InlineKeyboardButton>> = step
        .option_keys()
        .iter()
        .enumerate()
        .map(|(option, key)| {
            vec![button(
                t_lang(key, lang),
                Callback::SurveyAnswer {
                    question: progress.step,
                    option,
                },
            )]
        })
        .collect();

    let mut last_row = Vec::new();
    if progress.can_go_back() {
        last_row.push(button(t_lang("btn-back", lang), Callback::SurveyBack));
    }
    last_row.push(button(t_lang("btn-main-menu", lang), Callback::SurveyExit));
    rows.push(last_row);

    Some(Screen::plain(t_lang(step.prompt_key(), lang), rows))
}

pub fn faq_topics(lang: Option<&str>) -> Screen {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = FAQ_TOPICS
        .iter()
        .enumerate()
        .map(|(index, topic)| vec![button(t_lang(topic.title_key, lang), Callback::FaqTopic(index))])
        .collect();
    rows.push(main_menu_row(lang));

    Screen::plain(t_lang("faq-topics-title", lang), rows)
}

pub fn faq_questions(topic_index: usize, lang: Option<&str>) -> Option<Screen> {
    let topic = faq::topic(topic_index)?;

    let mut rows: Vec<Vec<InlineKeyboardButton>> = topic
        .items
        .iter()
        .enumerate()
        .map(|(item, entry)| {
            vec![button(
                t_lang(entry.question_key, lang),
                Callback::FaqItem {
                    topic: topic_index,
                    item,
                },
            )]
        })
        .collect();
    rows.push(vec![
        button(t_lang("btn-back-to-topics", lang), Callback::FaqTopics),
        button(t_lang("btn-main-menu", lang), Callback::MainMenu),
    ]);

    let title = t_args_lang("faq-topic-questions", &[("topic", &t_lang(topic.title_key, lang))], lang);
    Some(Screen::plain(title, rows))
}

pub fn faq_answer(topic_index: usize, item_index: usize, lang: Option<&str>) -> Option<Screen> {
    let item = faq::item_at(topic_index, item_index)?;

    let text = format!(
        "<b>{}</b> {}\n\n<b>{}</b> {}",
        t_lang("faq-question-label", lang),
        html::escape(&t_lang(item.question_key, lang)),
        t_lang("faq-answer-label", lang),
        html::escape(&t_lang(item.answer_key, lang))
    );

    Some(Screen::html(
        text,
        vec![vec![
            button(t_lang("btn-back-to-questions", lang), Callback::FaqTopic(topic_index)),
            button(t_lang("btn-main-menu", lang), Callback::MainMenu),
        ]],
    ))
}

pub fn feedback_menu(lang: Option<&str>) -> Screen {
    Screen::plain(
        t_lang("feedback-title", lang),
        vec![
            vec![button(t_lang("feedback-contacts", lang), Callback::Contacts)],
            vec![button(t_lang("feedback-rate", lang), Callback::Rate)],
            vec![button(t_lang("feedback-ask", lang), Callback::AskQuestion)],
            main_menu_row(lang),
        ],
    )
}

pub fn curator_contacts(curators: &[CuratorContact], lang: Option<&str>) -> Screen {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = curators
        .iter()
        .filter_map(|c| url_button(t_args_lang("curator-button", &[("name", &c.name)], lang), &c.url))
        .map(|b| vec![b])
        .collect();
    rows.extend(back_and_menu_column(Callback::Feedback, lang));

    Screen::plain(t_lang("contacts-title", lang), rows)
}

pub fn rate_menu(lang: Option<&str>) -> Screen {
    let mut rows = vec![
        vec![button(t_lang("rate-course", lang), Callback::RateCourse)],
        vec![button(t_lang("rate-teacher", lang), Callback::RateTeacher)],
    ];
    rows.extend(back_and_menu_column(Callback::Feedback, lang));

    Screen::plain(t_lang("rate-title", lang), rows)
}

pub fn rate_course_list(courses: &[Course], lang: Option<&str>) -> Screen {
    let title = if courses.is_empty() {
        t_lang("rate-no-courses", lang)
    } else {
        t_lang("rate-course-list-title", lang)
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = courses
        .iter()
        .map(|c| vec![button(c.title.clone(), Callback::SelectCourse(c.id))])
        .collect();
    rows.extend(back_and_menu_column(Callback::Rate, lang));

    Screen::plain(title, rows)
}

fn score_row(kind: RatingKind, lang: Option<&str>) -> Vec<InlineKeyboardButton> {
    Score::ALL
        .into_iter()
        .map(|score| {
            button(
                t_args_lang("score-button", &[("score", &score.value().to_string())], lang),
                Callback::Score { kind, score },
            )
        })
        .collect()
}

/// Score picker for a course chosen from the rating list
pub fn rate_course_selected(course_title: &str, lang: Option<&str>) -> Screen {
    let mut rows = vec![score_row(RatingKind::Course, lang)];
    rows.extend(back_and_menu_column(Callback::RateCourse, lang));

    Screen::html(
        t_args_lang("rate-course-selected", &[("course", &html::escape(course_title))], lang),
        rows,
    )
}

/// Score picker for a teacher whose name was just typed
pub fn rate_teacher_selected(teacher: &str, lang: Option<&str>) -> Screen {
    Screen::html(
        t_args_lang("rate-teacher-selected", &[("teacher", &html::escape(teacher))], lang),
        vec![score_row(RatingKind::Teacher, lang), main_menu_row(lang)],
    )
}

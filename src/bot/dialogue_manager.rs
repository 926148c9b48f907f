//! Dialogue Manager module for multi-step flows: catalog paging, the survey,
//! recommendations, ratings and the support question relay.
//!
//! Every flow mutates the caller's [`UserSession`]; handlers persist it once
//! the update has been processed.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use teloxide::utils::html;
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::catalog::{CatalogCursor, Course, CourseFilter, Step};
use crate::db;
use crate::dialogue::{InputState, UserSession};
use crate::rating::{RatingError, RatingKind, RatingTarget, Score};
use crate::recommendation::{recommend, Recommendations};
use crate::support::{validate_question, PendingQuestion, SupportDesk};
use crate::survey::{SurveyAnswers, SurveyOutcome, SurveyProgress};

use super::ui_builder::{self, Screen};

/// Send `screen` as a new message
pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> Result<MessageId> {
    let mut request = bot.send_message(chat_id, screen.text).reply_markup(screen.keyboard);
    if screen.html {
        request = request.parse_mode(ParseMode::Html);
    }
    let sent = request.await?;
    Ok(sent.id)
}

/// Render `screen` into `edit` when given, otherwise (or when editing fails) send it.
/// Returns the id of the message now showing the screen.
pub async fn show_screen(bot: &Bot, chat_id: ChatId, edit: Option<MessageId>, screen: Screen) -> Result<MessageId> {
    if let Some(message_id) = edit {
        let mut request = bot
            .edit_message_text(chat_id, message_id, screen.text.clone())
            .reply_markup(screen.keyboard.clone());
        if screen.html {
            request = request.parse_mode(ParseMode::Html);
        }

        match request.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(message_id),
            Err(e) => {
                warn!(user_id = %chat_id, message_id = message_id.0, error = %e, "Failed to edit message, sending a new one");
            }
        }
    }

    send_screen(bot, chat_id, screen).await
}

pub async fn show_main_menu(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    session.reset_to_menu();
    let message_id = show_screen(bot, chat_id, edit, ui_builder::main_menu(language_code)).await?;
    session.menu_message_id = Some(message_id.0);
    Ok(())
}

/// Greeting followed by a fresh main menu
pub async fn greet(bot: &Bot, chat_id: ChatId, session: &mut UserSession, language_code: Option<&str>) -> Result<()> {
    bot.send_message(chat_id, t_lang("greeting", language_code)).await?;
    show_main_menu(bot, chat_id, session, None, language_code).await
}

#[allow(clippy::too_many_arguments)]
async fn render_catalog(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    filter: CourseFilter,
    courses: &[Course],
    position: usize,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    if courses.is_empty() {
        session.catalog = None;
        show_screen(bot, chat_id, edit, ui_builder::courses_not_found(filter, language_code)).await?;
        return Ok(());
    }

    let position = position % courses.len();
    session.catalog = Some(CatalogCursor { filter, position });

    let screen = ui_builder::course_card(&courses[position], position, courses.len(), filter, language_code);
    show_screen(bot, chat_id, edit, screen).await?;
    Ok(())
}

/// Open the first course of a filtered listing
pub async fn show_filtered_courses(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    session: &mut UserSession,
    filter: CourseFilter,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    let courses = db::get_courses_by_filter(pool, filter).await?;
    debug!(user_id = %chat_id, filter = %filter, count = courses.len(), "Showing filtered courses");
    render_catalog(bot, chat_id, session, filter, &courses, 0, edit, language_code).await
}

/// Move the catalog pager. Returns a toast when there is no listing to page.
pub async fn page_catalog(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    session: &mut UserSession,
    step: Step,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(filter) = session.catalog_filter() else {
        return Ok(Some(t_lang("refresh-filter", language_code)));
    };

    let courses = db::get_courses_by_filter(pool, filter).await?;
    let position = session.step_catalog(step, courses.len()).unwrap_or(0);
    render_catalog(bot, chat_id, session, filter, &courses, position, edit, language_code).await?;
    Ok(None)
}

async fn render_survey(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(progress) = session.survey.as_mut() else {
        return Ok(());
    };
    let Some(screen) = ui_builder::survey_question(progress, language_code) else {
        return Ok(());
    };

    let target = edit.or(progress.message_id.map(MessageId));
    let message_id = show_screen(bot, chat_id, target, screen).await?;
    progress.message_id = Some(message_id.0);
    Ok(())
}

pub async fn start_survey(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    info!(user_id = %chat_id, "Starting survey");
    session.start_survey();
    render_survey(bot, chat_id, session, edit, language_code).await
}

/// Record a survey answer. Returns a toast when the button no longer applies.
#[allow(clippy::too_many_arguments)]
pub async fn answer_survey(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    user_id: i64,
    session: &mut UserSession,
    question: usize,
    option: usize,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(progress) = session.survey.as_mut() else {
        return Ok(Some(t_lang("survey-expired", language_code)));
    };

    match progress.answer(question, option) {
        Ok(SurveyOutcome::Next) => {
            render_survey(bot, chat_id, session, edit, language_code).await?;
            Ok(None)
        }
        Ok(SurveyOutcome::Completed(answers)) => {
            let target = edit.or(progress.message_id.map(MessageId));
            finish_survey(bot, pool, chat_id, user_id, session, answers, target, language_code).await?;
            Ok(None)
        }
        Err(e) => {
            debug!(user_id = %chat_id, error = %e, "Ignoring survey answer");
            Ok(Some(t_lang("survey-expired", language_code)))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn finish_survey(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    user_id: i64,
    session: &mut UserSession,
    answers: SurveyAnswers,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    session.survey = None;

    let candidates = match answers.role {
        Some(role) => {
            match db::update_user_position(pool, user_id, role.as_key()).await {
                Ok(true) => debug!(user_id, position = role.as_key(), "Stored position from survey"),
                Ok(false) => (),
                Err(e) => warn!(user_id, error = %e, "Failed to store position from survey"),
            }
            db::get_courses_by_filter(pool, CourseFilter::Role(role)).await?
        }
        None => db::get_all_courses(pool).await?,
    };

    let mut recommendations = Recommendations::new(recommend(candidates, &answers), answers);
    info!(user_id = %chat_id, count = recommendations.courses.len(), "Survey completed");

    let screen = ui_builder::recommended_card(&recommendations, language_code)
        .unwrap_or_else(|| ui_builder::survey_no_results(language_code));
    let message_id = show_screen(bot, chat_id, edit, screen).await?;
    recommendations.message_id = Some(message_id.0);
    session.recommended = Some(recommendations);
    Ok(())
}

pub async fn survey_back(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(progress) = session.survey.as_mut() else {
        return Ok(Some(t_lang("survey-expired", language_code)));
    };

    if progress.back() {
        render_survey(bot, chat_id, session, edit, language_code).await?;
    }
    Ok(None)
}

/// Leave the survey: its message is removed and a new main menu is sent
pub async fn exit_survey(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<()> {
    let survey_message = session
        .survey
        .as_ref()
        .and_then(|p| p.message_id.map(MessageId))
        .or(edit);

    if let Some(message_id) = survey_message {
        if let Err(e) = bot.delete_message(chat_id, message_id).await {
            warn!(user_id = %chat_id, error = %e, "Failed to delete survey message");
        }
    }

    show_main_menu(bot, chat_id, session, None, language_code).await
}

pub async fn page_recommendations(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    step: Step,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(recommendations) = session.recommended.as_mut() else {
        return Ok(Some(t_lang("survey-expired", language_code)));
    };

    recommendations.step(step);
    let Some(screen) = ui_builder::recommended_card(recommendations, language_code) else {
        return Ok(None);
    };

    let target = edit.or(recommendations.message_id.map(MessageId));
    let message_id = show_screen(bot, chat_id, target, screen).await?;
    recommendations.message_id = Some(message_id.0);
    Ok(None)
}

/// Reopen the last survey question with the earlier answers kept
pub async fn back_to_survey(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(recommendations) = session.recommended.take() else {
        return Ok(Some(t_lang("survey-expired", language_code)));
    };

    let message_id = edit.or(recommendations.message_id.map(MessageId));
    session.survey = Some(SurveyProgress::resume(recommendations.answers, message_id.map(|m| m.0)));
    render_survey(bot, chat_id, session, message_id, language_code).await?;
    Ok(None)
}

/// Relay the user's question to the support chat
pub async fn relay_question(
    bot: &Bot,
    pool: &PgPool,
    desk: &SupportDesk,
    msg: &Message,
    session: &mut UserSession,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let Some(question) = validate_question(text) else {
        bot.send_message(msg.chat.id, t_lang("question-invalid", language_code))
            .await?;
        return Ok(());
    };

    let username = msg.from.as_ref().and_then(|u| u.username.clone());
    let shown_name = username
        .clone()
        .unwrap_or_else(|| t_lang("support-no-username", None));
    let relay_text = t_args_lang(
        "support-new-question",
        &[("username", &shown_name), ("question", &question)],
        None,
    );

    let relayed = bot
        .send_message(desk.chat_id(), relay_text)
        .await
        .context("Failed to relay question to support chat")?;

    let pending = PendingQuestion {
        user_chat_id: msg.chat.id.0,
        username,
        question,
    };
    if let Err(e) = db::record_support_question(pool, relayed.id.0, &pending).await {
        warn!(user_id = %msg.chat.id, error = %e, "Failed to persist support question");
    }
    desk.register(relayed.id, pending).await;
    info!(user_id = %msg.chat.id, support_message_id = relayed.id.0, "Question relayed to support");

    session.input = InputState::Idle;
    bot.send_message(msg.chat.id, t_lang("question-sent", language_code))
        .await?;
    show_main_menu(bot, msg.chat.id, session, None, language_code).await
}

/// Deliver a support chat reply to the user who asked the question
pub async fn deliver_support_answer(bot: &Bot, pool: &PgPool, desk: &SupportDesk, msg: &Message) -> Result<()> {
    let Some(replied) = msg.reply_to_message() else {
        return Ok(());
    };
    let Some(answer) = msg.text() else {
        return Ok(());
    };

    let pending = match desk
        .resolve(replied.id, || db::find_pending_question(pool, replied.id.0))
        .await
    {
        Ok(pending) => pending,
        Err(e) => {
            error!(support_message_id = replied.id.0, error = %e, "Failed to look up pending question");
            bot.send_message(msg.chat.id, t_lang("generic-error", None))
                .await?;
            return Ok(());
        }
    };
    let Some(pending) = pending else {
        warn!(support_message_id = replied.id.0, "Support reply to an unknown message");
        bot.send_message(msg.chat.id, t_lang("support-unknown-user", None))
            .await?;
        return Ok(());
    };

    let user_chat = ChatId(pending.user_chat_id);
    let text = t_args_lang(
        "support-answer",
        &[
            ("answer", &html::escape(answer)),
            ("question", &html::escape(&pending.question)),
        ],
        None,
    );

    if let Err(e) = bot
        .send_message(user_chat, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        error!(user_id = %user_chat, error = %e, "Failed to deliver support answer");
        // Keep the question answerable
        desk.register(replied.id, pending).await;
        bot.send_message(msg.chat.id, t_lang("generic-error", None))
            .await?;
        return Ok(());
    }

    if let Err(e) = db::record_support_answer(pool, replied.id.0, answer).await {
        warn!(support_message_id = replied.id.0, error = %e, "Failed to persist support answer");
    }
    info!(user_id = %user_chat, support_message_id = replied.id.0, "Support answer delivered");

    bot.send_message(msg.chat.id, t_lang("support-answer-sent", None))
        .await?;
    send_screen(bot, user_chat, ui_builder::main_menu(None)).await?;
    Ok(())
}

/// Handle the instructor name typed after "rate a teacher"
pub async fn handle_teacher_name_input(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut UserSession,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    match session.select_teacher(text) {
        Ok(target) => {
            let screen = ui_builder::rate_teacher_selected(&target.target, language_code);
            send_screen(bot, chat_id, screen).await?;
        }
        Err(RatingError::NameTooLong) => {
            bot.send_message(chat_id, t_lang("teacher-name-too-long", language_code))
                .await?;
        }
        Err(_) => {
            bot.send_message(chat_id, t_lang("teacher-name-invalid", language_code))
                .await?;
        }
    }
    Ok(())
}

pub async fn select_course_for_rating(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    session: &mut UserSession,
    course_id: i32,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(course) = db::get_course_by_id(pool, course_id).await? else {
        return Ok(Some(t_lang("rating-select-again", language_code)));
    };

    let screen = ui_builder::rate_course_selected(&course.title, language_code);
    session.rating = Some(RatingTarget {
        kind: RatingKind::Course,
        target: course.title,
    });
    show_screen(bot, chat_id, edit, screen).await?;
    Ok(None)
}

/// Store a score for the current selection. Returns a toast when nothing of `kind` is selected.
#[allow(clippy::too_many_arguments)]
pub async fn store_score(
    bot: &Bot,
    pool: &PgPool,
    chat_id: ChatId,
    user_id: i64,
    session: &mut UserSession,
    kind: RatingKind,
    score: Score,
    edit: Option<MessageId>,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let Some(target) = session.selected_rating(kind) else {
        return Ok(Some(t_lang("rating-select-again", language_code)));
    };

    // The selection survives a failed write so the user can press the score again
    db::save_rating(pool, user_id, kind, &target.target, score).await?;
    session.rating = None;

    show_screen(bot, chat_id, edit, ui_builder::notice(t_lang("rating-thanks", language_code))).await?;
    show_main_menu(bot, chat_id, session, None, language_code).await?;
    Ok(None)
}

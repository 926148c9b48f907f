//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, error, warn};

// Import localization
use crate::localization::t_lang;

use crate::callback_data::Callback;
use crate::catalog::FilterMenu;
use crate::config::BotConfig;
use crate::db;
use crate::dialogue::{InputState, SessionDialogue, UserSession};
use crate::rating::RATEABLE_COURSES_LIMIT;

use super::dialogue_manager::{
    answer_survey, back_to_survey, exit_survey, page_catalog, page_recommendations, select_course_for_rating,
    show_filtered_courses, show_main_menu, show_screen, start_survey, store_score, survey_back,
};
use super::ui_builder;

/// Where a button was pressed and by whom
struct PressedButton<'a> {
    bot: &'a Bot,
    pool: &'a PgPool,
    config: &'a BotConfig,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    language_code: Option<&'a str>,
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: SessionDialogue,
    mut session: UserSession,
    pool: Arc<PgPool>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let language_code = q.from.language_code.as_deref();
    debug!(user_id = %q.from.id, data = data, "Received callback query from user");

    let toast = match (data.parse::<Callback>(), q.message.as_ref()) {
        (Ok(callback), Some(message)) => {
            let pressed = PressedButton {
                bot: &bot,
                pool: &pool,
                config: &config,
                chat_id: message.chat().id,
                message_id: message.id(),
                user_id: q.from.id.0 as i64,
                language_code,
            };

            match dispatch(&pressed, &mut session, callback).await {
                Ok(toast) => toast,
                Err(e) => {
                    error!(user_id = %q.from.id, data = data, error = %e, "Failed to handle callback");
                    if let Err(e) = bot
                        .send_message(pressed.chat_id, t_lang("generic-error", language_code))
                        .await
                    {
                        error!(user_id = %q.from.id, error = %e, "Failed to send error message");
                    }
                    None
                }
            }
        }
        (Ok(_), None) => {
            debug!(user_id = %q.from.id, "Callback without an accessible message");
            None
        }
        (Err(e), _) => {
            warn!(user_id = %q.from.id, error = %e, "Unknown callback data");
            None
        }
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(text) = toast {
        answer = answer.text(text);
    }
    if let Err(e) = answer.await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    dialogue.update(session).await?;
    Ok(())
}

/// Apply one button press. Returns an optional toast for the callback answer.
async fn dispatch(pressed: &PressedButton<'_>, session: &mut UserSession, callback: Callback) -> Result<Option<String>> {
    let bot = pressed.bot;
    let chat_id = pressed.chat_id;
    let edit = Some(pressed.message_id);
    let lang = pressed.language_code;

    match callback {
        Callback::Noop => {}
        Callback::MainMenu => show_main_menu(bot, chat_id, session, edit, lang).await?,
        Callback::Catalog => {
            show_screen(bot, chat_id, edit, ui_builder::catalog_menu(lang)).await?;
        }
        Callback::DirectionMenu => {
            show_screen(bot, chat_id, edit, ui_builder::filter_menu(FilterMenu::Direction, lang)).await?;
        }
        Callback::PostMenu => {
            show_screen(bot, chat_id, edit, ui_builder::filter_menu(FilterMenu::Post, lang)).await?;
        }
        Callback::AvailabilityMenu => {
            show_screen(bot, chat_id, edit, ui_builder::filter_menu(FilterMenu::Availability, lang)).await?;
        }
        Callback::Filter(filter) => {
            show_filtered_courses(bot, pressed.pool, chat_id, session, filter, edit, lang).await?;
        }
        Callback::CoursePage(step) => {
            return page_catalog(bot, pressed.pool, chat_id, session, step, edit, lang).await;
        }
        Callback::FaqTopics => {
            show_screen(bot, chat_id, edit, ui_builder::faq_topics(lang)).await?;
        }
        Callback::FaqTopic(topic) => match ui_builder::faq_questions(topic, lang) {
            Some(screen) => {
                show_screen(bot, chat_id, edit, screen).await?;
            }
            None => return Ok(Some(t_lang("faq-topic-not-found", lang))),
        },
        Callback::FaqItem { topic, item } => match ui_builder::faq_answer(topic, item, lang) {
            Some(screen) => {
                show_screen(bot, chat_id, edit, screen).await?;
            }
            None => return Ok(Some(t_lang("faq-question-not-found", lang))),
        },
        Callback::StartSurvey => start_survey(bot, chat_id, session, edit, lang).await?,
        Callback::SurveyAnswer { question, option } => {
            return answer_survey(
                bot,
                pressed.pool,
                chat_id,
                pressed.user_id,
                session,
                question,
                option,
                edit,
                lang,
            )
            .await;
        }
        Callback::SurveyBack => return survey_back(bot, chat_id, session, edit, lang).await,
        Callback::SurveyExit => exit_survey(bot, chat_id, session, edit, lang).await?,
        Callback::RecommendedPage(step) => {
            return page_recommendations(bot, chat_id, session, step, edit, lang).await;
        }
        Callback::RecommendedBack => return back_to_survey(bot, chat_id, session, edit, lang).await,
        Callback::Feedback => {
            show_screen(bot, chat_id, edit, ui_builder::feedback_menu(lang)).await?;
        }
        Callback::Contacts => {
            let screen = ui_builder::curator_contacts(&pressed.config.curators, lang);
            show_screen(bot, chat_id, edit, screen).await?;
        }
        Callback::AskQuestion => {
            session.input = InputState::AwaitingQuestion;
            show_screen(bot, chat_id, edit, ui_builder::prompt("ask-question-prompt", lang)).await?;
        }
        Callback::Rate => {
            show_screen(bot, chat_id, edit, ui_builder::rate_menu(lang)).await?;
        }
        Callback::RateCourse => {
            let courses = db::get_rateable_courses(pressed.pool, RATEABLE_COURSES_LIMIT).await?;
            show_screen(bot, chat_id, edit, ui_builder::rate_course_list(&courses, lang)).await?;
        }
        Callback::SelectCourse(course_id) => {
            return select_course_for_rating(bot, pressed.pool, chat_id, session, course_id, edit, lang).await;
        }
        Callback::RateTeacher => {
            session.input = InputState::AwaitingTeacherName;
            session.rating = None;
            show_screen(bot, chat_id, edit, ui_builder::prompt("rate-teacher-prompt", lang)).await?;
        }
        Callback::Score { kind, score } => {
            return store_score(
                bot,
                pressed.pool,
                chat_id,
                pressed.user_id,
                session,
                kind,
                score,
                edit,
                lang,
            )
            .await;
        }
    }

    Ok(None)
}

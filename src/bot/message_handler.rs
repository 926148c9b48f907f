//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

// Import localization
use crate::localization::t_lang;

use crate::db;
use crate::dialogue::{InputState, SessionDialogue, UserSession};
use crate::support::SupportDesk;

use super::dialogue_manager::{deliver_support_answer, greet, handle_teacher_name_input, relay_question};

/// Words that open the main menu
const GREETINGS: [&str; 3] = ["привет", "hello", "/menu"];

/// A bot command recognised in private chats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

/// Parse `/start` or `/help`, with or without a `@botname` suffix and arguments
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);

    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        _ => None,
    }
}

pub fn is_greeting(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    GREETINGS.contains(&text.as_str())
}

async fn remember_user(pool: &PgPool, msg: &Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };

    if let Err(e) = db::save_user(pool, user.id.0 as i64, user.username.as_deref(), &user.full_name(), None).await {
        warn!(user_id = %user.id, error = %e, "Failed to save user");
    }
}

/// Where a message came from, as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub support_chat: bool,
    pub private: bool,
    pub reply: bool,
}

impl Origin {
    pub fn of(msg: &Message, desk: &SupportDesk) -> Self {
        Self {
            support_chat: desk.is_support_chat(msg.chat.id),
            private: msg.chat.is_private(),
            reply: msg.reply_to_message().is_some(),
        }
    }
}

/// What the bot does with an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SupportAnswer,
    Ignore,
    NotText,
    Command(Command),
    Question,
    TeacherName,
    /// Greeting and main menu; `remember` saves the user first
    Greeting { remember: bool },
}

/// Decide how to handle a message. Support replies come first, then commands,
/// then the pending free-text input, then the greeting.
pub fn route_message(origin: Origin, input: InputState, text: Option<&str>) -> Route {
    if origin.support_chat {
        if origin.reply {
            return Route::SupportAnswer;
        }
        // Group conversation between operators is not addressed to the bot
        if !origin.private {
            return Route::Ignore;
        }
    }

    let Some(text) = text else {
        return Route::NotText;
    };

    if let Some(command) = parse_command(text) {
        return Route::Command(command);
    }

    match input {
        InputState::AwaitingQuestion => Route::Question,
        InputState::AwaitingTeacherName => Route::TeacherName,
        InputState::Idle => Route::Greeting {
            remember: is_greeting(text),
        },
    }
}

async fn handle_message(
    bot: &Bot,
    msg: &Message,
    route: Route,
    session: &mut UserSession,
    pool: &PgPool,
    desk: &SupportDesk,
) -> Result<()> {
    let language_code = msg.from.as_ref().and_then(|u| u.language_code.as_deref());
    let text = msg.text().unwrap_or_default();

    match route {
        Route::Ignore => Ok(()),
        Route::SupportAnswer => deliver_support_answer(bot, pool, desk, msg).await,
        Route::NotText => {
            bot.send_message(msg.chat.id, t_lang("welcome-hint", language_code))
                .await?;
            Ok(())
        }
        Route::Command(Command::Start) => {
            remember_user(pool, msg).await;
            bot.send_message(msg.chat.id, t_lang("welcome-hint", language_code))
                .await?;
            Ok(())
        }
        Route::Command(Command::Help) => {
            bot.send_message(msg.chat.id, t_lang("help-text", language_code))
                .await?;
            Ok(())
        }
        Route::Question => relay_question(bot, pool, desk, msg, session, text, language_code).await,
        Route::TeacherName => handle_teacher_name_input(bot, msg.chat.id, session, text, language_code).await,
        Route::Greeting { remember } => {
            if remember {
                remember_user(pool, msg).await;
            }
            greet(bot, msg.chat.id, session, language_code).await
        }
    }
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: SessionDialogue,
    mut session: UserSession,
    pool: Arc<PgPool>,
    desk: Arc<SupportDesk>,
) -> Result<()> {
    let route = route_message(Origin::of(&msg, &desk), session.input, msg.text());
    debug!(user_id = %msg.chat.id, input = ?session.input, route = ?route, "Received message");

    if route == Route::Ignore {
        return Ok(());
    }

    if let Err(e) = handle_message(&bot, &msg, route, &mut session, &pool, &desk).await {
        let language_code = msg.from.as_ref().and_then(|u| u.language_code.as_deref());
        error!(user_id = %msg.chat.id, error = %e, "Failed to handle message");
        bot.send_message(msg.chat.id, t_lang("generic-error", language_code))
            .await?;
    }

    if route != Route::SupportAnswer {
        dialogue.update(session).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/start ref123"), Some(Command::Start));
        assert_eq!(parse_command("/help@course_bot"), Some(Command::Help));
        assert_eq!(parse_command("/menu"), None);
        assert_eq!(parse_command("start"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_is_greeting() {
        assert!(is_greeting("Привет"));
        assert!(is_greeting("  HELLO "));
        assert!(is_greeting("/menu"));
        assert!(!is_greeting("hello there"));
    }

    const USER_CHAT: Origin = Origin {
        support_chat: false,
        private: true,
        reply: false,
    };

    #[test]
    fn test_support_replies_are_delivered() {
        for private in [true, false] {
            let origin = Origin {
                support_chat: true,
                private,
                reply: true,
            };
            assert_eq!(route_message(origin, InputState::Idle, Some("On the 15th")), Route::SupportAnswer);
            assert_eq!(route_message(origin, InputState::AwaitingQuestion, None), Route::SupportAnswer);
        }
    }

    #[test]
    fn test_private_support_chat_without_reply_uses_normal_flow() {
        let origin = Origin {
            support_chat: true,
            private: true,
            reply: false,
        };
        assert_eq!(route_message(origin, InputState::Idle, Some("/start")), Route::Command(Command::Start));
        assert_eq!(
            route_message(origin, InputState::Idle, Some("Привет")),
            Route::Greeting { remember: true }
        );
        assert_eq!(route_message(origin, InputState::AwaitingQuestion, Some("How?")), Route::Question);
        assert_eq!(route_message(origin, InputState::Idle, None), Route::NotText);
    }

    #[test]
    fn test_group_support_chat_without_reply_is_ignored() {
        let origin = Origin {
            support_chat: true,
            private: false,
            reply: false,
        };
        assert_eq!(route_message(origin, InputState::Idle, Some("hello")), Route::Ignore);
        assert_eq!(route_message(origin, InputState::Idle, None), Route::Ignore);
    }

    #[test]
    fn test_replies_outside_support_chat_are_ordinary_messages() {
        let origin = Origin { reply: true, ..USER_CHAT };
        assert_eq!(
            route_message(origin, InputState::Idle, Some("hello")),
            Route::Greeting { remember: true }
        );
    }

    #[test]
    fn test_commands_take_priority_over_input_modes() {
        for input in [InputState::Idle, InputState::AwaitingQuestion, InputState::AwaitingTeacherName] {
            assert_eq!(route_message(USER_CHAT, input, Some("/help")), Route::Command(Command::Help));
            assert_eq!(route_message(USER_CHAT, input, Some("/start")), Route::Command(Command::Start));
        }
    }

    #[test]
    fn test_input_modes_take_priority_over_greeting() {
        assert_eq!(route_message(USER_CHAT, InputState::AwaitingQuestion, Some("hello")), Route::Question);
        assert_eq!(
            route_message(USER_CHAT, InputState::AwaitingTeacherName, Some("Привет")),
            Route::TeacherName
        );
        // /menu is a greeting word, not a command
        assert_eq!(
            route_message(USER_CHAT, InputState::AwaitingQuestion, Some("/menu")),
            Route::Question
        );
    }

    #[test]
    fn test_idle_text_greets() {
        assert_eq!(
            route_message(USER_CHAT, InputState::Idle, Some("/menu")),
            Route::Greeting { remember: true }
        );
        assert_eq!(
            route_message(USER_CHAT, InputState::Idle, Some("what courses are there?")),
            Route::Greeting { remember: false }
        );
        assert_eq!(route_message(USER_CHAT, InputState::AwaitingQuestion, None), Route::NotText);
    }
}

//! # Support Routing Module
//!
//! Links questions relayed into the support chat with the users who asked
//! them, so that a reply in the support chat can be delivered back.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tracing::debug;

/// Maximum accepted question length in characters
pub const MAX_QUESTION_LEN: usize = 3000;

/// Unanswered questions kept in memory; older ones are answered through the database
pub const MAX_PENDING_QUESTIONS: usize = 1000;

/// A relayed question waiting for a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub user_chat_id: i64,
    pub username: Option<String>,
    pub question: String,
}

/// Routing table between support-chat messages and asking users
#[derive(Debug)]
pub struct SupportDesk {
    chat_id: ChatId,
    capacity: usize,
    pending: Mutex<BTreeMap<i32, PendingQuestion>>,
}

impl SupportDesk {
    pub fn new(chat_id: ChatId) -> Self {
        Self::with_capacity(chat_id, MAX_PENDING_QUESTIONS)
    }

    pub fn with_capacity(chat_id: ChatId, capacity: usize) -> Self {
        Self {
            chat_id,
            capacity: capacity.max(1),
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn is_support_chat(&self, chat_id: ChatId) -> bool {
        self.chat_id == chat_id
    }

    /// Remember which user the support message `support_message` was relayed for
    pub async fn register(&self, support_message: MessageId, question: PendingQuestion) {
        debug!(
            support_message_id = support_message.0,
            user_id = question.user_chat_id,
            "Registering pending support question"
        );
        let mut pending = self.pending.lock().await;
        pending.insert(support_message.0, question);

        // Message ids grow within a chat, so the smallest id is the oldest question
        while pending.len() > self.capacity {
            if let Some((evicted, _)) = pending.pop_first() {
                debug!(support_message_id = evicted, "Dropping oldest pending question from memory");
            }
        }
    }

    /// Remove and return the question a support reply refers to
    pub async fn take(&self, support_message: MessageId) -> Option<PendingQuestion> {
        self.pending.lock().await.remove(&support_message.0)
    }

    /// Question a support reply refers to, looked up in memory first and then through `fallback`
    pub async fn resolve<F, Fut>(&self, support_message: MessageId, fallback: F) -> Result<Option<PendingQuestion>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<PendingQuestion>>>,
    {
        match self.take(support_message).await {
            Some(question) => Ok(Some(question)),
            None => fallback().await,
        }
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Text of a question as typed by the user, trimmed and bounded
pub fn validate_question(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_QUESTION_LEN {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(user: i64) -> PendingQuestion {
        PendingQuestion {
            user_chat_id: user,
            username: Some("student".to_string()),
            question: "When does the course start?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_take_once() {
        let desk = SupportDesk::new(ChatId(-100));
        desk.register(MessageId(10), question(1)).await;
        desk.register(MessageId(11), question(2)).await;
        assert_eq!(desk.pending_count().await, 2);

        assert_eq!(desk.take(MessageId(11)).await.map(|q| q.user_chat_id), Some(2));
        assert!(desk.take(MessageId(11)).await.is_none());
        assert_eq!(desk.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let desk = SupportDesk::new(ChatId(-100));
        assert!(desk.take(MessageId(99)).await.is_none());
    }

    #[test]
    fn test_support_chat_detection() {
        let desk = SupportDesk::new(ChatId(1132159425));
        assert!(desk.is_support_chat(ChatId(1132159425)));
        assert!(!desk.is_support_chat(ChatId(42)));
    }

    #[test]
    fn test_validate_question() {
        assert_eq!(validate_question("  How much?  "), Some("How much?".to_string()));
        assert_eq!(validate_question("   "), None);
        assert_eq!(validate_question(&"q".repeat(MAX_QUESTION_LEN + 1)), None);
    }

    #[test]
    fn test_validate_question_counts_characters() {
        let cyrillic = "я".repeat(MAX_QUESTION_LEN);
        assert_eq!(cyrillic.len(), MAX_QUESTION_LEN * 2);
        assert_eq!(validate_question(&cyrillic), Some(cyrillic.clone()));
        assert_eq!(validate_question(&"я".repeat(MAX_QUESTION_LEN + 1)), None);
    }

    #[tokio::test]
    async fn test_oldest_question_evicted_at_capacity() {
        let desk = SupportDesk::with_capacity(ChatId(-100), 2);
        desk.register(MessageId(30), question(3)).await;
        desk.register(MessageId(10), question(1)).await;
        desk.register(MessageId(20), question(2)).await;

        assert_eq!(desk.pending_count().await, 2);
        assert!(desk.take(MessageId(10)).await.is_none());
        assert_eq!(desk.take(MessageId(20)).await.map(|q| q.user_chat_id), Some(2));
        assert_eq!(desk.take(MessageId(30)).await.map(|q| q.user_chat_id), Some(3));
    }

    #[tokio::test]
    async fn test_resolve_prefers_memory_then_fallback() {
        let desk = SupportDesk::new(ChatId(-100));
        desk.register(MessageId(5), question(1)).await;

        let found = desk.resolve(MessageId(5), || async { Ok(Some(question(99))) }).await.unwrap();
        assert_eq!(found.map(|q| q.user_chat_id), Some(1));

        let restored = desk.resolve(MessageId(6), || async { Ok(Some(question(9))) }).await.unwrap();
        assert_eq!(restored.map(|q| q.user_chat_id), Some(9));
    }

    #[tokio::test]
    async fn test_resolve_surfaces_lookup_errors() {
        let desk = SupportDesk::new(ChatId(-100));
        let result = desk
            .resolve(MessageId(7), || async { Err(anyhow::anyhow!("database is down")) })
            .await;
        assert!(result.is_err());
    }
}

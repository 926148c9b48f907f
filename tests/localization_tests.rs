//! # Localization Tests
//!
//! Message retrieval and formatting against the bundled Russian and English
//! resources, including fallbacks.

use course_assistant::localization::{
    detect_language, get_localization_manager, init_localization, t_args_lang, t_lang, LocalizationManager,
};
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("menu-catalog", "en", None);
        assert_eq!(message, "Course catalog");

        let message = manager.get_message_in_language("menu-catalog", "ru", None);
        assert!(!message.is_empty());
        assert_ne!(message, "Course catalog");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "en", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        // Falls back to Russian
        let fallback = manager.get_message_in_language("btn-main-menu", "de", None);
        let russian = manager.get_message_in_language("btn-main-menu", "ru", None);
        assert_eq!(fallback, russian);
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("weeks", "6");
        let message = manager.get_message_in_language("duration-weeks", "en", Some(&args));
        assert_eq!(message, "6 weeks");

        let message = manager.get_message_with_args("curator-button", "en", &[("name", "Polina")]);
        assert!(message.contains("Curator Polina"));
    }

    #[test]
    fn test_no_isolation_marks_around_arguments() {
        let manager = setup_localization();

        let message = manager.get_message_with_args("card-price", "en", &[("price", "15,000")]);
        assert_eq!(message, "💵 Price: 15,000 RUB");
        assert!(!message.contains('\u{2068}'));
    }

    #[test]
    fn test_multiline_support_messages() {
        let manager = setup_localization();

        let message = manager.get_message_with_args(
            "support-new-question",
            "en",
            &[("username", "maria"), ("question", "Is there a discount?")],
        );
        assert!(message.starts_with("📩 New question from user @maria:"));
        assert!(message.contains("\n\nIs there a discount?\n\n"));
    }

    #[test]
    fn test_detect_language_codes() {
        assert_eq!(detect_language(Some("en-US")), "en");
        assert_eq!(detect_language(Some("ru-RU")), "ru");
        assert_eq!(detect_language(Some("uk")), "ru");
        assert_eq!(detect_language(None), "ru");
    }

    #[test]
    fn test_global_helpers() {
        init_localization().expect("Failed to initialize localization");
        // Second initialization is a no-op
        init_localization().expect("Re-initialization should succeed");
        assert!(get_localization_manager().is_some());

        assert_eq!(t_lang("menu-faq", Some("en")), "Frequent questions");
        assert_eq!(
            t_args_lang("score-button", &[("score", "4")], Some("en-GB")),
            "⭐ 4"
        );
    }
}

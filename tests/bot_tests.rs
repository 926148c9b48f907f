use course_assistant::bot::ui_builder::{self, Screen};
use course_assistant::callback_data::{Callback, MAX_CALLBACK_DATA_LEN};
use course_assistant::catalog::{Access, Course, CourseFilter, Direction, FilterMenu, Role};
use course_assistant::config::{parse_curators, DEFAULT_CURATORS};
use course_assistant::faq::FAQ_TOPICS;
use course_assistant::localization::init_localization;
use course_assistant::recommendation::Recommendations;
use course_assistant::survey::{SurveyProgress, SURVEY_STEPS};
use teloxide::types::InlineKeyboardButtonKind;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() {
        // Initialize localization if not already done
        let _ = init_localization();
    }

    fn course(id: i32, title: &str, weeks: Option<i32>) -> Course {
        Course {
            id,
            title: title.to_string(),
            description: "Practical course".to_string(),
            duration_weeks: weeks,
            price: 15000,
            url: Some("https://example.com/course".to_string()),
            access: "limited".to_string(),
            role: "pps".to_string(),
            direction: "finance".to_string(),
        }
    }

    fn callback_data(screen: &Screen) -> Vec<String> {
        screen
            .keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn every_screen() -> Vec<Screen> {
        let courses = vec![course(1, "Budgeting", Some(4)), course(2, "Accounting", None)];
        let mut screens = vec![
            ui_builder::main_menu(Some("en")),
            ui_builder::catalog_menu(Some("en")),
            ui_builder::faq_topics(Some("ru")),
            ui_builder::feedback_menu(Some("ru")),
            ui_builder::rate_menu(Some("ru")),
            ui_builder::rate_course_list(&courses, Some("ru")),
            ui_builder::rate_course_selected("Budgeting", Some("en")),
            ui_builder::rate_teacher_selected("Anna", Some("en")),
            ui_builder::survey_no_results(Some("en")),
            ui_builder::prompt("ask-question-prompt", Some("en")),
        ];

        for menu in [FilterMenu::Direction, FilterMenu::Post, FilterMenu::Availability] {
            screens.push(ui_builder::filter_menu(menu, Some("en")));
        }

        for (index, course) in courses.iter().enumerate() {
            screens.push(ui_builder::course_card(
                course,
                index,
                courses.len(),
                CourseFilter::Direction(Direction::Finance),
                Some("en"),
            ));
        }

        let mut progress = SurveyProgress::new();
        for step in 0..SURVEY_STEPS.len() {
            screens.push(ui_builder::survey_question(&progress, Some("en")).expect("question exists"));
            progress.answer(step, 0).expect("first option is valid");
        }

        for (topic_index, topic) in FAQ_TOPICS.iter().enumerate() {
            screens.push(ui_builder::faq_questions(topic_index, Some("en")).expect("topic exists"));
            for item_index in 0..topic.items.len() {
                screens.push(ui_builder::faq_answer(topic_index, item_index, Some("en")).expect("item exists"));
            }
        }

        let recommendations = Recommendations::new(courses, Default::default());
        screens.push(ui_builder::recommended_card(&recommendations, Some("en")).expect("list is not empty"));

        screens
    }

    /// Every button the bot renders carries data the callback handler understands
    #[test]
    fn test_every_button_parses() {
        setup_localization();

        for screen in every_screen() {
            for data in callback_data(&screen) {
                assert!(data.len() <= MAX_CALLBACK_DATA_LEN, "{data} is too long");
                let parsed: Callback = data
                    .parse()
                    .unwrap_or_else(|e| panic!("{data} does not parse: {e}"));
                assert_eq!(parsed.to_string(), data);
            }
        }
    }

    /// Screens are rendered with translated text, not message keys
    #[test]
    fn test_screens_are_localized() {
        setup_localization();

        let menu = ui_builder::main_menu(Some("en"));
        assert_eq!(menu.text, "What do you need?");
        assert_eq!(menu.keyboard.inline_keyboard[0][0].text, "Course catalog");

        let russian = ui_builder::main_menu(Some("ru"));
        assert_ne!(russian.text, menu.text);

        let posts = ui_builder::filter_menu(FilterMenu::Post, Some("en"));
        let labels: Vec<&str> = posts
            .keyboard
            .inline_keyboard
            .iter()
            .take(Role::ALL.len())
            .map(|row| row[0].text.as_str())
            .collect();
        assert_eq!(
            labels,
            vec!["Teaching staff", "Administrative staff", "Leadership", "Students"]
        );
    }

    /// The course card shows every fact about the course
    #[test]
    fn test_course_card_text() {
        setup_localization();

        let card = ui_builder::course_card(
            &course(3, "Budgeting & Control", Some(6)),
            0,
            1,
            CourseFilter::Direction(Direction::Finance),
            Some("en"),
        );

        assert!(card.html);
        assert!(card.text.starts_with("<b>Budgeting &amp; Control</b>"));
        assert!(card.text.contains("📌 Category: Finance"));
        assert!(card.text.contains("⏱ Duration: 6 weeks"));
        assert!(card.text.contains("💵 Price: 15,000 RUB"));
        assert!(card.text.contains("🔐 Availability: Limited"));

        let unknown = ui_builder::course_card(
            &course(4, "Self-paced", None),
            0,
            1,
            CourseFilter::Access(Access::Limited),
            Some("en"),
        );
        assert!(unknown.text.contains("⏱ Duration: Not specified"));
        assert!(unknown.text.contains("📌 Category: Limited programs"));
    }

    /// Curator contacts render as link buttons
    #[test]
    fn test_default_curator_buttons() {
        setup_localization();

        let curators = parse_curators(DEFAULT_CURATORS).expect("defaults parse");
        let screen = ui_builder::curator_contacts(&curators, Some("en"));

        let links: Vec<String> = screen
            .keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::Url(url) => Some(url.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|url| url.starts_with("https://t.me/")));
        assert!(screen.keyboard.inline_keyboard[0][0].text.contains("Полина"));
    }

    /// FAQ answers are rendered as HTML with labels
    #[test]
    fn test_faq_answer_is_html() {
        setup_localization();

        let screen = ui_builder::faq_answer(0, 0, Some("en")).expect("first FAQ item exists");
        assert!(screen.html);
        assert!(screen.text.contains("<b>Question:</b> Which payment methods are available?"));
        assert!(screen.text.contains("<b>Answer:</b>"));
    }
}

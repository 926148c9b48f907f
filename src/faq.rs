//! Frequently asked questions, grouped by topic. All text lives in the
//! localization files; this module only knows the keys.

/// A question with its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaqItem {
    pub question_key: &'static str,
    pub answer_key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaqTopic {
    pub title_key: &'static str,
    pub items: &'static [FaqItem],
}

const fn item(question_key: &'static str, answer_key: &'static str) -> FaqItem {
    FaqItem {
        question_key,
        answer_key,
    }
}

pub static FAQ_TOPICS: [FaqTopic; 4] = [
    FaqTopic {
        title_key: "faq-topic-payment",
        items: &[
            item("faq-payment-methods-q", "faq-payment-methods-a"),
            item("faq-payment-installments-q", "faq-payment-installments-a"),
            item("faq-payment-receipt-q", "faq-payment-receipt-a"),
        ],
    },
    FaqTopic {
        title_key: "faq-topic-enrollment",
        items: &[
            item("faq-enrollment-how-q", "faq-enrollment-how-a"),
            item("faq-enrollment-documents-q", "faq-enrollment-documents-a"),
            item("faq-enrollment-phone-q", "faq-enrollment-phone-a"),
        ],
    },
    FaqTopic {
        title_key: "faq-topic-schedule",
        items: &[
            item("faq-schedule-start-q", "faq-schedule-start-a"),
            item("faq-schedule-extend-q", "faq-schedule-extend-a"),
            item("faq-schedule-length-q", "faq-schedule-length-a"),
        ],
    },
    FaqTopic {
        title_key: "faq-topic-support",
        items: &[
            item("faq-support-account-q", "faq-support-account-a"),
            item("faq-support-emails-q", "faq-support-emails-a"),
            item("faq-support-password-q", "faq-support-password-a"),
        ],
    },
];

pub fn topic(index: usize) -> Option<&'static FaqTopic> {
    FAQ_TOPICS.get(index)
}

pub fn item_at(topic_index: usize, item_index: usize) -> Option<&'static FaqItem> {
    topic(topic_index)?.items.get(item_index)
}

//! # Course Assistant Telegram Bot
//!
//! A menu-driven Telegram bot that helps users browse a course catalog, pick
//! courses through a short survey, read the FAQ, ask the support team
//! questions and rate courses and teachers.

pub mod bot;
pub mod callback_data;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod faq;
pub mod localization;
pub mod logging;
pub mod rating;
pub mod recommendation;
pub mod support;
pub mod survey;

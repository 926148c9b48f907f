//! # Configuration Module
//!
//! Runtime settings read from the environment (optionally seeded from a
//! `.env` file by `main`).

use std::env;
use thiserror::Error;

use crate::logging::LogFormat;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Curators listed under "contact information" when `CURATOR_CONTACTS` is unset
pub const DEFAULT_CURATORS: &str =
    "Полина=https://t.me/polina_morik;Виктория=https://t.me/vikkaaa1;Анастасия=https://t.me/nestty2";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// A curator's display name and Telegram link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratorContact {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    pub support_chat_id: i64,
    pub max_connections: u32,
    pub log_format: LogFormat,
    pub curators: Vec<CuratorContact>,
}

impl BotConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let database_url = required("DATABASE_URL")?;

        let raw_chat_id = required("SUPPORT_CHAT_ID")?;
        let support_chat_id = raw_chat_id.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
            key: "SUPPORT_CHAT_ID",
            value: raw_chat_id.clone(),
            reason: e.to_string(),
        })?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: raw.clone(),
                reason,
            })?,
            None => LogFormat::default(),
        };

        let curators = parse_curators(lookup("CURATOR_CONTACTS").as_deref().unwrap_or(DEFAULT_CURATORS))?;

        Ok(Self {
            bot_token,
            database_url,
            support_chat_id,
            max_connections,
            log_format,
            curators,
        })
    }
}

/// Parse `Name=url;Name2=url2` into curator contacts
pub fn parse_curators(raw: &str) -> Result<Vec<CuratorContact>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "CURATOR_CONTACTS",
                value: entry.to_string(),
                reason: "expected Name=url".to_string(),
            })?;
            let url = url.trim();
            reqwest::Url::parse(url).map_err(|e| ConfigError::Invalid {
                key: "CURATOR_CONTACTS",
                value: url.to_string(),
                reason: e.to_string(),
            })?;
            Ok(CuratorContact {
                name: name.trim().to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("DATABASE_URL", "postgres://localhost/courses"),
        ("SUPPORT_CHAT_ID", "-1001132159425"),
    ];

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup_from(&BASE)).unwrap();
        assert_eq!(config.support_chat_id, -1001132159425);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.curators.len(), 3);
        assert_eq!(config.curators[0].name, "Полина");
    }

    #[test]
    fn test_missing_token() {
        let err = BotConfig::from_lookup(lookup_from(&BASE[1..])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_invalid_chat_id() {
        let mut pairs = BASE.to_vec();
        pairs[2] = ("SUPPORT_CHAT_ID", "support");
        let err = BotConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SUPPORT_CHAT_ID", .. }));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DATABASE_MAX_CONNECTIONS", "12"));
        pairs.push(("LOG_FORMAT", "json"));
        pairs.push(("CURATOR_CONTACTS", "Olga=https://t.me/olga"));
        let config = BotConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.curators,
            vec![CuratorContact {
                name: "Olga".to_string(),
                url: "https://t.me/olga".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_curators_rejects_bad_entries() {
        assert!(parse_curators("Nobody").is_err());
        assert!(parse_curators("Bad=not a url").is_err());
        assert!(parse_curators(" ; ").unwrap().is_empty());
    }
}

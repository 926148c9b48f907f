//! # Localization Module
//!
//! Fluent message bundles for every language the bot speaks. Resources are
//! compiled into the binary from `locales/<lang>/main.ftl`.

use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

pub const DEFAULT_LANGUAGE: &str = "ru";

const RESOURCES: [(&str, &str); 2] = [
    ("ru", include_str!("../locales/ru/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the course assistant
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (lang, source) in RESOURCES {
            let locale: LanguageIdentifier = lang.parse()?;
            let bundle = Self::create_bundle(locale, source)?;
            bundles.insert(lang.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Unicode isolation marks show up as garbage in some Telegram clients
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Failed to parse {} resource: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Failed to add {} resource: {:?}", locale, errors))?;

        Ok(bundle)
    }

    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.bundles.contains_key(lang)
    }

    /// Get a localized message in `lang`, falling back to the default language
    pub fn get_message_in_language(
        &self,
        key: &str,
        lang: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(lang)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let fluent_args = args.map(|args| {
            args.iter()
                .map(|(k, v)| (*k, FluentValue::from(*v)))
                .collect::<FluentArgs>()
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key = key, lang = lang, errors = ?errors, "Errors while formatting message");
        }

        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, lang: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, lang, Some(&args_map))
    }
}

/// Map a Telegram language code (`en-US`, `ru`, ...) to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let primary = language_code
        .and_then(|code| code.split(['-', '_']).next())
        .map(|code| code.to_lowercase());

    match primary.as_deref() {
        Some("en") => "en",
        _ => DEFAULT_LANGUAGE,
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager. Calling it again is a no-op.
pub fn init_localization() -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_none() {
        let manager = LocalizationManager::new()?;
        // Another thread may have won the race, which is fine
        let _ = LOCALIZATION_MANAGER.set(manager);
    }
    Ok(())
}

/// Get the global localization manager
pub fn get_localization_manager() -> Option<&'static LocalizationManager> {
    LOCALIZATION_MANAGER.get()
}

/// Localized message for a Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_in_language(key, detect_language(language_code), None),
        None => key.to_string(),
    }
}

/// Localized message with arguments for a Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    match get_localization_manager() {
        Some(manager) => manager.get_message_with_args(key, detect_language(language_code), args),
        None => key.to_string(),
    }
}

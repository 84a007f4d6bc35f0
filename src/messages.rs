//! src/messages.rs
//!
//! User-facing text never appears in the subscription logic. It deals in
//! `MessageKey`s and the catalog turns them into text for a locale.
use crate::domain::{Language, LocaleSettings};
use actix_web::http::header::ACCEPT_LANGUAGE;
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Translations as they appear in configuration: language code -> key -> text.
pub type Translations = HashMap<String, HashMap<MessageKey, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Subscribed,
    Reactivated,
    AlreadySubscribed,
    Required,
    InvalidFormat,
    InvalidChoice,
    ReadOnly,
    EmailTaken,
}

impl MessageKey {
    pub const ALL: [MessageKey; 8] = [
        Self::Subscribed,
        Self::Reactivated,
        Self::AlreadySubscribed,
        Self::Required,
        Self::InvalidFormat,
        Self::InvalidChoice,
        Self::ReadOnly,
        Self::EmailTaken,
    ];

    /// The English source text, used when a locale has no translation.
    pub fn default_text(&self) -> &'static str {
        match self {
            Self::Subscribed => "You have successfully subscribed to the newsletter.",
            Self::Reactivated => {
                "We've reactivated your email address. Thanks for subscribing again!"
            }
            Self::AlreadySubscribed => "This email address is already subscribed and active.",
            Self::Required => "This field is required.",
            Self::InvalidFormat => "Enter a valid email address.",
            Self::InvalidChoice => {
                "Select a valid choice. That choice is not one of the available choices."
            }
            Self::ReadOnly => "This field cannot be changed.",
            Self::EmailTaken => "A subscriber with this email address already exists.",
        }
    }
}

/// Validation failures by field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<MessageKey>>;

/// Translations indexed by language code.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    translations: HashMap<String, HashMap<MessageKey, String>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_translations(translations: Translations) -> Self {
        let translations = translations
            .into_iter()
            .map(|(language, entries)| (language.to_lowercase(), entries))
            .collect();
        Self { translations }
    }

    pub fn with_translation(
        mut self,
        language: &str,
        key: MessageKey,
        text: impl Into<String>,
    ) -> Self {
        self.translations
            .entry(language.to_lowercase())
            .or_default()
            .insert(key, text.into());
        self
    }

    pub fn lookup(&self, language: &Language, key: MessageKey) -> String {
        self.translations
            .get(language.as_ref())
            .and_then(|entries| entries.get(&key))
            .cloned()
            .unwrap_or_else(|| key.default_text().to_string())
    }

    /// Field errors as the texts shown to the user.
    pub fn render_errors(
        &self,
        errors: &FieldErrors,
        language: &Language,
    ) -> BTreeMap<&'static str, Vec<String>> {
        errors
            .iter()
            .map(|(field, keys)| {
                let texts = keys.iter().map(|key| self.lookup(language, *key)).collect();
                (*field, texts)
            })
            .collect()
    }
}

/// Locale set and catalog shared by every page that renders newsletter text.
#[derive(Debug, Clone)]
pub struct Localization {
    pub locales: LocaleSettings,
    pub catalog: MessageCatalog,
}

impl Localization {
    pub fn new(locales: LocaleSettings, catalog: MessageCatalog) -> Self {
        Self { locales, catalog }
    }

    /// The language a response to `req` should use.
    pub fn language_for(&self, req: &HttpRequest) -> Language {
        let accept_language = req
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());
        self.locales.negotiate(accept_language)
    }
}

//! src/domain/locale.rs
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{0} is not a supported language")]
pub struct UnsupportedLanguage(String);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InvalidLocaleSettings {
    #[error("locale.supported must list at least one language.")]
    NoLanguages,
    #[error("locale.default '{0}' is not one of locale.supported.")]
    DefaultNotSupported(String),
}

/// The set of language codes a subscriber may choose from.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleSettings {
    pub default: String,
    pub supported: Vec<String>,
}

impl LocaleSettings {
    /// Checked once at start-up so `default_language` is always a supported code.
    pub fn validate(&self) -> Result<(), InvalidLocaleSettings> {
        if self.supported.iter().all(|code| code.trim().is_empty()) {
            return Err(InvalidLocaleSettings::NoLanguages);
        }
        if !self.is_supported(&self.default) {
            return Err(InvalidLocaleSettings::DefaultNotSupported(
                self.default.clone(),
            ));
        }
        Ok(())
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.supported.iter().any(|s| s.eq_ignore_ascii_case(code))
    }

    pub fn default_language(&self) -> Language {
        Language(self.default.to_lowercase())
    }

    /// Pick the first supported tag out of an `Accept-Language` header value,
    /// falling back to the default locale. Tags with `q=0` are never picked.
    pub fn negotiate(&self, accept_language: Option<&str>) -> Language {
        accept_language
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(acceptable_tag)
            .flat_map(|tag| {
                // `fr-CA` is served by `fr-CA` first, then by `fr`.
                let primary = tag.split('-').next().unwrap_or(tag);
                [tag, primary]
            })
            .find_map(|tag| Language::parse(tag, self).ok())
            .unwrap_or_else(|| self.default_language())
    }
}

/// The tag of one `Accept-Language` entry, or `None` if its weight is zero.
fn acceptable_tag(entry: &str) -> Option<&str> {
    let mut parts = entry.split(';').map(str::trim);
    let tag = parts.next().filter(|tag| !tag.is_empty())?;
    let quality = parts
        .filter_map(|param| param.strip_prefix("q="))
        .find_map(|q| q.trim().parse::<f32>().ok())
        .unwrap_or(1.0);
    (quality > 0.0).then_some(tag)
}

/// A language code drawn from the configured `LocaleSettings`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language(String);

impl Language {
    pub fn parse(s: &str, locales: &LocaleSettings) -> Result<Self, UnsupportedLanguage> {
        if !s.is_empty() && locales.is_supported(s) {
            Ok(Self(s.to_lowercase()))
        } else {
            Err(UnsupportedLanguage(s.to_string()))
        }
    }

    /// Rebuild a language read back from storage, where it was validated on the way in.
    pub(crate) fn from_stored(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

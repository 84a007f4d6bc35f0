//! src/domain/subscriber.rs
use crate::domain::{ContentPreference, Frequency, Language, LocaleSettings, SubscriberEmail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One email's relationship with the newsletter.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub date_subscribed: DateTime<Utc>,
    pub confirmed: bool,
    pub unsubscribe_token: Uuid,
    pub preferences: ContentPreference,
    pub frequency: Frequency,
    pub language: Language,
    pub gdpr_consent: bool,
    pub last_sent: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Subscriber {
    /// A freshly subscribed, unconfirmed and active record with default preferences.
    pub fn new(email: SubscriberEmail, locales: &LocaleSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            date_subscribed: Utc::now(),
            confirmed: false,
            unsubscribe_token: Uuid::new_v4(),
            preferences: ContentPreference::default(),
            frequency: Frequency::default(),
            language: locales.default_language(),
            gdpr_consent: false,
            last_sent: None,
            is_active: true,
        }
    }
}

impl std::fmt::Display for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.email)
    }
}

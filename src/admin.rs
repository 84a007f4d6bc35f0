//! src/admin.rs
//!
//! Administrator bulk actions over a selection of subscribers, the row
//! shape the admin listing shows, and the per-subscriber change view.
use crate::domain::subscriber_email::{self, SubscriberEmail};
use crate::domain::{ContentPreference, Frequency, Language, LocaleSettings, Subscriber};
use crate::messages::{FieldErrors, MessageKey};
use crate::store::{StoreError, SubscriberStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    ConfirmSubscriptions,
    DeactivateSubscriptions,
}

impl AdminAction {
    pub const ALL: [AdminAction; 2] = [Self::ConfirmSubscriptions, Self::DeactivateSubscriptions];

    pub fn description(&self) -> &'static str {
        match self {
            AdminAction::ConfirmSubscriptions => "Confirm selected subscriptions",
            AdminAction::DeactivateSubscriptions => "Deactivate selected subscriptions",
        }
    }

    /// Apply the action to every selected subscriber as one bulk write.
    ///
    /// Both actions are idempotent. Returns how many rows matched the selection.
    #[tracing::instrument(name = "Apply admin action", skip(store, ids), fields(selected = ids.len()))]
    pub async fn apply(&self, store: &dyn SubscriberStore, ids: &[Uuid]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        match self {
            AdminAction::ConfirmSubscriptions => store.confirm_many(ids).await,
            AdminAction::DeactivateSubscriptions => store.deactivate_many(ids).await,
        }
    }
}

/// One row of the admin listing.
#[derive(Debug, Serialize)]
pub struct SubscriberListEntry {
    pub id: Uuid,
    pub email: String,
    pub date_subscribed: DateTime<Utc>,
    pub confirmed: bool,
    pub preferences: &'static str,
    pub frequency: &'static str,
    pub language: String,
    pub is_active: bool,
}

impl From<&Subscriber> for SubscriberListEntry {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            id: subscriber.id,
            email: subscriber.email.to_string(),
            date_subscribed: subscriber.date_subscribed,
            confirmed: subscriber.confirmed,
            preferences: subscriber.preferences.label(),
            frequency: subscriber.frequency.label(),
            language: subscriber.language.as_ref().to_string(),
            is_active: subscriber.is_active,
        }
    }
}

/// How the change view groups a subscriber's fields.
pub const FIELDSETS: [(&str, &[&str]); 3] = [
    (
        "Subscriber Information",
        &["email", "date_subscribed", "confirmed"],
    ),
    ("Preferences", &["preferences", "frequency", "language"]),
    (
        "Subscription Status",
        &["is_active", "gdpr_consent", "unsubscribe_token", "last_sent"],
    ),
];

pub const READONLY_FIELDS: [&str; 3] = ["date_subscribed", "unsubscribe_token", "last_sent"];

/// Everything the change view shows for one subscriber.
pub fn change_view(subscriber: &Subscriber, locales: &LocaleSettings) -> Value {
    let fieldsets: Vec<Value> = FIELDSETS
        .iter()
        .map(|(name, fields)| serde_json::json!({ "name": name, "fields": fields }))
        .collect();
    let preferences: Vec<Value> = ContentPreference::ALL
        .iter()
        .map(|p| serde_json::json!({ "value": p.as_str(), "label": p.label() }))
        .collect();
    let frequencies: Vec<Value> = Frequency::ALL
        .iter()
        .map(|f| serde_json::json!({ "value": f.as_str(), "label": f.label() }))
        .collect();

    serde_json::json!({
        "subscriber": subscriber,
        "fieldsets": fieldsets,
        "readonly_fields": READONLY_FIELDS,
        "choices": {
            "preferences": preferences,
            "frequency": frequencies,
            "language": locales.supported,
        },
    })
}

/// An administrator's edit of one subscriber. Absent fields keep their value.
///
/// Read-only columns may be echoed back unchanged; any other value for them
/// is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriberChange {
    pub email: Option<String>,
    pub confirmed: Option<bool>,
    pub preferences: Option<String>,
    pub frequency: Option<String>,
    pub language: Option<String>,
    pub is_active: Option<bool>,
    pub gdpr_consent: Option<bool>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl SubscriberChange {
    /// `current` with this change applied, or every field that failed validation.
    pub fn apply_to(
        &self,
        current: &Subscriber,
        locales: &LocaleSettings,
    ) -> Result<Subscriber, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut updated = current.clone();

        if let Some(email) = &self.email {
            match SubscriberEmail::parse(email.clone()) {
                Ok(email) => updated.email = email,
                Err(subscriber_email::Error::Empty) => {
                    errors.insert("email", vec![MessageKey::Required]);
                }
                Err(subscriber_email::Error::Invalid(_)) => {
                    errors.insert("email", vec![MessageKey::InvalidFormat]);
                }
            }
        }
        if let Some(preferences) = &self.preferences {
            match ContentPreference::parse(preferences) {
                Ok(preferences) => updated.preferences = preferences,
                Err(_) => {
                    errors.insert("preferences", vec![MessageKey::InvalidChoice]);
                }
            }
        }
        if let Some(frequency) = &self.frequency {
            match Frequency::parse(frequency) {
                Ok(frequency) => updated.frequency = frequency,
                Err(_) => {
                    errors.insert("frequency", vec![MessageKey::InvalidChoice]);
                }
            }
        }
        if let Some(language) = &self.language {
            match Language::parse(language, locales) {
                Ok(language) => updated.language = language,
                Err(_) => {
                    errors.insert("language", vec![MessageKey::InvalidChoice]);
                }
            }
        }
        updated.confirmed = self.confirmed.unwrap_or(current.confirmed);
        updated.is_active = self.is_active.unwrap_or(current.is_active);
        updated.gdpr_consent = self.gdpr_consent.unwrap_or(current.gdpr_consent);

        let stored = serde_json::to_value(current).unwrap_or(Value::Null);
        for field in std::iter::once("id").chain(READONLY_FIELDS) {
            if let Some(submitted) = self.other.get(field) {
                if stored.get(field) != Some(submitted) {
                    errors.insert(field, vec![MessageKey::ReadOnly]);
                }
            }
        }

        if errors.is_empty() {
            Ok(updated)
        } else {
            Err(errors)
        }
    }
}

#[derive(thiserror::Error)]
pub enum ChangeError {
    #[error("No subscriber with id {0}")]
    NotFound(Uuid),
    #[error("The submitted change is not valid.")]
    Validation(FieldErrors),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for ChangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::routes::error_chain_fmt(self, f)
    }
}

/// Validate `change` against the stored subscriber and write it.
#[tracing::instrument(name = "Change a subscriber", skip(store, change, locales))]
pub async fn change_subscriber(
    store: &dyn SubscriberStore,
    id: Uuid,
    change: &SubscriberChange,
    locales: &LocaleSettings,
) -> Result<Subscriber, ChangeError> {
    let current = store
        .find_by_id(id)
        .await
        .context("Failed to load the subscriber")?
        .ok_or(ChangeError::NotFound(id))?;

    let updated = change
        .apply_to(&current, locales)
        .map_err(ChangeError::Validation)?;

    match store.update(&updated).await {
        Ok(()) => {
            tracing::info!("Subscriber changed");
            Ok(updated)
        }
        Err(StoreError::DuplicateEmail) => Err(ChangeError::Validation(FieldErrors::from([(
            "email",
            vec![MessageKey::EmailTaken],
        )]))),
        Err(e) => Err(anyhow::Error::new(e)
            .context("Failed to update the subscriber")
            .into()),
    }
}

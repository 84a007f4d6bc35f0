//! src/store/mod.rs
//!
//! Durable keyed storage for subscriber records. Both backends enforce the
//! email and unsubscribe-token uniqueness rules themselves and report a
//! conflicting write as a duplicate key, never as a generic failure.
use crate::domain::{ContentPreference, Frequency, Subscriber, SubscriberEmail};
use serde::Deserialize;
use uuid::Uuid;

mod memory;
pub use memory::InMemoryStore;

mod postgres;
pub use postgres::PostgresStore;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("A subscriber with this email address already exists.")]
    DuplicateEmail,
    #[error("A subscriber with this unsubscribe token already exists.")]
    DuplicateToken,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::routes::error_chain_fmt(self, f)
    }
}

/// Narrows the admin listing. Every `None` means "don't filter on this column".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriberFilter {
    pub confirmed: Option<bool>,
    pub preferences: Option<ContentPreference>,
    pub frequency: Option<Frequency>,
    pub language: Option<String>,
    pub is_active: Option<bool>,
    pub gdpr_consent: Option<bool>,
    /// Case-insensitive substring of the email address.
    pub q: Option<String>,
}

impl SubscriberFilter {
    pub fn matches(&self, subscriber: &Subscriber) -> bool {
        self.confirmed.map_or(true, |c| subscriber.confirmed == c)
            && self.preferences.map_or(true, |p| subscriber.preferences == p)
            && self.frequency.map_or(true, |fr| subscriber.frequency == fr)
            && self
                .language
                .as_deref()
                .map_or(true, |l| subscriber.language.as_ref().eq_ignore_ascii_case(l))
            && self.is_active.map_or(true, |a| subscriber.is_active == a)
            && self.gdpr_consent.map_or(true, |g| subscriber.gdpr_consent == g)
            && self.q.as_deref().map_or(true, |q| {
                subscriber
                    .email
                    .as_ref()
                    .to_lowercase()
                    .contains(&q.to_lowercase())
            })
    }
}

#[async_trait::async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Exact-match lookup. A miss is `Ok(None)`, not an error.
    async fn find_by_email(&self, email: &SubscriberEmail)
        -> Result<Option<Subscriber>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, StoreError>;

    async fn insert(&self, subscriber: &Subscriber) -> Result<(), StoreError>;

    /// Write the editable columns of `subscriber` over the row with its id.
    /// `date_subscribed`, `unsubscribe_token` and `last_sent` are never written.
    async fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError>;

    /// Update `is_active` in place, leaving every other column untouched.
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), StoreError>;

    /// Set `confirmed = true` on every listed record in a single write.
    async fn confirm_many(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Set `is_active = false` on every listed record in a single write.
    async fn deactivate_many(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// Newest subscriptions first.
    async fn list(&self, filter: &SubscriberFilter) -> Result<Vec<Subscriber>, StoreError>;
}

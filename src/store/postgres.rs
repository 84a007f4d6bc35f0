//! src/store/postgres.rs
use super::{StoreError, SubscriberFilter, SubscriberStore};
use crate::domain::{ContentPreference, Frequency, Language, Subscriber, SubscriberEmail};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const EMAIL_KEY: &str = "newsletter_subscriber_email_key";
const TOKEN_KEY: &str = "newsletter_subscriber_unsubscribe_token_key";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    date_subscribed: DateTime<Utc>,
    confirmed: bool,
    unsubscribe_token: Uuid,
    preferences: String,
    frequency: String,
    language: String,
    gdpr_consent: bool,
    last_sent: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = anyhow::Error;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: SubscriberEmail::parse(row.email).context("Stored email is invalid")?,
            date_subscribed: row.date_subscribed,
            confirmed: row.confirmed,
            unsubscribe_token: row.unsubscribe_token,
            preferences: ContentPreference::parse(&row.preferences)?,
            frequency: Frequency::parse(&row.frequency)?,
            language: Language::from_stored(row.language),
            gdpr_consent: row.gdpr_consent,
            last_sent: row.last_sent,
            is_active: row.is_active,
        })
    }
}

/// Turn unique-index violations into the matching duplicate-key error.
fn classify(e: sqlx::Error, action: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.is_unique_violation() {
            match db_error.constraint() {
                Some(EMAIL_KEY) => return StoreError::DuplicateEmail,
                Some(TOKEN_KEY) => return StoreError::DuplicateToken,
                _ => {}
            }
        }
    }
    tracing::error!("Failed to execute query: {:?}", e);
    StoreError::Unexpected(anyhow::Error::new(e).context(action))
}

/// Escape LIKE wildcards so a search term matches literally.
fn like_pattern(q: &str) -> String {
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait::async_trait]
impl SubscriberStore for PostgresStore {
    #[tracing::instrument(name = "Find subscriber by email", skip(self))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, date_subscribed, confirmed, unsubscribe_token,
                   preferences, frequency, language, gdpr_consent, last_sent, is_active
            FROM newsletter_subscriber
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to look up a subscriber by email"))?;

        row.map(Subscriber::try_from)
            .transpose()
            .map_err(StoreError::Unexpected)
    }

    #[tracing::instrument(name = "Find subscriber by id", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, date_subscribed, confirmed, unsubscribe_token,
                   preferences, frequency, language, gdpr_consent, last_sent, is_active
            FROM newsletter_subscriber
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to look up a subscriber by id"))?;

        row.map(Subscriber::try_from)
            .transpose()
            .map_err(StoreError::Unexpected)
    }

    #[tracing::instrument(
        name = "Updating subscriber details in the database",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn update(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE newsletter_subscriber
            SET email = $2, confirmed = $3, preferences = $4, frequency = $5,
                language = $6, is_active = $7, gdpr_consent = $8
            WHERE id = $1
            "#,
        )
        .bind(subscriber.id)
        .bind(subscriber.email.as_ref())
        .bind(subscriber.confirmed)
        .bind(subscriber.preferences.as_str())
        .bind(subscriber.frequency.as_str())
        .bind(subscriber.language.as_ref())
        .bind(subscriber.is_active)
        .bind(subscriber.gdpr_consent)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to update a subscriber"))?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("No subscriber with id {}", subscriber.id).into());
        }
        Ok(())
    }

    #[tracing::instrument(
        name = "Saving new subscriber details in the database",
        skip(self, subscriber),
        fields(subscriber_id = %subscriber.id)
    )]
    async fn insert(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO newsletter_subscriber (
                id, email, date_subscribed, confirmed, unsubscribe_token,
                preferences, frequency, language, gdpr_consent, last_sent, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(subscriber.id)
        .bind(subscriber.email.as_ref())
        .bind(subscriber.date_subscribed)
        .bind(subscriber.confirmed)
        .bind(subscriber.unsubscribe_token)
        .bind(subscriber.preferences.as_str())
        .bind(subscriber.frequency.as_str())
        .bind(subscriber.language.as_ref())
        .bind(subscriber.gdpr_consent)
        .bind(subscriber.last_sent)
        .bind(subscriber.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to insert a new subscriber"))?;

        Ok(())
    }

    #[tracing::instrument(name = "Update subscriber active flag", skip(self))]
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE newsletter_subscriber SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "Failed to update the subscriber active flag"))?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("No subscriber with id {}", id).into());
        }
        Ok(())
    }

    #[tracing::instrument(name = "Confirm subscribers", skip(self), fields(count = ids.len()))]
    async fn confirm_many(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE newsletter_subscriber SET confirmed = TRUE WHERE id = ANY($1)")
                .bind(ids)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(e, "Failed to confirm subscribers"))?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Deactivate subscribers", skip(self), fields(count = ids.len()))]
    async fn deactivate_many(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE newsletter_subscriber SET is_active = FALSE WHERE id = ANY($1)")
                .bind(ids)
                .execute(&self.pool)
                .await
                .map_err(|e| classify(e, "Failed to deactivate subscribers"))?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "List subscribers", skip(self))]
    async fn list(&self, filter: &SubscriberFilter) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, date_subscribed, confirmed, unsubscribe_token,
                   preferences, frequency, language, gdpr_consent, last_sent, is_active
            FROM newsletter_subscriber
            WHERE ($1::boolean IS NULL OR confirmed = $1)
              AND ($2::text IS NULL OR preferences = $2)
              AND ($3::text IS NULL OR frequency = $3)
              AND ($4::text IS NULL OR lower(language) = lower($4))
              AND ($5::boolean IS NULL OR is_active = $5)
              AND ($6::boolean IS NULL OR gdpr_consent = $6)
              AND ($7::text IS NULL OR email ILIKE $7)
            ORDER BY date_subscribed DESC
            "#,
        )
        .bind(filter.confirmed)
        .bind(filter.preferences.map(|p| p.as_str()))
        .bind(filter.frequency.map(|f| f.as_str()))
        .bind(filter.language.as_deref())
        .bind(filter.is_active)
        .bind(filter.gdpr_consent)
        .bind(filter.q.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to list subscribers"))?;

        rows.into_iter()
            .map(Subscriber::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Unexpected)
    }
}

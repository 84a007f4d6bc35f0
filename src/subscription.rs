//! src/subscription.rs
use crate::domain::subscriber_email::{self, SubscriberEmail};
use crate::domain::{Language, LocaleSettings, Subscriber};
pub use crate::messages::FieldErrors;
use crate::messages::{MessageCatalog, MessageKey};
use crate::store::{StoreError, SubscriberStore};
use serde::{Deserialize, Serialize};

pub const EMAIL_FIELD: &str = "email";

/// The raw submission, exactly as the client sent it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubscriptionFormData {
    #[serde(default)]
    pub email: String,
}

/// What a successful submission did, so the caller can pick its notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Created,
    Reactivated,
}

impl SubscriptionOutcome {
    pub fn message_key(&self) -> MessageKey {
        match self {
            SubscriptionOutcome::Created => MessageKey::Subscribed,
            SubscriptionOutcome::Reactivated => MessageKey::Reactivated,
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubmitError {
    #[error("The submitted form is not valid.")]
    Validation(FieldErrors),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::routes::error_chain_fmt(self, f)
    }
}

/// The newsletter signup form: validates an email and creates or
/// reactivates the matching subscriber.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionForm {
    data: SubscriptionFormData,
    errors: FieldErrors,
}

impl SubscriptionForm {
    /// An empty, unbound form for rendering.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(data: SubscriptionFormData) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn email(&self) -> &str {
        &self.data.email
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Validate the submission and write it.
    ///
    /// Exactly one store write happens on success and none on a validation
    /// failure. Field errors are also kept on the form so it can be rendered
    /// back to the user.
    #[tracing::instrument(
        name = "Submitting a newsletter subscription",
        skip(self, store, locales),
        fields(subscriber_email = %self.data.email)
    )]
    pub async fn submit(
        &mut self,
        store: &dyn SubscriberStore,
        locales: &LocaleSettings,
    ) -> Result<SubscriptionOutcome, SubmitError> {
        self.errors.clear();
        let result = self.write(store, locales).await;
        if let Err(SubmitError::Validation(errors)) = &result {
            self.errors = errors.clone();
        }
        result
    }

    async fn write(
        &self,
        store: &dyn SubscriberStore,
        locales: &LocaleSettings,
    ) -> Result<SubscriptionOutcome, SubmitError> {
        let email = SubscriberEmail::parse(self.data.email.clone()).map_err(|e| match e {
            subscriber_email::Error::Empty => field_error(MessageKey::Required),
            subscriber_email::Error::Invalid(_) => field_error(MessageKey::InvalidFormat),
        })?;

        let existing = store
            .find_by_email(&email)
            .await
            .map_err(unexpected("Failed to look up the subscriber"))?;

        match existing {
            None => {
                let subscriber = Subscriber::new(email, locales);
                match store.insert(&subscriber).await {
                    Ok(()) => {
                        tracing::info!(subscriber_id = %subscriber.id, "New subscriber created");
                        Ok(SubscriptionOutcome::Created)
                    }
                    // Another request created the same email between our lookup and insert.
                    Err(StoreError::DuplicateEmail) => {
                        tracing::warn!("Lost a concurrent subscription race");
                        Err(field_error(MessageKey::AlreadySubscribed))
                    }
                    Err(e) => Err(unexpected("Failed to insert the new subscriber")(e)),
                }
            }
            Some(subscriber) if subscriber.is_active => {
                Err(field_error(MessageKey::AlreadySubscribed))
            }
            Some(subscriber) => {
                store
                    .set_active(subscriber.id, true)
                    .await
                    .map_err(unexpected("Failed to reactivate the subscriber"))?;
                tracing::info!(subscriber_id = %subscriber.id, "Subscriber reactivated");
                Ok(SubscriptionOutcome::Reactivated)
            }
        }
    }

    /// The form as template context: submitted value plus rendered error texts.
    pub fn to_context(&self, catalog: &MessageCatalog, language: &Language) -> serde_json::Value {
        serde_json::json!({
            EMAIL_FIELD: self.data.email,
            "errors": catalog.render_errors(&self.errors, language),
        })
    }
}

fn field_error(key: MessageKey) -> SubmitError {
    SubmitError::Validation(FieldErrors::from([(EMAIL_FIELD, vec![key])]))
}

fn unexpected(context: &'static str) -> impl Fn(StoreError) -> SubmitError {
    move |e| SubmitError::Unexpected(anyhow::Error::new(e).context(context))
}

//! src/entry_point.rs
//!
//! Newsletter signup as a capability any page can take on. The host page
//! keeps building its own context and rendering its own template; the
//! capability adds the signup form to that context and handles submissions.
use crate::messages::Localization;
use crate::routes::error_chain_fmt;
use crate::store::SubscriberStore;
use crate::subscription::{SubmitError, SubscriptionForm, SubscriptionFormData};
use actix_web::http::header::{ContentType, LOCATION};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use serde::Deserialize;
use serde_json::Value;

/// Template context handed to the host's renderer.
pub type Context = serde_json::Map<String, Value>;

pub const DEFAULT_FORM_CONTEXT_NAME: &str = "newsletter_form";

fn default_form_context_name() -> String {
    DEFAULT_FORM_CONTEXT_NAME.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterConfig {
    /// Where a successful signup leads. Required.
    #[serde(default)]
    pub success_url_name: Option<String>,
    /// Context key the form is published under.
    #[serde(default = "default_form_context_name")]
    pub form_context_name: String,
}

impl NewsletterConfig {
    pub fn new(success_url_name: impl Into<String>) -> Self {
        Self {
            success_url_name: Some(success_url_name.into()),
            form_context_name: default_form_context_name(),
        }
    }

    /// The context key in use; a blank name falls back to the default.
    pub fn effective_form_context_name(&self) -> &str {
        match self.form_context_name.trim() {
            "" => DEFAULT_FORM_CONTEXT_NAME,
            name => name,
        }
    }
}

/// Missing wiring detected when a page takes on the newsletter capability.
#[derive(thiserror::Error, Debug)]
#[error(
    "{host} is missing the '{field}' attribute. \
     You must define '{field}' in its newsletter configuration."
)]
pub struct ImproperlyConfigured {
    pub host: &'static str,
    pub field: &'static str,
}

#[derive(thiserror::Error)]
pub enum PageError {
    #[error("{0} was not found")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        match self {
            PageError::NotFound(_) => StatusCode::NOT_FOUND,
            PageError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What a page has to offer to host the newsletter form.
#[async_trait::async_trait(?Send)]
pub trait HostPage: Send + Sync + 'static {
    fn template_name(&self) -> &str;

    /// The single record a detail page shows, if the page has one.
    async fn object(&self, _req: &HttpRequest) -> Result<Option<Value>, PageError> {
        Ok(None)
    }

    /// The records a list page shows, if the page has them.
    async fn object_list(&self, _req: &HttpRequest) -> Result<Option<Vec<Value>>, PageError> {
        Ok(None)
    }

    /// Add the page's own entries to `context`.
    async fn context_data(
        &self,
        _req: &HttpRequest,
        context: Context,
    ) -> Result<Context, PageError> {
        Ok(context)
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, anyhow::Error>;
}

/// The validated newsletter wiring for one host page type.
#[derive(Debug, Clone)]
pub struct NewsletterCapability {
    success_url_name: String,
    form_context_name: String,
}

impl NewsletterCapability {
    /// Fails immediately if `config` lacks a success destination.
    pub fn attach<H: HostPage>(config: &NewsletterConfig) -> Result<Self, ImproperlyConfigured> {
        let success_url_name = config
            .success_url_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ImproperlyConfigured {
                host: std::any::type_name::<H>(),
                field: "success_url_name",
            })?;

        Ok(Self {
            success_url_name: success_url_name.to_string(),
            form_context_name: config.effective_form_context_name().to_string(),
        })
    }

    pub fn success_url_name(&self) -> &str {
        &self.success_url_name
    }

    pub fn form_context_name(&self) -> &str {
        &self.form_context_name
    }
}

/// A host page with the newsletter capability attached.
pub struct NewsletterPage<H> {
    host: H,
    capability: NewsletterCapability,
}

impl<H> std::fmt::Debug for NewsletterPage<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterPage")
            .field("host", &std::any::type_name::<H>())
            .field("capability", &self.capability)
            .finish()
    }
}

impl<H: HostPage> NewsletterPage<H> {
    pub fn new(host: H, config: &NewsletterConfig) -> Result<Self, ImproperlyConfigured> {
        let capability = NewsletterCapability::attach::<H>(config)?;
        Ok(Self { host, capability })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn capability(&self) -> &NewsletterCapability {
        &self.capability
    }

    /// The host's usual context plus `form` under the configured key.
    pub async fn context_data(
        &self,
        req: &HttpRequest,
        form: &SubscriptionForm,
        localization: &Localization,
        messages: Vec<Value>,
    ) -> Result<Context, PageError> {
        let mut context = Context::new();
        if let Some(object) = self.host.object(req).await? {
            context.insert("object".into(), object);
        }
        if let Some(object_list) = self.host.object_list(req).await? {
            context.insert("object_list".into(), Value::Array(object_list));
        }
        context.insert("messages".into(), Value::Array(messages));

        let mut context = self.host.context_data(req, context).await?;

        let language = localization.language_for(req);
        context.insert(
            self.capability.form_context_name.clone(),
            form.to_context(&localization.catalog, &language),
        );
        Ok(context)
    }

    fn render(&self, context: &Context) -> Result<HttpResponse, PageError> {
        let body = self
            .host
            .render(self.host.template_name(), context)
            .map_err(|e| e.context(format!("Failed to render {}", self.host.template_name())))?;

        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body))
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Success => "success",
        Level::Warning => "warning",
        Level::Error => "error",
    }
}

fn pending_messages(flash_messages: &IncomingFlashMessages) -> Vec<Value> {
    flash_messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "level": level_name(m.level()),
                "message": m.content(),
            })
        })
        .collect()
}

/// GET handler: the host page with an empty signup form.
#[tracing::instrument(name = "Render newsletter host page", skip_all, fields(path = %req.path()))]
pub async fn show_page<H: HostPage>(
    req: HttpRequest,
    page: web::Data<NewsletterPage<H>>,
    localization: web::Data<Localization>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, PageError> {
    let context = page
        .context_data(
            &req,
            &SubscriptionForm::new(),
            &localization,
            pending_messages(&flash_messages),
        )
        .await?;

    page.render(&context)
}

/// POST handler: subscribe, then redirect back on success or re-render with errors.
#[tracing::instrument(
    name = "Handle newsletter signup",
    skip_all,
    fields(
        path = %req.path(),
        subscriber_email = %form.email,
        success_url_name = %page.capability().success_url_name()
    )
)]
pub async fn submit_page<H: HostPage>(
    req: HttpRequest,
    form: web::Form<SubscriptionFormData>,
    page: web::Data<NewsletterPage<H>>,
    store: web::Data<dyn SubscriberStore>,
    localization: web::Data<Localization>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, PageError> {
    let mut form = SubscriptionForm::bind(form.into_inner());

    match form.submit(store.get_ref(), &localization.locales).await {
        Ok(outcome) => {
            let language = localization.language_for(&req);
            FlashMessage::success(localization.catalog.lookup(&language, outcome.message_key()))
                .send();

            // Redirect to the same URL so a refresh does not resubmit the form.
            Ok(HttpResponse::Found()
                .insert_header((LOCATION, req.path().to_string()))
                .finish())
        }
        Err(SubmitError::Validation(_)) => {
            let context = page
                .context_data(&req, &form, &localization, pending_messages(&flash_messages))
                .await?;
            page.render(&context)
        }
        Err(SubmitError::Unexpected(e)) => Err(PageError::UnexpectedError(e)),
    }
}

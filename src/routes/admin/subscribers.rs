//! src/routes/admin/subscribers.rs
use crate::admin::{
    change_subscriber, change_view, AdminAction, ChangeError, SubscriberChange,
    SubscriberListEntry,
};
use crate::messages::Localization;
use crate::routes::error_chain_fmt;
use crate::store::{StoreError, SubscriberFilter, SubscriberStore};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum AdminError {
    #[error("No subscriber with id {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_failure(context: &'static str) -> impl Fn(StoreError) -> AdminError {
    move |e| AdminError::UnexpectedError(anyhow::Error::new(e).context(context))
}

#[tracing::instrument(name = "List subscribers for the admin", skip(store))]
pub async fn admin_subscribers(
    filter: web::Query<SubscriberFilter>,
    store: web::Data<dyn SubscriberStore>,
) -> Result<HttpResponse, AdminError> {
    let subscribers = store
        .list(&filter)
        .await
        .map_err(store_failure("Failed to list subscribers"))?;

    let entries: Vec<SubscriberListEntry> =
        subscribers.iter().map(SubscriberListEntry::from).collect();
    let actions: Vec<serde_json::Value> = AdminAction::ALL
        .iter()
        .map(|action| {
            serde_json::json!({
                "name": action,
                "description": action.description(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": entries.len(),
        "results": entries,
        "actions": actions,
    })))
}

#[derive(serde::Deserialize, Debug)]
pub struct ActionRequest {
    action: AdminAction,
    #[serde(default)]
    ids: Vec<Uuid>,
}

#[tracing::instrument(
    name = "Run an admin bulk action",
    skip(body, store),
    fields(action = ?body.action, selected = body.ids.len())
)]
pub async fn admin_subscriber_actions(
    body: web::Json<ActionRequest>,
    store: web::Data<dyn SubscriberStore>,
) -> Result<HttpResponse, AdminError> {
    let updated = body
        .action
        .apply(store.get_ref(), &body.ids)
        .await
        .with_context(|| format!("Failed to apply {}", body.action.description()))?;

    tracing::info!(updated, "Admin action applied");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

#[tracing::instrument(name = "Show a subscriber for the admin", skip(store, localization))]
pub async fn admin_subscriber_detail(
    id: web::Path<Uuid>,
    store: web::Data<dyn SubscriberStore>,
    localization: web::Data<Localization>,
) -> Result<HttpResponse, AdminError> {
    let id = id.into_inner();
    let subscriber = store
        .find_by_id(id)
        .await
        .map_err(store_failure("Failed to load the subscriber"))?
        .ok_or(AdminError::NotFound(id))?;

    Ok(HttpResponse::Ok().json(change_view(&subscriber, &localization.locales)))
}

#[tracing::instrument(
    name = "Save an admin change to a subscriber",
    skip(req, change, store, localization)
)]
pub async fn admin_subscriber_change(
    req: HttpRequest,
    id: web::Path<Uuid>,
    change: web::Json<SubscriberChange>,
    store: web::Data<dyn SubscriberStore>,
    localization: web::Data<Localization>,
) -> Result<HttpResponse, AdminError> {
    let id = id.into_inner();
    match change_subscriber(store.get_ref(), id, &change, &localization.locales).await {
        Ok(subscriber) => {
            Ok(HttpResponse::Ok().json(change_view(&subscriber, &localization.locales)))
        }
        Err(ChangeError::Validation(errors)) => {
            let language = localization.language_for(&req);
            Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "errors": localization.catalog.render_errors(&errors, &language),
            })))
        }
        Err(ChangeError::NotFound(id)) => Err(AdminError::NotFound(id)),
        Err(ChangeError::Unexpected(e)) => Err(AdminError::UnexpectedError(e)),
    }
}

//! src/startup.rs
use crate::configuration::{DatabaseSettings, Settings, StoreBackend};
use crate::entry_point::{show_page, submit_page, HostPage, NewsletterPage};
use crate::messages::{Localization, MessageCatalog};
use crate::routes::{
    admin_subscriber_actions, admin_subscriber_change, admin_subscriber_detail,
    admin_subscribers, health_check, HomePage,
};
use crate::store::{InMemoryStore, PostgresStore, SubscriberStore};
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn build(config: Settings) -> Result<Self, anyhow::Error> {
        config.locale.validate()?;
        let page = NewsletterPage::new(HomePage::new(&config.newsletter), &config.newsletter)?;

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();

        let store = build_store(&config);
        let localization = Localization::new(
            config.locale.clone(),
            MessageCatalog::from_translations(config.translations.clone()),
        );
        let server = run(
            listener,
            store,
            localization,
            page,
            config.application.hmac_secret,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

fn build_store(config: &Settings) -> Arc<dyn SubscriberStore> {
    match config.application.store {
        StoreBackend::Postgres => {
            Arc::new(PostgresStore::new(get_connection_pool(&config.database)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Subscribers are kept in memory and will be lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
    }
}

/// Serve `page` at `/` with the newsletter form attached, plus the admin API.
pub fn run<H: HostPage>(
    listener: TcpListener,
    store: Arc<dyn SubscriberStore>,
    localization: Localization,
    page: NewsletterPage<H>,
    hmac_secret: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let secret_key = Key::try_from(hmac_secret.expose_secret().as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid hmac_secret: {:?}", e))?;
    let message_store = CookieMessageStore::builder(secret_key).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let store: web::Data<dyn SubscriberStore> = web::Data::from(store);
    let localization = web::Data::new(localization);
    let page = web::Data::new(page);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/", web::get().to(show_page::<H>))
            .route("/", web::post().to(submit_page::<H>))
            .service(
                web::scope("/admin")
                    .route("/subscribers", web::get().to(admin_subscribers))
                    .route("/subscribers/actions", web::post().to(admin_subscriber_actions))
                    .route("/subscribers/{id}", web::get().to(admin_subscriber_detail))
                    .route("/subscribers/{id}", web::post().to(admin_subscriber_change)),
            )
            .app_data(store.clone())
            .app_data(localization.clone())
            .app_data(page.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

//! tests/api/helpers.rs

use once_cell::sync::Lazy;
use sage_newsletter::configuration::{get_configuration, Settings, StoreBackend};
use sage_newsletter::domain::Subscriber;
use sage_newsletter::entry_point::{HostPage, NewsletterPage};
use sage_newsletter::messages::{Localization, MessageCatalog};
use sage_newsletter::routes::HomePage;
use sage_newsletter::startup::{run, Application};
use sage_newsletter::store::{InMemoryStore, SubscriberFilter, SubscriberStore};
use sage_newsletter::telemetry::{get_subscriber, init_subscriber};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // Set TEST_LOG=true to see logs during tests
    // Use bunyan to format the logs nicely:
    // $ TEST_LOG=true cargo test | bunyan
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct Test {
    pub address: String,
    pub store: Arc<dyn SubscriberStore>,
    pub api_client: reqwest::Client,
}

impl Test {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    pub async fn get_with_language(&self, path: &str, language: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .header("Accept-Language", language)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_signup(&self, body: &str) -> reqwest::Response {
        self.post_signup_to("/", body).await
    }

    pub async fn post_signup_to(&self, path: &str, body: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}{}", self.address, path))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_admin_action(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/admin/subscribers/actions", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscriber(&self, id: Uuid) -> reqwest::Response {
        self.get(&format!("/admin/subscribers/{}", id)).await
    }

    pub async fn post_subscriber(&self, id: Uuid, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/admin/subscribers/{}", self.address, id))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn subscribers(&self) -> Vec<Subscriber> {
        self.store
            .list(&SubscriberFilter::default())
            .await
            .expect("Failed to list subscribers.")
    }
}

pub fn test_configuration() -> Settings {
    let mut config = get_configuration().expect("Failed to read configuration.");
    config.application.port = 0;
    config.application.host = "127.0.0.1".into();
    config.application.store = StoreBackend::Memory;
    config
}

fn api_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap()
}

/// Launch the home page with an in-memory store.
pub async fn setup() -> Test {
    let config = test_configuration();
    let page = NewsletterPage::new(HomePage::new(&config.newsletter), &config.newsletter)
        .expect("Failed to attach the newsletter form.");
    setup_with_page(page).await
}

/// Launch the server with a custom host page mounted at `/`.
pub async fn setup_with_page<H: HostPage>(page: NewsletterPage<H>) -> Test {
    Lazy::force(&TRACING);

    let config = test_configuration();
    let store: Arc<dyn SubscriberStore> = Arc::new(InMemoryStore::new());

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port.");
    let port = listener.local_addr().unwrap().port();
    let server = run(
        listener,
        store.clone(),
        localization(&config),
        page,
        config.application.hmac_secret.clone(),
    )
    .expect("Failed to build server.");
    let _ = tokio::spawn(server);

    Test {
        address: format!("http://127.0.0.1:{}", port),
        store,
        api_client: api_client(),
    }
}

/// Launch through `Application::build`, the same path `main` takes.
pub async fn setup_application() -> String {
    Lazy::force(&TRACING);

    let app = Application::build(test_configuration()).expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", app.port());
    let _ = tokio::spawn(app.run_until_stopped());
    address
}

fn localization(config: &Settings) -> Localization {
    Localization::new(
        config.locale.clone(),
        MessageCatalog::from_translations(config.translations.clone()),
    )
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}

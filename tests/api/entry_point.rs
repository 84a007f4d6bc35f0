//! tests/api/entry_point.rs
//!
//! A host page that renders its context as JSON, so the composed context
//! can be inspected directly.

use crate::helpers::{assert_is_redirect_to, setup_with_page};
use actix_web::HttpRequest;
use sage_newsletter::entry_point::{Context, HostPage, NewsletterConfig, NewsletterPage, PageError};
use serde_json::{json, Value};

struct ArticlePage;

#[async_trait::async_trait(?Send)]
impl HostPage for ArticlePage {
    fn template_name(&self) -> &str {
        "article.html"
    }

    async fn object(&self, _req: &HttpRequest) -> Result<Option<Value>, PageError> {
        Ok(Some(json!({ "title": "Hello" })))
    }

    async fn object_list(&self, _req: &HttpRequest) -> Result<Option<Vec<Value>>, PageError> {
        Ok(Some(vec![json!("first"), json!("second")]))
    }

    async fn context_data(
        &self,
        _req: &HttpRequest,
        mut context: Context,
    ) -> Result<Context, PageError> {
        context.insert("sidebar".into(), json!(true));
        Ok(context)
    }

    fn render(&self, template_name: &str, context: &Context) -> Result<String, anyhow::Error> {
        Ok(json!({ "template": template_name, "context": context }).to_string())
    }
}

fn config(form_context_name: &str) -> NewsletterConfig {
    NewsletterConfig {
        success_url_name: Some("article".into()),
        form_context_name: form_context_name.into(),
    }
}

#[tokio::test]
async fn the_form_is_added_next_to_the_host_context() {
    // Arrange
    let page = NewsletterPage::new(ArticlePage, &config("newsletter_form")).unwrap();
    let test = setup_with_page(page).await;

    // Act
    let body: Value = test.get("/").await.json().await.unwrap();

    // Assert
    assert_eq!(body["template"], "article.html");
    let context = &body["context"];
    assert_eq!(context["object"]["title"], "Hello");
    assert_eq!(context["object_list"], json!(["first", "second"]));
    assert_eq!(context["sidebar"], true);
    assert_eq!(context["messages"], json!([]));
    assert_eq!(context["newsletter_form"], json!({ "email": "", "errors": {} }));
}

#[tokio::test]
async fn a_custom_context_name_is_honoured() {
    // Arrange
    let page = NewsletterPage::new(ArticlePage, &config("signup")).unwrap();
    let test = setup_with_page(page).await;

    // Act
    let response = test.post_signup("email=not-an-email").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let context = &body["context"];
    assert!(context.get("newsletter_form").is_none());
    assert_eq!(context["signup"]["email"], "not-an-email");
    assert_eq!(
        context["signup"]["errors"]["email"],
        json!(["Enter a valid email address."])
    );
    assert_eq!(context["object"]["title"], "Hello");
}

#[tokio::test]
async fn success_messages_reach_the_host_context_as_success_level() {
    // Arrange
    let page = NewsletterPage::new(ArticlePage, &config("newsletter_form")).unwrap();
    let test = setup_with_page(page).await;

    // Act
    let response = test.post_signup("email=reader%40example.com").await;
    assert_is_redirect_to(&response, "/");
    let body: Value = test.get("/").await.json().await.unwrap();

    // Assert
    assert_eq!(
        body["context"]["messages"],
        json!([{
            "level": "success",
            "message": "You have successfully subscribed to the newsletter.",
        }])
    );
}

#[test]
fn a_page_without_a_success_destination_cannot_be_built() {
    let config = NewsletterConfig {
        success_url_name: None,
        form_context_name: "newsletter_form".into(),
    };

    let error = NewsletterPage::new(ArticlePage, &config)
        .err()
        .expect("Attaching should fail.");
    assert!(error
        .to_string()
        .contains("ArticlePage is missing the 'success_url_name' attribute."));
}

struct RetractedArticlePage;

#[async_trait::async_trait(?Send)]
impl HostPage for RetractedArticlePage {
    fn template_name(&self) -> &str {
        "article.html"
    }

    async fn object(&self, _req: &HttpRequest) -> Result<Option<Value>, PageError> {
        Err(PageError::NotFound("Article".into()))
    }

    fn render(&self, _template_name: &str, _context: &Context) -> Result<String, anyhow::Error> {
        Ok(String::new())
    }
}

#[tokio::test]
async fn a_missing_host_object_is_a_404_on_both_paths() {
    // Arrange
    let page = NewsletterPage::new(RetractedArticlePage, &config("newsletter_form")).unwrap();
    let test = setup_with_page(page).await;

    // Act
    let shown = test.get("/").await;
    let submitted = test.post_signup("email=not-an-email").await;

    // Assert
    assert_eq!(404, shown.status().as_u16());
    assert_eq!(404, submitted.status().as_u16());
    assert!(test.subscribers().await.is_empty());
}

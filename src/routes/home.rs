//! src/routes/home.rs
use crate::entry_point::{Context, HostPage, NewsletterConfig, PageError};
use actix_web::HttpRequest;
use serde_json::Value;
use std::fmt::Write;

/// The landing page. It hosts the newsletter signup form.
#[derive(Debug, Clone)]
pub struct HomePage {
    form_context_name: String,
}

impl HomePage {
    pub fn new(config: &NewsletterConfig) -> Self {
        Self {
            form_context_name: config.effective_form_context_name().to_string(),
        }
    }
}

#[async_trait::async_trait(?Send)]
impl HostPage for HomePage {
    fn template_name(&self) -> &str {
        "home.html"
    }

    async fn context_data(
        &self,
        _req: &HttpRequest,
        mut context: Context,
    ) -> Result<Context, PageError> {
        context.insert("title".into(), Value::from("Newsletter"));
        Ok(context)
    }

    fn render(&self, _template_name: &str, context: &Context) -> Result<String, anyhow::Error> {
        let title = context
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut msg_html = String::new();
        for message in context
            .get("messages")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let text = message["message"].as_str().unwrap_or_default();
            writeln!(msg_html, "<p><i>{}</i></p>", htmlescape::encode_minimal(text))?;
        }

        let form = context
            .get(&self.form_context_name)
            .ok_or_else(|| anyhow::anyhow!("The newsletter form is missing from the context"))?;
        let email = form["email"].as_str().unwrap_or_default();
        let mut error_html = String::new();
        for error in form["errors"]["email"].as_array().into_iter().flatten() {
            let text = error.as_str().unwrap_or_default();
            writeln!(error_html, "<p class=\"error\">{}</p>", htmlescape::encode_minimal(text))?;
        }

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{title}</title>
</head>
<body>
    {msg_html}
    <form action="/" method="post">
        <label>Email
            <input
                type="email"
                placeholder="Enter your email address"
                name="email"
                value="{email}"
            >
        </label>
        {error_html}
        <button type="submit">Subscribe</button>
    </form>
</body>
</html>"#,
            title = htmlescape::encode_minimal(title),
            email = htmlescape::encode_minimal(email),
        ))
    }
}

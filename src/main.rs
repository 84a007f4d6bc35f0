use sage_newsletter::configuration::get_configuration;
use sage_newsletter::startup::Application;
use sage_newsletter::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("sage_newsletter".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration().expect("Failed to read configuration.");
    let app = Application::build(config)?;
    app.run_until_stopped().await?;

    Ok(())
}

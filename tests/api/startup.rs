//! tests/api/startup.rs

use crate::helpers::test_configuration;
use sage_newsletter::startup::Application;

#[test]
fn a_default_language_outside_the_supported_set_aborts_start_up() {
    let mut config = test_configuration();
    config.locale.default = "de".into();
    config.locale.supported = vec!["en".into(), "es".into()];

    let error = Application::build(config)
        .err()
        .expect("Start-up should have failed.");

    assert!(error.to_string().contains("locale.default 'de'"));
}

#[test]
fn a_missing_success_destination_aborts_start_up() {
    let mut config = test_configuration();
    config.newsletter.success_url_name = None;

    let error = Application::build(config)
        .err()
        .expect("Start-up should have failed.");

    assert!(error.to_string().contains("success_url_name"));
}

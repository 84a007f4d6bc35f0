//! src/domain/mod.rs
mod locale;
pub use locale::{InvalidLocaleSettings, Language, LocaleSettings, UnsupportedLanguage};

mod preferences;
pub use preferences::{ChoiceError, ContentPreference, Frequency};

pub mod subscriber_email;
pub use subscriber_email::SubscriberEmail;

mod subscriber;
pub use subscriber::Subscriber;

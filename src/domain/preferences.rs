//! src/domain/preferences.rs
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{value} is not a valid {kind}")]
pub struct ChoiceError {
    kind: &'static str,
    value: String,
}

/// The kind of content a subscriber wants to receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentPreference {
    #[default]
    News,
    Deals,
    Tips,
}

impl ContentPreference {
    pub const ALL: [ContentPreference; 3] = [Self::News, Self::Deals, Self::Tips];

    pub fn parse(s: &str) -> Result<Self, ChoiceError> {
        match s {
            "NEWS" => Ok(Self::News),
            "DEALS" => Ok(Self::Deals),
            "TIPS" => Ok(Self::Tips),
            other => Err(ChoiceError {
                kind: "content preference",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "NEWS",
            Self::Deals => "DEALS",
            Self::Tips => "TIPS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::News => "News",
            Self::Deals => "Deals",
            Self::Tips => "Tips",
        }
    }
}

impl AsRef<str> for ContentPreference {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// How often a subscriber wants the newsletter delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    pub fn parse(s: &str) -> Result<Self, ChoiceError> {
        match s {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            other => Err(ChoiceError {
                kind: "frequency",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }
}

impl AsRef<str> for Frequency {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

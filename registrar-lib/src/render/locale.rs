//! Display language for rendered values

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Language used for Yes/No and other rendered words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn yes(self) -> &'static str {
        match self {
            Locale::Ru => "Да",
            Locale::En => "Yes",
        }
    }

    pub fn no(self) -> &'static str {
        match self {
            Locale::Ru => "Нет",
            Locale::En => "No",
        }
    }

    /// Localized word for a boolean.
    pub fn bool_label(self, value: bool) -> &'static str {
        if value { self.yes() } else { self.no() }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("unknown locale '{}' (expected ru or en)", other)),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProcessingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OutputLanguage {
    #[default]
    #[serde(rename = "English (India)")]
    EnglishIndia,
    Hindi,
    Marathi,
    Tamil,
    Telugu,
    Gujarati,
    Bengali,
    Kannada,
    Malayalam,
    Punjabi,
}

impl OutputLanguage {
    pub const ALL: [OutputLanguage; 10] = [
        Self::EnglishIndia,
        Self::Hindi,
        Self::Marathi,
        Self::Tamil,
        Self::Telugu,
        Self::Gujarati,
        Self::Bengali,
        Self::Kannada,
        Self::Malayalam,
        Self::Punjabi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnglishIndia => "English (India)",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Gujarati => "Gujarati",
            Self::Bengali => "Bengali",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Punjabi => "Punjabi",
        }
    }

    /// English output needs no translation step.
    pub fn is_english(&self) -> bool {
        matches!(self, Self::EnglishIndia)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DetailLevel {
    Short,
    #[default]
    Detailed,
}

impl DetailLevel {
    pub const ALL: [DetailLevel; 2] = [Self::Short, Self::Detailed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Detailed => "Detailed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InsightMode {
    #[serde(rename = "Plain summary only")]
    PlainSummary,
    #[default]
    #[serde(rename = "Summary + risk/issue flags")]
    RiskFlags,
    #[serde(rename = "Summary + action items / next steps")]
    ActionItems,
}

impl InsightMode {
    pub const ALL: [InsightMode; 3] = [Self::PlainSummary, Self::RiskFlags, Self::ActionItems];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainSummary => "Plain summary only",
            Self::RiskFlags => "Summary + risk/issue flags",
            Self::ActionItems => "Summary + action items / next steps",
        }
    }
}

macro_rules! impl_option_text {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ProcessingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        ProcessingError::InvalidRequest(format!(
                            "Invalid {}. Allowed: {}",
                            $what,
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

impl_option_text!(OutputLanguage, "output language");
impl_option_text!(DetailLevel, "detail level");
impl_option_text!(InsightMode, "insight mode");

/// Options that shape the analysis of one document. Fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    pub output_language: OutputLanguage,
    pub detail_level: DetailLevel,
    pub insight_mode: InsightMode,
}

/// Options as received from a client: any field may be missing or carry an unknown value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRequest {
    #[serde(default)]
    pub output_language: Option<String>,
    #[serde(default)]
    pub detail_level: Option<String>,
    #[serde(default)]
    pub insight_mode: Option<String>,
}

impl OptionsRequest {
    /// Validates each supplied field and fills the missing ones from `defaults`.
    pub fn resolve(&self, defaults: &ProcessingOptions) -> Result<ProcessingOptions, ProcessingError> {
        Ok(ProcessingOptions {
            output_language: match &self.output_language {
                Some(v) => v.parse()?,
                None => defaults.output_language,
            },
            detail_level: match &self.detail_level {
                Some(v) => v.parse()?,
                None => defaults.detail_level,
            },
            insight_mode: match &self.insight_mode {
                Some(v) => v.parse()?,
                None => defaults.insight_mode,
            },
        })
    }
}

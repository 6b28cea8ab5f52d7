use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The ordered steps of a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExtractingText,
    Classifying,
    ExtractingData,
    Translating,
    Summarizing,
    GeneratingInsights,
    Completed,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Self::ExtractingText,
        Self::Classifying,
        Self::ExtractingData,
        Self::Translating,
        Self::Summarizing,
        Self::GeneratingInsights,
        Self::Completed,
    ];

    /// Progress reported once the stage begins.
    pub fn progress(&self) -> u8 {
        match self {
            Self::ExtractingText => 10,
            Self::Classifying => 30,
            Self::ExtractingData => 50,
            Self::Translating => 70,
            Self::Summarizing => 85,
            Self::GeneratingInsights => 95,
            Self::Completed => 100,
        }
    }

    /// Human-readable step label stored as `currentStep`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtractingText => "Extracting text",
            Self::Classifying => "Classifying document",
            Self::ExtractingData => "Extracting data",
            Self::Translating => "Translating content",
            Self::Summarizing => "Generating summary",
            Self::GeneratingInsights => "Generating insights",
            Self::Completed => "Completed",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ExtractingText => "extracting_text",
            Self::Classifying => "classifying",
            Self::ExtractingData => "extracting_data",
            Self::Translating => "translating",
            Self::Summarizing => "summarizing",
            Self::GeneratingInsights => "generating_insights",
            Self::Completed => "completed",
        }
    }

    /// Analysis stages may absorb failures; extraction and persistence may not.
    pub fn is_analysis(&self) -> bool {
        !matches!(self, Self::ExtractingText | Self::Completed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// The run fails.
    Fatal,
    /// The stage output is replaced by its fallback and the failure is recorded.
    Absorb,
}

/// Failure policy per stage, with overrides on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePolicies {
    overrides: HashMap<Stage, FailurePolicy>,
}

impl StagePolicies {
    pub fn new(overrides: HashMap<Stage, FailurePolicy>) -> Self {
        Self { overrides }
    }

    pub fn default_for(stage: Stage) -> FailurePolicy {
        if stage.is_analysis() {
            FailurePolicy::Absorb
        } else {
            FailurePolicy::Fatal
        }
    }

    pub fn policy(&self, stage: Stage) -> FailurePolicy {
        if !stage.is_analysis() {
            return FailurePolicy::Fatal;
        }
        self.overrides
            .get(&stage)
            .copied()
            .unwrap_or_else(|| Self::default_for(stage))
    }

    pub fn with(mut self, stage: Stage, policy: FailurePolicy) -> Self {
        self.overrides.insert(stage, policy);
        self
    }
}

//! Outputs of the analysis stages.
//!
//! Every type is lenient on input (`#[serde(default)]`) so partial answers from
//! an analysis backend still deserialize, and each stage output has a fallback
//! value used when its stage failure is absorbed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConfidenceLevel {
    High,
    Medium,
    #[default]
    Low,
}

/// Severity of a risk flag, priority of an action item or checklist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Classification {
    pub primary_type: String,
    pub sub_type: String,
    pub confidence: ConfidenceLevel,
    pub alternative_types: Vec<String>,
    pub jurisdiction: String,
    pub applicable_laws: Vec<String>,
}

impl Classification {
    pub fn fallback() -> Self {
        Self {
            primary_type: "Unknown".to_string(),
            sub_type: String::new(),
            confidence: ConfidenceLevel::Low,
            alternative_types: Vec::new(),
            jurisdiction: "India".to_string(),
            applicable_laws: Vec::new(),
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::fallback()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Party {
    pub name: String,
    pub role: Option<String>,
    #[serde(rename = "type")]
    pub party_type: Option<String>,
    /// PAN, CIN, GSTIN and similar registration numbers keyed by kind.
    pub identifiers: BTreeMap<String, String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Party {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Milestone {
    pub event: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyDates {
    pub execution_date: Option<String>,
    pub effective_date: Option<String>,
    pub expiry_date: Option<String>,
    pub key_milestones: Vec<Milestone>,
}

impl KeyDates {
    pub fn is_populated(&self) -> bool {
        self.execution_date.is_some()
            || self.effective_date.is_some()
            || self.expiry_date.is_some()
            || !self.key_milestones.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonetaryValues {
    pub amount: Option<f64>,
    pub loan_amount: Option<f64>,
    pub currency: Option<String>,
    pub interest_rate: Option<String>,
    pub fees: Option<String>,
    pub penalties: Option<String>,
}

impl MonetaryValues {
    pub fn is_populated(&self) -> bool {
        self.amount.is_some()
            || self.loan_amount.is_some()
            || self.currency.is_some()
            || self.interest_rate.is_some()
            || self.fees.is_some()
            || self.penalties.is_some()
    }

    /// The amount a headline quotes: the loan amount, else the principal amount.
    pub fn headline_amount(&self) -> Option<f64> {
        self.loan_amount.or(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JurisdictionInfo {
    pub court: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedData {
    pub parties: Vec<Party>,
    pub dates: KeyDates,
    pub monetary_values: MonetaryValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<JurisdictionInfo>,
    /// Fields specific to the document type (loan terms, case numbers, property details).
    #[serde(flatten)]
    pub type_specific: serde_json::Map<String, serde_json::Value>,
}

impl ExtractedData {
    pub fn fallback() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabeledDate {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatedContent {
    pub headline: String,
    pub key_clauses: Vec<String>,
    pub important_dates: Vec<LabeledDate>,
}

impl TranslatedContent {
    /// Untranslated content derived from the extracted data alone.
    pub fn fallback(data: &ExtractedData) -> Self {
        Self {
            headline: super::format::headline(data),
            key_clauses: Vec::new(),
            important_dates: super::format::important_dates(data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Obligation {
    pub party: String,
    pub obligation: String,
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub short_summary: Vec<String>,
    pub detailed_summary: String,
    pub verdict: String,
    pub key_obligations: Vec<Obligation>,
}

impl Summary {
    pub fn fallback() -> Self {
        Self {
            short_summary: vec!["Summary generation failed".to_string()],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskFlag {
    pub severity: Priority,
    pub category: String,
    pub description: String,
    pub recommendation: String,
    pub affected_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceItem {
    pub item: String,
    pub status: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionItem {
    pub priority: Priority,
    pub action: String,
    pub assign_to: String,
    pub due_date: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnusualClause {
    pub clause: String,
    pub description: String,
    pub reason: String,
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Insights {
    pub risk_flags: Vec<RiskFlag>,
    pub compliance_checklist: Vec<ComplianceItem>,
    pub action_items: Vec<ActionItem>,
    pub unusual_clauses: Vec<UnusualClause>,
    pub missing_elements: Vec<String>,
}

impl Insights {
    pub fn fallback() -> Self {
        Self::default()
    }
}

//! Keyword and pattern based analyzer.
//!
//! Works fully offline. Used when no model-backed analyzer is configured and
//! as the reference behaviour in tests.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;

use crate::error::AnalysisError;
use crate::model::{DetailLevel, InsightMode, OutputLanguage, ProcessingOptions};

use super::format;
use super::types::{
    ActionItem, Classification, ComplianceItem, ConfidenceLevel, ExtractedData, Insights,
    JurisdictionInfo, KeyDates, Milestone, MonetaryValues, Obligation, Party, Priority, RiskFlag,
    Summary, TranslatedContent,
};
use super::DocumentAnalyzer;

static RE_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\bbetween\s+([^,\n]+?)\s*,?\s+and\s+([^,.\n]+)").unwrap()
});
static RE_QUOTED_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“']([A-Za-z][A-Za-z ]{1,30})["”']"#).unwrap());
static RE_PAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").unwrap());
static RE_GSTIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][0-9A-Z]Z[0-9A-Z]\b").unwrap());
static RE_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static RE_DMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})\b").unwrap());
static RE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:₹|\brs\.?|\binr)\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});
static RE_INTEREST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)interest[^.\n]*?(\d+(?:\.\d+)?\s*%(?:\s*(?:per annum|p\.a\.))?)").unwrap()
});
static RE_COURT_CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcourts?\s+(?:at|in|of)\s+([A-Z][a-zA-Z]+)").unwrap()
});

/// Known document types with the keywords that identify them.
struct DocumentPattern {
    primary_type: &'static str,
    keywords: &'static [&'static str],
    applicable_laws: &'static [&'static str],
}

const PATTERNS: &[DocumentPattern] = &[
    DocumentPattern {
        primary_type: "Loan Agreement",
        keywords: &[
            "loan agreement",
            "borrower",
            "lender",
            "repayment",
            "emi",
            "principal amount",
            "interest rate",
        ],
        applicable_laws: &["Indian Contract Act, 1872", "SARFAESI Act, 2002"],
    },
    DocumentPattern {
        primary_type: "Sale Deed",
        keywords: &[
            "sale deed",
            "vendor",
            "vendee",
            "purchaser",
            "sale consideration",
            "conveyance",
            "sub-registrar",
        ],
        applicable_laws: &[
            "Transfer of Property Act, 1882",
            "Registration Act, 1908",
            "Indian Stamp Act, 1899",
        ],
    },
    DocumentPattern {
        primary_type: "Lease Agreement",
        keywords: &[
            "lease",
            "lessor",
            "lessee",
            "tenant",
            "landlord",
            "monthly rent",
            "leave and licence",
        ],
        applicable_laws: &["Transfer of Property Act, 1882", "Registration Act, 1908"],
    },
    DocumentPattern {
        primary_type: "Court Order",
        keywords: &[
            "in the court of",
            "judgment",
            "petitioner",
            "respondent",
            "hon'ble",
            "it is ordered",
            "decree",
        ],
        applicable_laws: &["Code of Civil Procedure, 1908"],
    },
    DocumentPattern {
        primary_type: "Legal Notice",
        keywords: &[
            "legal notice",
            "notice is hereby",
            "section 138",
            "negotiable instruments",
            "within 15 days",
            "failing which",
        ],
        applicable_laws: &["Negotiable Instruments Act, 1881", "Code of Civil Procedure, 1908"],
    },
    DocumentPattern {
        primary_type: "Employment Agreement",
        keywords: &[
            "employment",
            "employee",
            "employer",
            "salary",
            "probation",
            "notice period",
        ],
        applicable_laws: &["Indian Contract Act, 1872", "Industrial Disputes Act, 1947"],
    },
    DocumentPattern {
        primary_type: "Non-Disclosure Agreement",
        keywords: &[
            "non-disclosure",
            "confidential information",
            "disclosing party",
            "receiving party",
        ],
        applicable_laws: &["Indian Contract Act, 1872"],
    },
    DocumentPattern {
        primary_type: "Power of Attorney",
        keywords: &[
            "power of attorney",
            "attorney",
            "hereby appoint",
            "executant",
        ],
        applicable_laws: &["Powers of Attorney Act, 1882", "Registration Act, 1908"],
    },
];

/// Document types whose value hinges on monetary terms.
const FINANCIAL_TYPES: &[&str] = &["Loan Agreement", "Sale Deed", "Lease Agreement"];
/// Document types expected to state an end date.
const TERM_TYPES: &[&str] = &["Loan Agreement", "Lease Agreement", "Employment Agreement"];

#[derive(Debug, Default, Clone)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn classify_text(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        let mut scored: Vec<(&DocumentPattern, usize)> = PATTERNS
            .iter()
            .map(|p| {
                let hits = p.keywords.iter().filter(|k| lower.contains(*k)).count();
                (p, hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .collect();
        // Stable sort keeps table order among ties.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let Some((best, hits)) = scored.first().copied() else {
            return Classification::fallback();
        };

        let confidence = match hits {
            n if n >= 4 => ConfidenceLevel::High,
            2 | 3 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        };

        Classification {
            primary_type: best.primary_type.to_string(),
            sub_type: String::new(),
            confidence,
            alternative_types: scored
                .iter()
                .skip(1)
                .take(2)
                .map(|(p, _)| p.primary_type.to_string())
                .collect(),
            jurisdiction: "India".to_string(),
            applicable_laws: best.applicable_laws.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn extract(&self, text: &str, document_type: &str) -> ExtractedData {
        let mut data = ExtractedData {
            parties: extract_parties(text),
            dates: extract_dates(text),
            monetary_values: extract_money(text, document_type),
            jurisdiction: RE_COURT_CITY.captures(text).map(|c| JurisdictionInfo {
                court: None,
                state: None,
                city: Some(c[1].to_string()),
            }),
            ..Default::default()
        };

        let mut identifiers: Vec<String> = RE_GSTIN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        identifiers.extend(RE_PAN.find_iter(text).map(|m| m.as_str().to_string()));
        identifiers.dedup();
        if !identifiers.is_empty() {
            data.type_specific.insert(
                "identifiersFound".to_string(),
                serde_json::Value::from(identifiers),
            );
        }

        data
    }
}

fn party_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    const CORPORATE: &[&str] = &[
        "ltd", "limited", "llp", "pvt", "bank", "corporation", "company", "inc",
    ];
    const GOVERNMENT: &[&str] = &["government", "municipal", "state of", "union of india"];

    if GOVERNMENT.iter().any(|k| lower.contains(k)) {
        "Government"
    } else if CORPORATE.iter().any(|k| lower.contains(k)) {
        "Corporate"
    } else {
        "Individual"
    }
}

fn parse_party(raw: &str) -> Option<Party> {
    let role = RE_QUOTED_ROLE.captures(raw).map(|c| c[1].trim().to_string());
    let name = raw.split('(').next().unwrap_or(raw).trim();
    let name = name.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());
    if name.is_empty() {
        return None;
    }
    Some(Party {
        name: name.to_string(),
        role,
        party_type: Some(party_type(name).to_string()),
        ..Default::default()
    })
}

fn extract_parties(text: &str) -> Vec<Party> {
    let Some(caps) = RE_BETWEEN.captures(text) else {
        return Vec::new();
    };
    [&caps[1], &caps[2]]
        .into_iter()
        .filter_map(parse_party)
        .collect()
}

/// Every date in the text as `(line, YYYY-MM-DD)`, in order of appearance.
fn find_dates(text: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    for line in text.lines() {
        let mut on_line: Vec<(usize, String)> = Vec::new();
        for caps in RE_ISO_DATE.captures_iter(line) {
            let (y, m, d) = (&caps[1], &caps[2], &caps[3]);
            if let Some(date) = normalize_date(y, m, d) {
                on_line.push((caps.get(0).map_or(0, |found| found.start()), date));
            }
        }
        for caps in RE_DMY_DATE.captures_iter(line) {
            let (d, m, y) = (&caps[1], &caps[2], &caps[3]);
            if let Some(date) = normalize_date(y, m, d) {
                on_line.push((caps.get(0).map_or(0, |found| found.start()), date));
            }
        }
        on_line.sort_by_key(|(pos, _)| *pos);
        found.extend(on_line.into_iter().map(|(_, date)| (line.to_string(), date)));
    }
    found
}

fn normalize_date(year: &str, month: &str, day: &str) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn extract_dates(text: &str) -> KeyDates {
    let mut dates = KeyDates::default();
    let mut unlabelled = Vec::new();

    for (line, date) in find_dates(text) {
        let lower = line.to_lowercase();
        if dates.expiry_date.is_none()
            && ["expir", "valid till", "valid until", "terminate on", "ending on"]
                .iter()
                .any(|k| lower.contains(k))
        {
            dates.expiry_date = Some(date);
        } else if dates.effective_date.is_none()
            && ["effective", "commenc"].iter().any(|k| lower.contains(k))
        {
            dates.effective_date = Some(date);
        } else if dates.execution_date.is_none()
            && ["executed", "dated", "made on", "signed on", "entered into on"]
                .iter()
                .any(|k| lower.contains(k))
        {
            dates.execution_date = Some(date);
        } else {
            unlabelled.push(date);
        }
    }

    let mut unlabelled = unlabelled.into_iter();
    if dates.execution_date.is_none() {
        dates.execution_date = unlabelled.next();
    }
    dates.key_milestones = unlabelled
        .map(|date| Milestone {
            event: "Date referenced in document".to_string(),
            date,
        })
        .collect();

    dates
}

fn extract_money(text: &str, document_type: &str) -> MonetaryValues {
    let mut values = MonetaryValues::default();

    let amounts: Vec<f64> = RE_AMOUNT
        .captures_iter(text)
        .filter_map(|c| c[1].replace(',', "").parse::<f64>().ok())
        .collect();

    if let Some(first) = amounts.first().copied() {
        values.amount = Some(first);
        values.currency = Some("INR".to_string());
        let lower = text.to_lowercase();
        if document_type.contains("Loan") || lower.contains("loan amount") {
            values.loan_amount = Some(first);
        }
    }

    values.interest_rate = RE_INTEREST
        .captures(text)
        .map(|c| c[1].trim().to_string());

    values
}

fn summary_points(data: &ExtractedData) -> Vec<String> {
    let mut points = Vec::new();

    if !data.parties.is_empty() {
        let names: Vec<&str> = data.parties.iter().map(|p| p.name.as_str()).collect();
        points.push(format!("Parties: {}", names.join(", ")));
    }
    if let Some(amount) = data.monetary_values.headline_amount() {
        points.push(format!("Amount: ₹{}", format::format_amount_inr(amount)));
    }
    if let Some(rate) = &data.monetary_values.interest_rate {
        points.push(format!("Interest rate: {}", rate));
    }
    if let Some(date) = &data.dates.execution_date {
        points.push(format!("Executed on {}", format::format_date(date)));
    }
    if let Some(date) = &data.dates.effective_date {
        points.push(format!("Effective from {}", format::format_date(date)));
    }
    if let Some(date) = &data.dates.expiry_date {
        points.push(format!("Expires on {}", format::format_date(date)));
    }
    if let Some(city) = data.jurisdiction.as_ref().and_then(|j| j.city.as_ref()) {
        points.push(format!("Jurisdiction: courts at {}", city));
    }

    if points.is_empty() {
        points.push("No key terms could be identified".to_string());
    }
    points
}

fn missing_elements(data: &ExtractedData, document_type: &str) -> Vec<String> {
    let mut missing = Vec::new();
    if data.parties.is_empty() {
        missing.push("Party details".to_string());
    }
    if data.dates.execution_date.is_none() {
        missing.push("Execution date".to_string());
    }
    if FINANCIAL_TYPES.contains(&document_type) && !data.monetary_values.is_populated() {
        missing.push("Monetary terms".to_string());
    }
    if TERM_TYPES.contains(&document_type) && data.dates.expiry_date.is_none() {
        missing.push("Expiry date".to_string());
    }
    missing
}

#[async_trait]
impl DocumentAnalyzer for HeuristicAnalyzer {
    async fn classify(
        &self,
        text: &str,
        _options: &ProcessingOptions,
    ) -> Result<Classification, AnalysisError> {
        Ok(self.classify_text(text))
    }

    async fn extract_structured_data(
        &self,
        text: &str,
        document_type: &str,
        _options: &ProcessingOptions,
    ) -> Result<ExtractedData, AnalysisError> {
        Ok(self.extract(text, document_type))
    }

    async fn translate(
        &self,
        data: &ExtractedData,
        _language: OutputLanguage,
    ) -> Result<TranslatedContent, AnalysisError> {
        // No translation backend: every language gets the English headline.
        Ok(TranslatedContent::fallback(data))
    }

    async fn summarize(
        &self,
        data: &ExtractedData,
        detail: DetailLevel,
    ) -> Result<Summary, AnalysisError> {
        let short_summary = summary_points(data);
        let headline = format::headline(data);

        let detailed_summary = match detail {
            DetailLevel::Detailed => {
                let mut paragraph = format!("{}.", headline);
                for point in &short_summary {
                    paragraph.push(' ');
                    paragraph.push_str(point);
                    paragraph.push('.');
                }
                paragraph
            }
            DetailLevel::Short => String::new(),
        };

        let mut key_obligations = Vec::new();
        if data.parties.len() >= 2 {
            if let Some(amount) = data.monetary_values.loan_amount {
                key_obligations.push(Obligation {
                    party: data.parties[1].name.clone(),
                    obligation: format!("Repay ₹{}", format::format_amount_inr(amount)),
                    deadline: data.dates.expiry_date.clone(),
                });
            }
        }

        Ok(Summary {
            short_summary,
            detailed_summary,
            verdict: headline,
            key_obligations,
        })
    }

    async fn generate_insights(
        &self,
        data: &ExtractedData,
        document_type: &str,
        mode: InsightMode,
    ) -> Result<Insights, AnalysisError> {
        let missing = missing_elements(data, document_type);
        let mut insights = Insights {
            missing_elements: missing.clone(),
            ..Default::default()
        };

        if mode == InsightMode::PlainSummary {
            return Ok(insights);
        }

        insights.risk_flags = missing
            .iter()
            .map(|element| RiskFlag {
                severity: if element == "Party details" || element == "Monetary terms" {
                    Priority::High
                } else {
                    Priority::Medium
                },
                category: "Missing Information".to_string(),
                description: format!("{} not found in the document", element),
                recommendation: format!("Verify and record the {}", element.to_lowercase()),
                affected_clause: None,
            })
            .collect();

        for party in &data.parties {
            insights.compliance_checklist.push(ComplianceItem {
                item: format!("KYC verification for {}", party.name),
                status: "Required".to_string(),
                priority: Priority::High,
            });
        }
        if matches!(document_type, "Sale Deed" | "Lease Agreement") {
            insights.compliance_checklist.push(ComplianceItem {
                item: "Stamp duty payment and registration".to_string(),
                status: "Required".to_string(),
                priority: Priority::High,
            });
        }

        if mode == InsightMode::ActionItems {
            insights.action_items = insights
                .risk_flags
                .iter()
                .map(|flag| ActionItem {
                    priority: flag.severity,
                    action: flag.recommendation.clone(),
                    assign_to: String::new(),
                    due_date: String::new(),
                    status: "Pending".to_string(),
                })
                .collect();
            if let Some(expiry) = &data.dates.expiry_date {
                insights.action_items.push(ActionItem {
                    priority: Priority::Medium,
                    action: format!(
                        "Diary renewal or closure before {}",
                        format::format_date(expiry)
                    ),
                    assign_to: String::new(),
                    due_date: expiry.clone(),
                    status: "Pending".to_string(),
                });
            }
        }

        Ok(insights)
    }
}

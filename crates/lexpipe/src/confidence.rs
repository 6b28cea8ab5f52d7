//! Quality score over the outputs of a completed run.

use serde::{Deserialize, Serialize};

use crate::analysis::{Classification, ConfidenceLevel, ExtractedData, Insights};

const CLASSIFICATION_MAX: u32 = 30;
const EXTRACTION_MAX: u32 = 50;
const INSIGHTS_MAX: u32 = 20;
const TOTAL_MAX: u32 = CLASSIFICATION_MAX + EXTRACTION_MAX + INSIGHTS_MAX;

const TRANSLATION_SCORE: u8 = 90;
/// Insight output always carries a risk flag list, even an empty fallback
/// one, so this sub-score does not vary.
const INSIGHTS_SCORE: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub overall: ConfidenceLevel,
    pub classification: u8,
    pub extraction: u8,
    pub translation: u8,
    pub insights: u8,
    pub low_confidence_fields: Vec<String>,
}

/// Points earned per category, before bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub classification: u32,
    pub extraction: u32,
    pub insights: u32,
}

impl ScoreBreakdown {
    pub fn compute(
        classification: &Classification,
        data: &ExtractedData,
        insights: &Insights,
    ) -> Self {
        let classification_points = match classification.confidence {
            ConfidenceLevel::High => 30,
            ConfidenceLevel::Medium => 20,
            ConfidenceLevel::Low => 10,
        };

        let mut extraction_points = 0;
        if !data.parties.is_empty() {
            extraction_points += 20;
        }
        if data.dates.is_populated() {
            extraction_points += 15;
        }
        if data.monetary_values.is_populated() {
            extraction_points += 15;
        }

        let mut insight_points = 0;
        if !insights.risk_flags.is_empty() {
            insight_points += 10;
        }
        if !insights.action_items.is_empty() {
            insight_points += 10;
        }

        Self {
            classification: classification_points,
            extraction: extraction_points,
            insights: insight_points,
        }
    }

    pub fn total(&self) -> u32 {
        self.classification + self.extraction + self.insights
    }

    /// Overall percentage in `[0, 100]`.
    pub fn percentage(&self) -> u8 {
        percent(self.total(), TOTAL_MAX)
    }

    pub fn extraction_percentage(&self) -> u8 {
        percent(self.extraction, EXTRACTION_MAX)
    }

    pub fn overall(&self) -> ConfidenceLevel {
        match self.percentage() {
            85..=100 => ConfidenceLevel::High,
            60..=84 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

fn percent(points: u32, max: u32) -> u8 {
    let pct = (f64::from(points.min(max)) / f64::from(max) * 100.0).round();
    pct as u8
}

/// Scores a completed run. Pure and deterministic.
pub fn score(
    classification: &Classification,
    data: &ExtractedData,
    insights: &Insights,
) -> ConfidenceReport {
    let breakdown = ScoreBreakdown::compute(classification, data, insights);

    let classification_score = match classification.confidence {
        ConfidenceLevel::High => 95,
        ConfidenceLevel::Medium => 75,
        ConfidenceLevel::Low => 50,
    };

    ConfidenceReport {
        overall: breakdown.overall(),
        classification: classification_score,
        extraction: breakdown.extraction_percentage(),
        translation: TRANSLATION_SCORE,
        insights: INSIGHTS_SCORE,
        low_confidence_fields: Vec::new(),
    }
}

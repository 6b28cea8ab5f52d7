pub mod format;
pub mod heuristic;
pub mod types;

use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::model::{DetailLevel, InsightMode, OutputLanguage, ProcessingOptions};

pub use heuristic::HeuristicAnalyzer;
pub use types::{
    ActionItem, Classification, ComplianceItem, ConfidenceLevel, ExtractedData, Insights,
    JurisdictionInfo, KeyDates, LabeledDate, Milestone, MonetaryValues, Obligation, Party,
    Priority, RiskFlag, Summary, TranslatedContent, UnusualClause,
};

/// Analysis capabilities consumed by the processing pipeline.
///
/// Implementations may call out to a remote model; the pipeline bounds each
/// call with its stage timeout and applies the stage's failure policy to errors.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        options: &ProcessingOptions,
    ) -> Result<Classification, AnalysisError>;

    async fn extract_structured_data(
        &self,
        text: &str,
        document_type: &str,
        options: &ProcessingOptions,
    ) -> Result<ExtractedData, AnalysisError>;

    async fn translate(
        &self,
        data: &ExtractedData,
        language: OutputLanguage,
    ) -> Result<TranslatedContent, AnalysisError>;

    async fn summarize(
        &self,
        data: &ExtractedData,
        detail: DetailLevel,
    ) -> Result<Summary, AnalysisError>;

    async fn generate_insights(
        &self,
        data: &ExtractedData,
        document_type: &str,
        mode: InsightMode,
    ) -> Result<Insights, AnalysisError>;
}

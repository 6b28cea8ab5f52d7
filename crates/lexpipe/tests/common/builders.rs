//! Builders for test configurations and scripted collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use lexpipe::analysis::{
    ActionItem, Classification, ConfidenceLevel, DocumentAnalyzer, ExtractedData,
    HeuristicAnalyzer, Insights, KeyDates, MonetaryValues, Party, Priority, RiskFlag, Summary,
    TranslatedContent,
};
use lexpipe::config::Config;
use lexpipe::error::{AnalysisError, ExtractionError};
use lexpipe::extract::TextExtractor;
use lexpipe::model::{
    DetailLevel, DocumentFormat, InsightMode, OutputLanguage, ProcessingOptions,
};
use lexpipe::pipeline::{FailurePolicy, Stage};

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with one worker and no timeouts.
    pub fn new() -> Self {
        Self {
            config: Config {
                worker_count: 1,
                ..Config::default()
            },
        }
    }

    /// Point upload, temp and output directories below `root`.
    pub fn directories(mut self, root: &Path) -> Self {
        self.config.upload_directory = root.join("uploads").to_string_lossy().to_string();
        self.config.temp_directory = root.join("temp").to_string_lossy().to_string();
        self.config.output_directory = root.join("outputs").to_string_lossy().to_string();
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.config.stage_timeout_secs = Some(secs);
        self
    }

    pub fn run_deadline_secs(mut self, secs: u64) -> Self {
        self.config.run_deadline_secs = Some(secs);
        self
    }

    pub fn stage_policy(mut self, stage: Stage, policy: FailurePolicy) -> Self {
        self.config.stage_policies.insert(stage, policy);
        self
    }

    pub fn defaults(mut self, defaults: ProcessingOptions) -> Self {
        self.config.defaults = defaults;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ProcessingOptions`.
pub struct OptionsBuilder {
    options: ProcessingOptions,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: ProcessingOptions::default(),
        }
    }

    pub fn language(mut self, language: OutputLanguage) -> Self {
        self.options.output_language = language;
        self
    }

    pub fn detail(mut self, detail: DetailLevel) -> Self {
        self.options.detail_level = detail;
        self
    }

    pub fn insights(mut self, mode: InsightMode) -> Self {
        self.options.insight_mode = mode;
        self
    }

    pub fn build(self) -> ProcessingOptions {
        self.options
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What a scripted collaborator does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    /// Never returns. Only a timeout, deadline or cancellation ends the call.
    Hang,
}

async fn act(behavior: Behavior, stage: Stage) -> Result<(), AnalysisError> {
    match behavior {
        Behavior::Succeed => Ok(()),
        Behavior::Fail => Err(AnalysisError::Unavailable(format!(
            "scripted {} failure",
            stage.name()
        ))),
        Behavior::Hang => std::future::pending().await,
    }
}

/// Analyzer that delegates to the heuristic analyzer unless told otherwise.
///
/// Individual stages can be made to fail or hang, and any output can be
/// replaced with a canned value.
pub struct ScriptedAnalyzer {
    inner: HeuristicAnalyzer,
    behaviors: HashMap<Stage, Behavior>,
    classification: Option<Classification>,
    data: Option<ExtractedData>,
    insights: Option<Insights>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self {
            inner: HeuristicAnalyzer::new(),
            behaviors: HashMap::new(),
            classification: None,
            data: None,
            insights: None,
        }
    }

    pub fn failing(mut self, stage: Stage) -> Self {
        self.behaviors.insert(stage, Behavior::Fail);
        self
    }

    pub fn hanging(mut self, stage: Stage) -> Self {
        self.behaviors.insert(stage, Behavior::Hang);
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn data(mut self, data: ExtractedData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn insights(mut self, insights: Insights) -> Self {
        self.insights = Some(insights);
        self
    }

    fn behavior(&self, stage: Stage) -> Behavior {
        self.behaviors
            .get(&stage)
            .copied()
            .unwrap_or(Behavior::Succeed)
    }
}

impl Default for ScriptedAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentAnalyzer for ScriptedAnalyzer {
    async fn classify(
        &self,
        text: &str,
        options: &ProcessingOptions,
    ) -> Result<Classification, AnalysisError> {
        act(self.behavior(Stage::Classifying), Stage::Classifying).await?;
        match &self.classification {
            Some(classification) => Ok(classification.clone()),
            None => self.inner.classify(text, options).await,
        }
    }

    async fn extract_structured_data(
        &self,
        text: &str,
        document_type: &str,
        options: &ProcessingOptions,
    ) -> Result<ExtractedData, AnalysisError> {
        act(self.behavior(Stage::ExtractingData), Stage::ExtractingData).await?;
        match &self.data {
            Some(data) => Ok(data.clone()),
            None => {
                self.inner
                    .extract_structured_data(text, document_type, options)
                    .await
            }
        }
    }

    async fn translate(
        &self,
        data: &ExtractedData,
        language: OutputLanguage,
    ) -> Result<TranslatedContent, AnalysisError> {
        act(self.behavior(Stage::Translating), Stage::Translating).await?;
        self.inner.translate(data, language).await
    }

    async fn summarize(
        &self,
        data: &ExtractedData,
        detail: DetailLevel,
    ) -> Result<Summary, AnalysisError> {
        act(self.behavior(Stage::Summarizing), Stage::Summarizing).await?;
        self.inner.summarize(data, detail).await
    }

    async fn generate_insights(
        &self,
        data: &ExtractedData,
        document_type: &str,
        mode: InsightMode,
    ) -> Result<Insights, AnalysisError> {
        act(
            self.behavior(Stage::GeneratingInsights),
            Stage::GeneratingInsights,
        )
        .await?;
        match &self.insights {
            Some(insights) => Ok(insights.clone()),
            None => self.inner.generate_insights(data, document_type, mode).await,
        }
    }
}

/// Extractor returning fixed text, optionally failing the first few calls.
pub struct ScriptedExtractor {
    text: String,
    failures_left: AtomicU32,
}

impl ScriptedExtractor {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failures_left: AtomicU32::new(0),
        }
    }

    /// Fail the first `count` calls with an extraction error.
    pub fn failing_first(self, count: u32) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl TextExtractor for ScriptedExtractor {
    async fn extract_text(
        &self,
        _path: &Path,
        _format: DocumentFormat,
    ) -> Result<String, ExtractionError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ExtractionError::PdfProcessing(
                "scripted extraction failure".to_string(),
            ));
        }
        Ok(self.text.clone())
    }
}

/// Analyzer outputs that satisfy every scoring rule.
pub fn high_confidence_analyzer() -> ScriptedAnalyzer {
    ScriptedAnalyzer::new()
        .classification(Classification {
            primary_type: "Loan Agreement".to_string(),
            sub_type: "Personal Loan".to_string(),
            confidence: ConfidenceLevel::High,
            alternative_types: vec![],
            jurisdiction: "India".to_string(),
            applicable_laws: vec!["Indian Contract Act, 1872".to_string()],
        })
        .data(ExtractedData {
            parties: vec![Party::named("Asha Rao"), Party::named("Vikram Shah")],
            dates: KeyDates {
                execution_date: Some("2024-03-01".to_string()),
                ..KeyDates::default()
            },
            monetary_values: MonetaryValues {
                loan_amount: Some(500000.0),
                currency: Some("INR".to_string()),
                ..MonetaryValues::default()
            },
            ..ExtractedData::default()
        })
        .insights(Insights {
            risk_flags: vec![RiskFlag {
                severity: Priority::High,
                category: "Interest".to_string(),
                description: "Interest rate not stated".to_string(),
                recommendation: "Specify the rate".to_string(),
                affected_clause: None,
            }],
            action_items: vec![ActionItem {
                priority: Priority::Medium,
                action: "Register the agreement".to_string(),
                assign_to: "Borrower".to_string(),
                due_date: "2024-04-01".to_string(),
                status: "Pending".to_string(),
            }],
            ..Insights::default()
        })
}

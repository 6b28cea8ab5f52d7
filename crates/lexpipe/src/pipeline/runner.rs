use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::analysis::{
    Classification, DocumentAnalyzer, ExtractedData, Insights, Summary, TranslatedContent,
};
use crate::confidence;
use crate::error::{AnalysisError, ExtractionError};
use crate::extract::TextExtractor;
use crate::model::{ProcessingResult, ProcessingStatus, StageFailure};
use crate::sanitize;
use crate::storage::ResultArchive;
use crate::worker::job::JobOutcome;

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::stage::{FailurePolicy, Stage};

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    extractor: Arc<dyn TextExtractor>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    archive: Arc<ResultArchive>,
}

impl Pipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        archive: Arc<ResultArchive>,
    ) -> Self {
        Self {
            config,
            extractor,
            analyzer,
            archive,
        }
    }

    /// Run the full pipeline for a single document.
    ///
    /// Never returns an error: fatal failures are reported through `progress`
    /// and summarized in the returned [`JobOutcome`].
    pub async fn run(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> (JobOutcome, PipelineContext) {
        let filename = match ctx.job.source_path() {
            Some(path) => sanitize::redact_path(path),
            None => sanitize::base_file_name(&ctx.job.file.file_name).to_string(),
        };
        let span = info_span!("pipeline",
            process_id = %ctx.job.process_id,
            attempt = ctx.job.attempt,
            filename = %filename,
        );

        let started = Instant::now();
        let cancel = ctx.job.cancel.clone();
        let deadline = self.config.run_deadline;

        let outcome = async {
            let stages = self.run_stages(&mut ctx, progress, started);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(PipelineError::Cancelled),
                res = within_deadline(deadline, stages) => res,
            }
        }
        .instrument(span.clone())
        .await;

        match outcome {
            Ok((result, artifact_path)) => {
                self.finish(ctx, progress, result, artifact_path)
                    .instrument(span)
                    .await
            }
            Err(e) => {
                let _entered = span.enter();
                let err_msg = e.to_string();
                warn!("Processing failed: {}", err_msg);
                progress.report(ProgressEvent::Failed {
                    error: err_msg.clone(),
                });
                (JobOutcome::failure(&ctx.job, err_msg), ctx)
            }
        }
    }

    /// Records a finished result. If the record has been cancelled or
    /// re-armed in the meantime, the artifact is removed again.
    async fn finish(
        &self,
        mut ctx: PipelineContext,
        progress: &dyn ProgressReporter,
        result: ProcessingResult,
        artifact_path: PathBuf,
    ) -> (JobOutcome, PipelineContext) {
        let recorded = progress.report(ProgressEvent::Completed {
            result: Box::new(result.clone()),
        });
        if !recorded {
            warn!(result_id = %result.id, "Record moved on, discarding result");
            if let Err(e) = self.archive.discard(&artifact_path).await {
                warn!("{}", e);
            }
            let err = PipelineError::Superseded {
                attempt: ctx.job.attempt,
            };
            return (JobOutcome::failure(&ctx.job, err.to_string()), ctx);
        }

        info!(
            result_id = %result.id,
            duration_secs = result.processing_duration,
            absorbed = result.processing_errors.len(),
            "Processing completed"
        );
        let job_outcome = JobOutcome::success(&ctx.job, result.id.clone(), artifact_path.clone());
        ctx.result = Some(result);
        ctx.artifact_path = Some(artifact_path);
        (job_outcome, ctx)
    }

    async fn run_stages(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
        started: Instant,
    ) -> Result<(ProcessingResult, PathBuf), PipelineError> {
        let options = ctx.job.options;

        // Step 1: Extract text
        progress.report(ProgressEvent::Stage(Stage::ExtractingText));
        let text = self
            .step_extract_text(ctx)
            .instrument(info_span!("extract_text"))
            .await?;

        // Step 2: Classify
        progress.report(ProgressEvent::Stage(Stage::Classifying));
        let classification = self
            .call_stage(
                ctx,
                Stage::Classifying,
                self.analyzer.classify(&text, &options),
                Classification::fallback,
            )
            .instrument(info_span!("classify"))
            .await?;
        debug!(
            "Classified as {} ({:?})",
            classification.primary_type, classification.confidence
        );

        // Step 3: Extract structured data
        progress.report(ProgressEvent::Stage(Stage::ExtractingData));
        let data = self
            .call_stage(
                ctx,
                Stage::ExtractingData,
                self.analyzer
                    .extract_structured_data(&text, &classification.primary_type, &options),
                ExtractedData::fallback,
            )
            .instrument(info_span!("extract_data"))
            .await?;

        // Step 4: Translate
        progress.report(ProgressEvent::Stage(Stage::Translating));
        let translated = self
            .call_stage(
                ctx,
                Stage::Translating,
                self.analyzer.translate(&data, options.output_language),
                || TranslatedContent::fallback(&data),
            )
            .instrument(info_span!("translate"))
            .await?;

        // Step 5: Summarize
        progress.report(ProgressEvent::Stage(Stage::Summarizing));
        let summary = self
            .call_stage(
                ctx,
                Stage::Summarizing,
                self.analyzer.summarize(&data, options.detail_level),
                Summary::fallback,
            )
            .instrument(info_span!("summarize"))
            .await?;

        // Step 6: Insights
        progress.report(ProgressEvent::Stage(Stage::GeneratingInsights));
        let insights = self
            .call_stage(
                ctx,
                Stage::GeneratingInsights,
                self.analyzer.generate_insights(
                    &data,
                    &classification.primary_type,
                    options.insight_mode,
                ),
                Insights::fallback,
            )
            .instrument(info_span!("generate_insights"))
            .await?;

        // Step 7: Score, assemble and persist
        let confidence = confidence::score(&classification, &data, &insights);
        let file = &ctx.job.file;
        let mut result = ProcessingResult {
            id: String::new(),
            file_name: file.file_name.clone(),
            file_type: file.file_type.clone(),
            file_size: file.size_label.clone(),
            processing_status: ProcessingStatus::Completed,
            processing_progress: Stage::Completed.progress(),
            processing_duration: started.elapsed().as_secs(),
            processing_options: options,
            document_classification: classification,
            extracted_data: data,
            translated_content: translated,
            summary,
            insights,
            confidence,
            processing_errors: ctx.stage_failures.clone(),
            created_date: Utc::now(),
        };

        if ctx.job.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let artifact_path = self
            .archive
            .persist(&mut result)
            .instrument(info_span!("persist"))
            .await?;
        debug!(
            "Stored result {} at {}",
            result.id,
            sanitize::redact_path(&artifact_path)
        );

        Ok((result, artifact_path))
    }

    async fn step_extract_text(&self, ctx: &mut PipelineContext) -> Result<String, PipelineError> {
        let path = ctx
            .job
            .source_path()
            .ok_or_else(|| PipelineError::MissingSource(ctx.job.file.file_name.clone()))?
            .to_path_buf();
        let format = ctx
            .job
            .file
            .format()
            .ok_or_else(|| ExtractionError::UnsupportedFormat(ctx.job.file.file_type.clone()))?;

        let call = self.extractor.extract_text(&path, format);
        let text = match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                PipelineError::StageTimeout {
                    stage: Stage::ExtractingText,
                    secs: limit.as_secs(),
                }
            })??,
            None => call.await?,
        };

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyText.into());
        }

        ctx.text_chars = text.chars().count();
        debug!("Extracted {} characters", ctx.text_chars);
        Ok(text)
    }

    /// Runs one analysis call under the stage timeout, then applies the
    /// stage's failure policy to an error or timeout.
    async fn call_stage<T, F>(
        &self,
        ctx: &mut PipelineContext,
        stage: Stage,
        call: F,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, AnalysisError>>,
    {
        let attempt = match self.config.stage_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(res) => res.map_err(|source| PipelineError::Analysis { stage, source }),
                Err(_) => Err(PipelineError::StageTimeout {
                    stage,
                    secs: limit.as_secs(),
                }),
            },
            None => call
                .await
                .map_err(|source| PipelineError::Analysis { stage, source }),
        };

        match attempt {
            Ok(value) => Ok(value),
            Err(e) => match self.config.policies.policy(stage) {
                FailurePolicy::Fatal => Err(e),
                FailurePolicy::Absorb => {
                    warn!("{}, using fallback", e);
                    ctx.stage_failures.push(StageFailure {
                        stage,
                        message: e.to_string(),
                    });
                    Ok(fallback())
                }
            },
        }
    }
}

async fn within_deadline<T>(
    deadline: Option<Duration>,
    run: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or_else(|_| {
                Err(PipelineError::DeadlineExceeded {
                    secs: limit.as_secs(),
                })
            }),
        None => run.await,
    }
}

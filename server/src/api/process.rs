//! Handlers that start processing runs and report on them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lexpipe::model::{
    OptionsRequest, ProcessingRecord, ProcessingResult, ProcessingStatus, UploadedFile,
};

use super::{ApiError, ApiResponse, AppState};

/// Body accepted by both process endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub file_id: Option<String>,
    /// Metadata returned by the single upload endpoint.
    #[serde(default)]
    pub file: Option<UploadedFile>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub options: Option<OptionsRequest>,
}

impl ProcessRequest {
    fn from_body(body: Result<Json<Self>, JsonRejection>) -> Result<Self, ApiError> {
        let Json(request) = body?;
        if request.file_id.is_none() && request.batch_id.is_none() {
            return Err(ApiError::BadRequest(
                "Either fileId or batchId is required".to_string(),
            ));
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStarted {
    pub process_id: String,
    pub status: ProcessingStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStarted {
    pub batch_id: String,
    pub total_processing: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRef {
    pub process_id: String,
}

/// `POST /api/process/document`
pub async fn document(
    State(state): State<AppState>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProcessStarted>>), ApiError> {
    let request = ProcessRequest::from_body(body)?;
    let options = state.service.resolve_options(request.options.as_ref())?;

    let mut file = request.file.ok_or_else(|| {
        ApiError::BadRequest("File metadata is required to process a document".to_string())
    })?;
    if let Some(file_id) = request.file_id {
        file.id = file_id;
    }

    let process_id = state.service.process_document(file, options).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(ProcessStarted {
            process_id,
            status: ProcessingStatus::Processing,
        })),
    ))
}

/// `POST /api/process/batch`
pub async fn batch(
    State(state): State<AppState>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BatchStarted>>, ApiError> {
    let request = ProcessRequest::from_body(body)?;
    let options = state.service.resolve_options(request.options.as_ref())?;

    let batch_id = request
        .batch_id
        .ok_or_else(|| ApiError::BadRequest("batchId is required".to_string()))?;
    let total_processing = state.service.process_batch(&batch_id, options)?;

    Ok(Json(ApiResponse::ok(BatchStarted {
        batch_id,
        total_processing,
    })))
}

/// `GET /api/process/status/:process_id`
pub async fn status(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Result<Json<ApiResponse<ProcessingRecord>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.service.status(&process_id)?)))
}

/// `GET /api/process/result/:process_id`
pub async fn result(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Result<Json<ApiResponse<ProcessingResult>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.service.result(&process_id)?)))
}

/// `POST /api/process/retry/:process_id`
pub async fn retry(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Result<Json<ApiResponse<ProcessRef>>, ApiError> {
    let record = state.service.retry(&process_id)?;
    Ok(Json(ApiResponse::ok(ProcessRef {
        process_id: record.process_id,
    })))
}

/// `POST /api/process/cancel/:process_id`
pub async fn cancel(
    State(state): State<AppState>,
    Path(process_id): Path<String>,
) -> Result<Json<ApiResponse<ProcessRef>>, ApiError> {
    let record = state.service.cancel(&process_id)?;
    Ok(Json(ApiResponse::ok(ProcessRef {
        process_id: record.process_id,
    })))
}

//! Multipart upload handlers.
//!
//! These are the upstream filter in front of the intake: only the expected
//! extensions and content types get through, and sizes are capped per route.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use tracing::info;

use lexpipe::model::{extension_of, format_file_size, Batch, DocumentFormat, UploadedFile};

use super::{ApiError, ApiResponse, AppState};

const FILE_FIELD: &str = "file";

const ZIP_CONTENT_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/octet-stream",
];

/// A file part pulled out of a multipart body.
struct FilePart {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(FilePart {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

fn check_size(part: &FilePart, limit: usize) -> Result<(), ApiError> {
    if part.bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }
    if part.bytes.len() > limit {
        return Err(ApiError::BadRequest(format!(
            "File too large. Maximum size is {}",
            format_file_size(limit as u64)
        )));
    }
    Ok(())
}

/// `POST /api/upload/single`
pub async fn single(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadedFile>>, ApiError> {
    let part = read_file_part(&mut multipart).await?;

    let extension = extension_of(&part.file_name);
    let format = DocumentFormat::from_extension(&extension);
    let mime_ok = match (format, part.content_type.as_deref()) {
        (Some(format), Some(declared)) => format.accepts_mime(declared),
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !mime_ok {
        return Err(ApiError::BadRequest(format!(
            "Invalid file type. Allowed: PDF, DOCX, DOC, TXT. Received: .{}",
            extension
        )));
    }
    check_size(&part, state.limits.max_file_bytes)?;

    let file = state
        .service
        .upload_single(&part.file_name, &part.bytes)
        .await?;
    info!(file_id = %file.id, size = %file.size_label, "File uploaded");

    Ok(Json(ApiResponse::ok(file)))
}

/// `POST /api/upload/zip`
pub async fn zip(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Batch>>, ApiError> {
    let part = read_file_part(&mut multipart).await?;

    let mime_ok = part
        .content_type
        .as_deref()
        .map(|declared| {
            let essence = declared.split(';').next().unwrap_or("").trim().to_lowercase();
            ZIP_CONTENT_TYPES.contains(&essence.as_str())
        })
        .unwrap_or(true);
    if extension_of(&part.file_name) != "zip" || !mime_ok {
        return Err(ApiError::BadRequest(
            "Invalid file type. Only ZIP files are allowed.".to_string(),
        ));
    }
    check_size(&part, state.limits.max_zip_bytes)?;

    let batch = state
        .service
        .upload_archive(&part.file_name, part.bytes.to_vec())
        .await?;
    info!(
        batch_id = %batch.batch_id,
        total = batch.total_files,
        supported = batch.supported_files,
        unsupported = batch.unsupported_files,
        "ZIP file extracted"
    );

    Ok(Json(ApiResponse::ok(batch)))
}

/// `GET /api/upload/status/:batch_id`
pub async fn status(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Json<ApiResponse<Batch>>, ApiError> {
    Ok(Json(ApiResponse::ok(state.service.batch(&batch_id)?)))
}

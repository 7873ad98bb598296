//! Job submission and status endpoints

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{JobStatusView, SubmitResponse};

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

/// POST /upload - Accept a file for asynchronous processing
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let mut multipart = multipart
        .map_err(|e| Error::invalid_input(format!("expected multipart/form-data: {}", e)))?;

    let (filename, data) = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| Error::invalid_input("file is required"))?;

    tracing::info!("Received file: {} ({} bytes)", filename, data.len());

    let submission = state.coordinator().submit(&filename, &data).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse::accepted(submission.job_id, submission.status)),
    ))
}

/// First `file` field of the form, other fields are ignored
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload.bin".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;

        return Ok(Some((filename, data)));
    }

    Ok(None)
}

/// Body-limit overruns surface as 413, everything else as a bad request
fn multipart_error(context: &str, err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(err.body_text())
    } else {
        Error::invalid_input(format!("{}: {}", context, err.body_text()))
    }
}

/// GET /status/:job_id - Current status of a job
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusView>> {
    let view = state.status_query().query(&job_id).await?;
    Ok(Json(view))
}

//! Upload and download endpoints.
//!
//! DESIGN
//! ======
//! `POST /upload/{desk}/{group_id}` streams each multipart file field to
//! `<upload_dir>/<desk>/<uuid>` chunk by chunk. Progress counts raw request
//! body bytes (boundaries and part headers included) against the request
//! `Content-Length`, so a finished upload reports exactly 100%. The upload
//! service throttles those counts into desk-wide `progress` events. A
//! completed field is handed over as a new file record.
//!
//! A field that fails mid-stream, or whose record cannot be created, has its
//! partial body removed from disk.
//!
//! `GET /download/{desk}/{file_id}` streams the stored bytes as an
//! attachment. The desk segment only keeps URLs readable; lookup is by id.

use std::path::Path as FsPath;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::services::progress::UploadTransfer;
use crate::services::storage::{NewFile, StorageError};
use crate::services::upload;
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("not a multipart upload: {0}")]
    Rejected(#[from] MultipartRejection),
    #[error("malformed upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("upload write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match &self {
            Self::Rejected(e) => {
                warn!(error = %e, "upload rejected");
                (e.status(), self.to_string()).into_response()
            }
            Self::Multipart(e) => {
                warn!(error = %e, "upload rejected");
                (e.status(), self.to_string()).into_response()
            }
            Self::Io(e) => {
                error!(error = %e, "upload failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "upload failed").into_response()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("file not found: {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("file body unreadable: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::Storage(e) => {
                error!(error = %e, "download lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Io(e) => {
                warn!(error = %e, "download body missing");
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

pub async fn upload(
    State(state): State<AppState>,
    Path((desk, group_id)): Path<(String, String)>,
    request: Request,
) -> Result<String, UploadError> {
    let bytes_expected = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let (received, mut multipart) = counted_multipart(request, &state).await?;

    let dir = upload::desk_dir(&state.config.upload_dir, &desk);
    tokio::fs::create_dir_all(&dir).await?;

    let mut transfer = UploadTransfer::new(group_id.clone(), bytes_expected);
    let mut names = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            // Plain form field: its bytes count, nothing is kept.
            while field.chunk().await?.is_some() {
                upload::report_progress(&state, &desk, &mut transfer, received.load(Ordering::Relaxed)).await;
            }
            continue;
        };
        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_owned();

        let path = dir.join(Uuid::new_v4().to_string());
        if let Err(e) = store_field(&state, &desk, &mut transfer, &received, &mut field, &path).await {
            discard(&path).await;
            return Err(e);
        }
        upload::report_progress(&state, &desk, &mut transfer, received.load(Ordering::Relaxed)).await;

        let file = NewFile {
            name: file_name,
            storage_location: path.to_string_lossy().into_owned(),
            content_type,
            group_id: group_id.clone(),
        };
        match upload::file_received(&state, &desk, file).await {
            Some(record) => names.push(record.name),
            None => discard(&path).await,
        }
    }

    // The closing boundary ends the body; an epilogue the parser never
    // pulled still counts as received.
    let total = received.load(Ordering::Relaxed).max(bytes_expected);
    upload::report_progress(&state, &desk, &mut transfer, total).await;

    info!(%desk, %group_id, files = names.len(), bytes = transfer.bytes_received, "upload complete");
    Ok(format!("received upload: {}\n", names.join(", ")))
}

/// Parse the request as multipart while counting every raw body byte the
/// parser pulls.
async fn counted_multipart(request: Request, state: &AppState) -> Result<(Arc<AtomicU64>, Multipart), UploadError> {
    let received = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&received);

    let (parts, body) = request.into_parts();
    let counted = body.into_data_stream().inspect(move |frame| {
        if let Ok(bytes) = frame {
            counter.fetch_add(bytes.len() as u64, Ordering::Relaxed);
        }
    });
    let request = Request::from_parts(parts, Body::from_stream(counted));
    let multipart = Multipart::from_request(request, state).await?;
    Ok((received, multipart))
}

async fn store_field(
    state: &AppState,
    desk: &str,
    transfer: &mut UploadTransfer,
    received: &AtomicU64,
    field: &mut Field<'_>,
    path: &FsPath,
) -> Result<(), UploadError> {
    let mut out = tokio::fs::File::create(path).await?;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk).await?;
        upload::report_progress(state, desk, transfer, received.load(Ordering::Relaxed)).await;
    }
    out.flush().await?;
    Ok(())
}

async fn discard(path: &FsPath) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(error = %e, path = %path.display(), "could not remove discarded upload body");
    }
}

// =============================================================================
// DOWNLOAD
// =============================================================================

pub async fn download(
    State(state): State<AppState>,
    Path((_desk, file_id)): Path<(String, Uuid)>,
) -> Result<Response, DownloadError> {
    let record = state
        .storage
        .get_file(file_id)
        .await?
        .ok_or(DownloadError::NotFound(file_id))?;
    let file = tokio::fs::File::open(&record.storage_location).await?;
    let length = file.metadata().await?.len();
    let body = Body::from_stream(ReaderStream::new(file));

    let disposition = format!("attachment; filename=\"{}\"", header_safe(&record.name));
    Ok((
        [
            (CONTENT_TYPE, record.content_type),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, length.to_string()),
        ],
        body,
    )
        .into_response())
}

/// Header values must be visible ASCII; anything else, and characters that
/// would end the quoted parameter, become `_`.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "files_test.rs"]
mod tests;

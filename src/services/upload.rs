//! Upload service — progress fan-out and file registration.
//!
//! DESIGN
//! ======
//! The HTTP upload route owns the transport: it streams multipart fields to
//! disk and reports its running raw byte count here. This module throttles those chunks
//! into `progress` events for the desk and, when a file is complete,
//! records it and announces it with `createFile`.
//!
//! ERROR HANDLING
//! ==============
//! A failed `create_file` is logged and the announcement is skipped, so
//! desk clients never see a file that has no record.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::frame::Envelope;
use crate::services::progress::UploadTransfer;
use crate::services::storage::{FileRecord, NewFile};
use crate::state::AppState;

/// Record `bytes_received` so far and broadcast progress when it crosses a
/// whole percent. Returns whether an event went out.
pub async fn report_progress(state: &AppState, desk: &str, transfer: &mut UploadTransfer, bytes_received: u64) -> bool {
    let Some(event) = transfer.record(bytes_received) else {
        return false;
    };
    debug!(%desk, group_id = %transfer.group_id, percent = event.percent, "upload progress");
    let envelope = Envelope::progress(&transfer.group_id, event.bytes_received, event.bytes_expected);
    state.channel.broadcast_room(desk, &envelope).await;
    true
}

/// Persist a completed file and announce it to the desk.
pub async fn file_received(state: &AppState, desk: &str, file: NewFile) -> Option<FileRecord> {
    let group_id = file.group_id.clone();
    match state.storage.create_file(desk, file).await {
        Ok(record) => {
            info!(%desk, file_id = %record.id, name = %record.name, %group_id, "file received");
            state
                .channel
                .broadcast_room(desk, &Envelope::create_file(&group_id, &record))
                .await;
            Some(record)
        }
        Err(e) => {
            error!(error = %e, %desk, %group_id, "create file failed");
            None
        }
    }
}

/// Directory for a desk's uploads. Desk names are free-form, so anything
/// outside `[A-Za-z0-9_-]` is replaced to keep the path inside `root`.
#[must_use]
pub fn desk_dir(root: &Path, desk: &str) -> PathBuf {
    let safe: String = desk
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if safe.is_empty() {
        return root.join("_");
    }
    root.join(safe)
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;

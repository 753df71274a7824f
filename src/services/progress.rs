//! Upload progress throttle.
//!
//! Turns a stream of byte counts into at most one event per whole percent,
//! strictly increasing and capped at 100.

/// One emitted progress step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
    pub bytes_received: u64,
    pub bytes_expected: u64,
}

/// Throttle state for one upload transfer.
#[derive(Debug, Clone)]
pub struct UploadTransfer {
    pub group_id: String,
    pub bytes_expected: u64,
    pub bytes_received: u64,
    last_reported_percent: u8,
}

impl UploadTransfer {
    #[must_use]
    pub fn new(group_id: impl Into<String>, bytes_expected: u64) -> Self {
        Self { group_id: group_id.into(), bytes_expected, bytes_received: 0, last_reported_percent: 0 }
    }

    #[cfg(test)]
    #[must_use]
    pub fn last_reported_percent(&self) -> u8 {
        self.last_reported_percent
    }

    /// Record the running byte count. Emits only when the whole percentage
    /// rises above the last one emitted.
    pub fn record(&mut self, bytes_received: u64) -> Option<ProgressEvent> {
        self.bytes_received = bytes_received;
        let bytes_expected = self.bytes_expected;

        let percent = percent_of(bytes_received, bytes_expected)?;
        if percent <= self.last_reported_percent {
            return None;
        }
        self.last_reported_percent = percent;
        Some(ProgressEvent { percent, bytes_received, bytes_expected })
    }
}

/// `floor(received / expected * 100)`, clamped to 100. `None` when nothing
/// is expected.
fn percent_of(received: u64, expected: u64) -> Option<u8> {
    if expected == 0 {
        return None;
    }
    let percent = (u128::from(received) * 100 / u128::from(expected)).min(100);
    u8::try_from(percent).ok()
}

#[cfg(test)]
#[path = "progress_test.rs"]
mod tests;

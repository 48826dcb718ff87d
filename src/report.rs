//! Per-session decode report.
//!
//! The report is append-only while its session is open and frozen once the
//! session closes. Only the session can write to it.

use crate::error::ErrorKind;
use serde::Serialize;
use std::ops::Range;

/// Result of decoding one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkStatus {
    Ok { plaintext_len: usize },
    Failed { kind: ErrorKind },
}

/// One entry per chunk whose framing was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkOutcome {
    pub index: u64,
    /// Byte range of the whole chunk, header included.
    pub range: Range<usize>,
    #[serde(flatten)]
    pub status: ChunkStatus,
}

impl ChunkOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ChunkStatus::Ok { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.status {
            ChunkStatus::Ok { .. } => None,
            ChunkStatus::Failed { kind } => Some(kind),
        }
    }
}

/// Where framing broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamFault {
    pub offset: usize,
    pub kind: ErrorKind,
}

/// Why the session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Every byte of the stream was consumed.
    Exhausted,
    /// A structural error made the remaining bytes unreadable.
    StreamCorrupted,
    /// A chunk failed and the session was configured to stop on it.
    StoppedOnError,
    /// The caller closed the session early.
    Cancelled,
}

/// Aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReportSummary {
    pub total_chunks: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub plaintext_bytes: u64,
    pub bytes_consumed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecryptReport {
    outcomes: Vec<ChunkOutcome>,
    summary: ReportSummary,
    stream_fault: Option<StreamFault>,
    close_reason: Option<CloseReason>,
    frozen: bool,
}

impl DecryptReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, outcome: ChunkOutcome) {
        if self.frozen {
            return;
        }
        self.summary.total_chunks += 1;
        self.summary.bytes_consumed += outcome.range.len() as u64;
        match outcome.status {
            ChunkStatus::Ok { plaintext_len } => {
                self.summary.succeeded += 1;
                self.summary.plaintext_bytes += plaintext_len as u64;
            }
            ChunkStatus::Failed { .. } => self.summary.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub(crate) fn record_fault(&mut self, fault: StreamFault) {
        if !self.frozen {
            self.stream_fault = Some(fault);
        }
    }

    /// Freeze with `reason`. Later calls keep the first reason.
    pub(crate) fn freeze(&mut self, reason: CloseReason) {
        if !self.frozen {
            self.close_reason = Some(reason);
            self.frozen = true;
        }
    }

    pub fn total_chunks(&self) -> u64 {
        self.summary.total_chunks
    }

    pub fn succeeded(&self) -> u64 {
        self.summary.succeeded
    }

    pub fn failed(&self) -> u64 {
        self.summary.failed
    }

    pub fn plaintext_bytes(&self) -> u64 {
        self.summary.plaintext_bytes
    }

    /// Sum of every recorded chunk's encoded length.
    pub fn bytes_consumed(&self) -> u64 {
        self.summary.bytes_consumed
    }

    pub fn summary(&self) -> ReportSummary {
        self.summary
    }

    /// Outcomes in stream order.
    pub fn outcomes(&self) -> &[ChunkOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, index: u64) -> Option<&ChunkOutcome> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.outcomes.get(i))
    }

    pub fn stream_fault(&self) -> Option<StreamFault> {
        self.stream_fault
    }

    /// `None` while the session is still open.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Every chunk decoded and nothing was left unread.
    pub fn is_clean(&self) -> bool {
        self.summary.failed == 0
            && self.stream_fault.is_none()
            && self.close_reason == Some(CloseReason::Exhausted)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

/// Top-level error type for all Folio operations.
///
/// Per-image failures (`Decode`, `Enhancement`) are absorbed by the batch
/// orchestrator; only `BudgetExceeded` and `ProcessingAborted` are meant to
/// reach the user as batch-level outcomes.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Per-image errors --
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("image enhancement failed: {0}")]
    Enhancement(String),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("file {name} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    // -- Batch errors --
    #[error("not enough resources to process this batch: {reason}")]
    BudgetExceeded { reason: String },

    #[error("processing aborted after {completed} of {total} images: {reason}")]
    ProcessingAborted {
        reason: String,
        completed: usize,
        total: usize,
    },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// Whether this error only affects a single image (the caller keeps the
    /// original bytes and carries on).
    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Enhancement(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_item_classification() {
        assert!(FolioError::Decode("bad header".into()).is_per_item());
        assert!(FolioError::Enhancement("short buffer".into()).is_per_item());
        assert!(
            !FolioError::BudgetExceeded {
                reason: "too many".into()
            }
            .is_per_item()
        );
        assert!(
            !FolioError::ProcessingAborted {
                reason: "memory".into(),
                completed: 2,
                total: 10,
            }
            .is_per_item()
        );
    }

    #[test]
    fn aborted_message_reports_progress() {
        let err = FolioError::ProcessingAborted {
            reason: "memory pressure".into(),
            completed: 3,
            total: 10,
        };
        assert_eq!(
            err.to_string(),
            "processing aborted after 3 of 10 images: memory pressure"
        );
    }
}

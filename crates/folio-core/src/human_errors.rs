// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion and
// a safe fallback. The severity drives how the message is presented.

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Affected one image; the original was kept.
    Degraded,
    /// User must do something (pick fewer images, close other apps).
    ActionRequired,
    /// Cannot be fixed by retrying: wrong file type, broken file.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again may work.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::Decode(_) => HumanError {
            message: "One of your images couldn't be read.".into(),
            suggestion: "It will be added as-is. If it looks wrong in the PDF, open it in a photo app and save it again.".into(),
            retriable: false,
            severity: Severity::Degraded,
        },

        FolioError::Enhancement(_) => HumanError {
            message: "We couldn't sharpen one of your images.".into(),
            suggestion: "The original image was used instead.".into(),
            retriable: true,
            severity: Severity::Degraded,
        },

        FolioError::UnsupportedFormat(detail) => HumanError {
            message: "This type of image isn't supported.".into(),
            suggestion: format!(
                "Use JPEG, PNG, GIF, or WEBP images. (File: {detail})"
            ),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::FileTooLarge { name, limit, .. } => HumanError {
            message: format!("\"{name}\" is too large."),
            suggestion: format!(
                "Pick images smaller than {} MB, or shrink this one first.",
                limit / (1024 * 1024)
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::BudgetExceeded { .. } => HumanError {
            message: "This device doesn't have enough room to process all of these images at once.".into(),
            suggestion: "Reduce the number or size of the images, or close other apps, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::ProcessingAborted {
            completed, total, ..
        } => HumanError {
            message: format!("We stopped after {completed} of {total} images to keep your device responsive."),
            suggestion: "The remaining images were kept unchanged. Close other apps and try again for the rest.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FolioError::Pdf(_) => HumanError {
            message: "We couldn't build the PDF.".into(),
            suggestion: "Try again with fewer images.".into(),
            retriable: true,
            severity: Severity::Permanent,
        },

        FolioError::Config(detail) => HumanError {
            message: "Your settings file has a problem.".into(),
            suggestion: format!("Fix or delete the settings file to go back to the defaults. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::Io(io_err) => humanize_io_error(io_err),

        FolioError::Serialization(_) => HumanError {
            message: "Some saved data couldn't be read.".into(),
            suggestion: "Delete the settings file and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_io_error(err: &std::io::Error) -> HumanError {
    match err.kind() {
        std::io::ErrorKind::NotFound => HumanError {
            message: "A file couldn't be found.".into(),
            suggestion: "Check that the file still exists and hasn't been moved.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        std::io::ErrorKind::PermissionDenied => HumanError {
            message: "We don't have permission to use that file.".into(),
            suggestion: "Pick a different folder, or check the file's permissions.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
        _ => HumanError {
            message: "Something went wrong reading or writing a file.".into(),
            suggestion: format!("Try again. (Detail: {err})"),
            retriable: true,
            severity: Severity::Permanent,
        },
    }
}

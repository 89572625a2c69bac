// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-pipeline — Batch enhancement under a live device budget.
//
// Walks a list of images in chunks sized by the current budget, runs each
// chunk concurrently, pauses between chunks, and stops early when the device
// reports a critical condition.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{BatchOrchestrator, BatchOutcome, BatchReport, ItemFailure};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender, progress_channel};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestrator — chunked, budget-driven enhancement of a whole set.
//
// Each chunk re-reads the published device state, so budget changes from the
// monitor (battery, network, memory pressure) take effect at the next chunk
// boundary. In-flight images always run to completion.

use std::sync::Arc;

use folio_core::config::CriticalLimits;
use folio_core::error::{FolioError, Result};
use folio_core::types::{EnhancementLevel, ImageItem};
use folio_device::{CriticalCondition, ResourceBudgeter, SignalBoard, check_critical};
use folio_document::enhance::{EnhanceOutcome, EnhancementEngine, EnhancementMode};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::progress::{ProgressEvent, ProgressSender};

/// One image that kept its original bytes because enhancement failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Position in the input list.
    pub index: usize,
    pub name: String,
    pub error: String,
}

/// How the batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BatchOutcome {
    Completed,
    /// Stopped at a chunk boundary; later items are untouched.
    Aborted(CriticalCondition),
}

/// Everything `enhance_all` hands back, in input order.
#[derive(Debug)]
pub struct BatchReport {
    /// Every input item, each either fully enhanced or fully original.
    pub items: Vec<ImageItem>,
    pub outcome: BatchOutcome,
    pub failures: Vec<ItemFailure>,
    /// Items whose payload was replaced.
    pub enhanced_count: usize,
    /// Items that went through the engine, successfully or not.
    pub processed: usize,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == BatchOutcome::Completed
    }

    /// The partial-completion marker as an error value, if the batch stopped early.
    pub fn abort_error(&self) -> Option<FolioError> {
        match self.outcome {
            BatchOutcome::Completed => None,
            BatchOutcome::Aborted(condition) => Some(FolioError::ProcessingAborted {
                reason: condition.to_string(),
                completed: self.processed,
                total: self.items.len(),
            }),
        }
    }
}

/// Runs the enhancement engine over a whole set, chunk by chunk.
///
/// Constructed once with shared handles to the engine and the signal board.
pub struct BatchOrchestrator {
    engine: Arc<EnhancementEngine>,
    board: Arc<SignalBoard>,
    budgeter: ResourceBudgeter,
    limits: CriticalLimits,
}

impl BatchOrchestrator {
    pub fn new(
        engine: Arc<EnhancementEngine>,
        board: Arc<SignalBoard>,
        budgeter: ResourceBudgeter,
        limits: CriticalLimits,
    ) -> Self {
        Self {
            engine,
            board,
            budgeter,
            limits,
        }
    }

    /// Refuse a batch that cannot run: the device is already critical, or the
    /// estimated memory demand is above the tier's ceiling.
    pub fn preflight(&self, items: &[ImageItem]) -> Result<()> {
        let state = self.board.current();
        if let Some(condition) = check_critical(&state.live, 0, &self.limits) {
            return Err(FolioError::BudgetExceeded {
                reason: format!("the device is already under strain ({condition})"),
            });
        }
        self.budgeter
            .check_batch(items, &state.profile, &state.budget)
    }

    /// Enhance every item at `level`.
    ///
    /// Returns `Err` only when `preflight` refuses the batch. Per-item
    /// failures keep the original bytes and are listed in the report; a
    /// critical condition at a chunk boundary ends the batch with
    /// `BatchOutcome::Aborted` and the remaining items unmodified.
    #[instrument(skip(self, items, progress), fields(count = items.len(), level = ?level))]
    pub async fn enhance_all(
        &self,
        items: Vec<ImageItem>,
        level: EnhancementLevel,
        progress: Option<&ProgressSender>,
    ) -> Result<BatchReport> {
        self.preflight(&items)?;

        let total = items.len();
        let mut pending = items.into_iter().enumerate().peekable();
        let mut finished: Vec<ImageItem> = Vec::with_capacity(total);
        let mut failures: Vec<ItemFailure> = Vec::new();
        let mut enhanced_count = 0;
        let mut processed = 0;
        let mut outcome = BatchOutcome::Completed;

        info!(total, "batch enhancement started");

        while pending.peek().is_some() {
            let state = self.board.current();
            if let Some(condition) = check_critical(&state.live, failures.len(), &self.limits) {
                error!(%condition, processed, total, "batch aborted");
                outcome = BatchOutcome::Aborted(condition);
                finished.extend(pending.by_ref().map(|(_, item)| item));
                break;
            }

            let budget = Arc::new(state.budget.clone());
            let mode = EnhancementMode::for_profile(&state.profile);
            let chunk_size = budget.max_batch_size.max(1);
            let chunk: Vec<(usize, ImageItem)> = pending.by_ref().take(chunk_size).collect();
            debug!(chunk = chunk.len(), ?mode, "starting chunk");

            let tasks = chunk.iter().map(|(_, item)| {
                let engine = Arc::clone(&self.engine);
                let budget = Arc::clone(&budget);
                let data = item.payload().to_vec();
                tokio::task::spawn_blocking(move || engine.enhance(&data, level, mode, &budget))
            });
            let results = join_all(tasks).await;

            for ((index, mut item), joined) in chunk.into_iter().zip(results) {
                processed += 1;
                let result = joined.unwrap_or_else(|err| {
                    Err(FolioError::Enhancement(format!("worker task failed: {err}")))
                });
                match result {
                    Ok(EnhanceOutcome::Enhanced(bytes)) => {
                        item.replace_payload(bytes, level);
                        enhanced_count += 1;
                    }
                    Ok(EnhanceOutcome::Unchanged) => {}
                    Err(err) => {
                        warn!(name = item.name(), %err, "enhancement failed, keeping original");
                        failures.push(ItemFailure {
                            index,
                            name: item.name().to_string(),
                            error: err.to_string(),
                        });
                    }
                }
                finished.push(item);
            }

            if let Some(tx) = progress {
                let current_name = finished
                    .last()
                    .map(|item| item.name().to_string())
                    .unwrap_or_default();
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(ProgressEvent {
                    completed: processed,
                    total,
                    current_name,
                });
            }

            if pending.peek().is_some() {
                tokio::time::sleep(budget.inter_batch_delay()).await;
            }
        }

        info!(
            enhanced = enhanced_count,
            failed = failures.len(),
            processed,
            total,
            "batch enhancement finished"
        );

        Ok(BatchReport {
            items: finished,
            outcome,
            failures,
            enhanced_count,
            processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::ImageFormat;
    use folio_device::{
        CapabilityAssessor, DeviceState, EnvironmentSignals, FixedSignals, LiveSignals,
    };
    use folio_document::ImageProcessor;
    use image::{Rgba, RgbaImage};

    fn jpeg_item(name: &str) -> ImageItem {
        let img = RgbaImage::from_fn(24, 16, |x, y| {
            let v = ((x * 29 + y * 53) % 256) as u8;
            Rgba([v, 255 - v, v / 2, 255])
        });
        let bytes = ImageProcessor::from_rgba(img)
            .to_jpeg_bytes(90)
            .expect("encode jpeg");
        ImageItem::new(name, ImageFormat::Jpeg, 24, 16, bytes, None)
    }

    fn broken_item(name: &str) -> ImageItem {
        ImageItem::new(name, ImageFormat::Jpeg, 24, 16, b"not a jpeg".to_vec(), None)
    }

    fn board_for(signals: EnvironmentSignals) -> Arc<SignalBoard> {
        let assessor = CapabilityAssessor::new(Arc::new(FixedSignals::new(signals)));
        Arc::new(SignalBoard::new(DeviceState::sample(
            &assessor,
            &ResourceBudgeter::new(),
        )))
    }

    fn low_end_phone() -> EnvironmentSignals {
        EnvironmentSignals {
            device_memory_gb: Some(1.0),
            logical_cores: Some(2),
            user_agent: Some("Mozilla/5.0 (Linux; Android 10) Mobile".into()),
            ..Default::default()
        }
    }

    fn workstation() -> EnvironmentSignals {
        EnvironmentSignals {
            device_memory_gb: Some(16.0),
            logical_cores: Some(8),
            ..Default::default()
        }
    }

    fn orchestrator(board: Arc<SignalBoard>) -> BatchOrchestrator {
        BatchOrchestrator::new(
            Arc::new(EnhancementEngine::default()),
            board,
            ResourceBudgeter::new(),
            CriticalLimits::default(),
        )
    }

    #[tokio::test]
    async fn enhances_everything_and_reports_progress() {
        let orchestrator = orchestrator(board_for(workstation()));
        let items: Vec<ImageItem> = (1..=5).map(|i| jpeg_item(&format!("{i}.jpg"))).collect();
        let (tx, mut rx) = crate::progress::progress_channel();

        let report = orchestrator
            .enhance_all(items, EnhancementLevel::Medium, Some(&tx))
            .await
            .expect("batch runs");
        drop(tx);

        assert!(report.is_complete());
        assert!(report.abort_error().is_none());
        assert_eq!(report.enhanced_count, 5);
        assert!(report.items.iter().all(ImageItem::is_enhanced));
        let names: Vec<&str> = report.items.iter().map(ImageItem::name).collect();
        assert_eq!(names, ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"]);

        // High tier with eight cores: chunks of three.
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let completed: Vec<usize> = events.iter().map(|e| e.completed).collect();
        assert_eq!(completed, vec![3, 5]);
        assert_eq!(events[1].current_name, "5.jpg");
        assert!(events.iter().all(|e| e.total == 5));
    }

    #[tokio::test]
    async fn failed_items_keep_their_original_bytes() {
        let orchestrator = orchestrator(board_for(workstation()));
        let items = vec![jpeg_item("1.jpg"), broken_item("2.jpg"), jpeg_item("3.jpg")];

        let report = orchestrator
            .enhance_all(items, EnhancementLevel::Light, None)
            .await
            .expect("per-item failures are not fatal");

        assert!(report.is_complete());
        assert_eq!(report.enhanced_count, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].name, "2.jpg");
        assert_eq!(report.items[1].payload(), b"not a jpeg");
        assert!(!report.items[1].is_enhanced());
    }

    #[tokio::test]
    async fn level_zero_leaves_payloads_alone() {
        let orchestrator = orchestrator(board_for(workstation()));
        let items = vec![jpeg_item("1.jpg"), jpeg_item("2.jpg")];
        let originals: Vec<Vec<u8>> = items.iter().map(|i| i.payload().to_vec()).collect();

        let report = orchestrator
            .enhance_all(items, EnhancementLevel::Off, None)
            .await
            .expect("batch runs");
        assert_eq!(report.enhanced_count, 0);
        for (item, original) in report.items.iter().zip(&originals) {
            assert_eq!(item.payload(), original.as_slice());
        }
    }

    #[tokio::test]
    async fn memory_pressure_aborts_at_the_next_chunk() {
        let board = board_for(low_end_phone());
        assert_eq!(board.current().budget.max_batch_size, 1);
        let orchestrator = Arc::new(orchestrator(Arc::clone(&board)));

        let items: Vec<ImageItem> = (1..=10).map(|i| jpeg_item(&format!("{i:03}.jpg"))).collect();
        let originals: Vec<Vec<u8>> = items.iter().map(|i| i.payload().to_vec()).collect();
        let (tx, mut rx) = crate::progress::progress_channel();

        let runner = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move {
                orchestrator
                    .enhance_all(items, EnhancementLevel::Medium, Some(&tx))
                    .await
            })
        };

        // Chunk 1 is done; the orchestrator is now in its inter-chunk pause.
        let first = rx.recv().await.expect("first progress event");
        assert_eq!(first.completed, 1);
        board.publish_live(
            LiveSignals {
                memory_usage_ratio: Some(0.95),
                ..Default::default()
            },
            &ResourceBudgeter::new(),
        );

        let report = runner.await.expect("task joins").expect("batch was allowed to start");
        assert!(matches!(
            report.outcome,
            BatchOutcome::Aborted(CriticalCondition::MemoryPressure { .. })
        ));
        assert_eq!(report.items.len(), 10);
        assert!(report.items[0].is_enhanced());
        for (item, original) in report.items.iter().zip(&originals).skip(1) {
            assert!(!item.is_enhanced());
            assert_eq!(item.payload(), original.as_slice());
        }

        match report.abort_error() {
            Some(FolioError::ProcessingAborted {
                completed, total, ..
            }) => {
                assert_eq!(completed, 1);
                assert_eq!(total, 10);
            }
            other => panic!("expected ProcessingAborted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn too_many_failures_abort_the_batch() {
        let orchestrator = orchestrator(board_for(workstation()));
        let items: Vec<ImageItem> = (1..=9).map(|i| broken_item(&format!("{i}.jpg"))).collect();

        let report = orchestrator
            .enhance_all(items, EnhancementLevel::Medium, None)
            .await
            .expect("batch starts");

        // Chunks of three: six failures after two chunks trips the limit of five.
        assert_eq!(
            report.outcome,
            BatchOutcome::Aborted(CriticalCondition::TooManyErrors { count: 6 })
        );
        assert_eq!(report.processed, 6);
        assert_eq!(report.items.len(), 9);
    }

    #[tokio::test]
    async fn refuses_to_start_on_a_critical_device() {
        let board = board_for(workstation());
        board.publish_live(
            LiveSignals {
                frame_rate: Some(4.0),
                ..Default::default()
            },
            &ResourceBudgeter::new(),
        );
        let orchestrator = orchestrator(board);

        let err = orchestrator
            .enhance_all(vec![jpeg_item("1.jpg")], EnhancementLevel::Medium, None)
            .await
            .expect_err("critical before start");
        assert!(matches!(err, FolioError::BudgetExceeded { .. }));
    }
}

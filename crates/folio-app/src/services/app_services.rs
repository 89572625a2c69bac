// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — owns the assessor, budgeter, signal board, engine,
// and orchestrator, and exposes the steps of a build to the command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use folio_core::FolioConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::{EnhancementLevel, ImageFormat, ImageItem};
use folio_device::{
    CapabilityAssessor, DeviceState, EnvironmentSignalSource, ResourceBudgeter, SignalBoard,
    SignalMonitor, host_signal_source,
};
use folio_document::enhance::{EnhanceSettings, EnhancementEngine};
use folio_document::order::{self, OrderingAnalysis};
use folio_document::{PdfWriter, ingest_path};
use folio_pipeline::{BatchOrchestrator, BatchReport, ProgressSender};
use tracing::{debug, info, warn};

/// Result of ingesting a list of paths.
#[derive(Debug, Default)]
pub struct Ingested {
    pub items: Vec<ImageItem>,
    /// Files that were skipped, with the reason.
    pub rejected: Vec<(PathBuf, FolioError)>,
}

/// Items in their final order plus how that order was chosen.
#[derive(Debug)]
pub struct Arrangement {
    pub items: Vec<ImageItem>,
    /// `None` when ordering was switched off.
    pub analysis: Option<OrderingAnalysis>,
    /// Whether the lexicographic fallback was used.
    pub fallback: bool,
}

/// Shared application services, constructed once at start-up.
pub struct AppServices {
    config: FolioConfig,
    assessor: CapabilityAssessor,
    budgeter: ResourceBudgeter,
    board: Arc<SignalBoard>,
    orchestrator: BatchOrchestrator,
}

impl AppServices {
    /// Services reading the real host environment.
    pub fn init(config: FolioConfig) -> Self {
        Self::with_source(config, host_signal_source())
    }

    /// Services reading signals from `source`. Takes the first device sample
    /// synchronously so the board is never empty.
    pub fn with_source(config: FolioConfig, source: Arc<dyn EnvironmentSignalSource>) -> Self {
        info!(source = source.source_name(), "initialising app services");
        let assessor = CapabilityAssessor::new(source);
        let budgeter = ResourceBudgeter::new();
        let board = Arc::new(SignalBoard::new(DeviceState::sample(&assessor, &budgeter)));
        let engine = Arc::new(EnhancementEngine::new(EnhanceSettings::from(&config)));
        let orchestrator = BatchOrchestrator::new(
            engine,
            Arc::clone(&board),
            budgeter.clone(),
            config.critical,
        );

        let state = board.current();
        info!(
            tier = %state.profile.tier,
            mobile = state.profile.is_mobile,
            batch = state.budget.max_batch_size,
            "app services initialised"
        );

        Self {
            config,
            assessor,
            budgeter,
            board,
            orchestrator,
        }
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    /// Latest published device state.
    pub fn device_state(&self) -> Arc<DeviceState> {
        self.board.current()
    }

    /// Start polling the environment in the background.
    pub fn start_monitor(&self) -> SignalMonitor {
        SignalMonitor::spawn(
            self.assessor.clone(),
            self.budgeter.clone(),
            Arc::clone(&self.board),
            Duration::from_millis(self.config.monitor_interval_ms.max(1)),
        )
    }

    /// Read every path; unreadable or unsupported files are skipped.
    pub fn ingest(&self, paths: &[PathBuf]) -> Ingested {
        let mut out = Ingested::default();
        for path in paths {
            match ingest_path(path, self.config.max_file_bytes) {
                Ok(item) => out.items.push(item),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping file");
                    out.rejected.push((path.clone(), err));
                }
            }
        }
        debug!(accepted = out.items.len(), rejected = out.rejected.len(), "ingestion done");
        out
    }

    /// Put items in page order.
    ///
    /// With `infer` set, order inference runs first; an ambiguous result
    /// falls back to plain name order. Without it the input order is kept.
    pub fn arrange(&self, items: Vec<ImageItem>, infer: bool) -> Arrangement {
        if !infer {
            return Arrangement {
                items,
                analysis: None,
                fallback: false,
            };
        }

        let names: Vec<&str> = items.iter().map(ImageItem::name).collect();
        let analysis = order::infer(&names[..]);
        let fallback = analysis.is_ambiguous();
        let items = if fallback {
            info!("no page numbers found, sorting by name");
            let mut items = items;
            items.sort_by(|a, b| a.name().cmp(b.name()));
            items
        } else {
            info!(confidence = analysis.confidence, "page order inferred");
            analysis.apply(items)
        };

        Arrangement {
            items,
            analysis: Some(analysis),
            fallback,
        }
    }

    /// The level to use when the user did not pick one.
    pub fn recommended_level(&self) -> EnhancementLevel {
        self.board.current().budget.recommended_level
    }

    pub async fn enhance(
        &self,
        items: Vec<ImageItem>,
        level: EnhancementLevel,
        progress: Option<&ProgressSender>,
    ) -> Result<BatchReport> {
        self.orchestrator.enhance_all(items, level, progress).await
    }

    pub fn write_pdf(&self, items: &[ImageItem], path: &Path) -> Result<()> {
        PdfWriter::from_config(&self.config).write_items_to_file(items, path)
    }
}

/// Expand directories (one level deep) and keep files with an accepted
/// image extension. Directory entries are returned in name order; explicit
/// file arguments are kept as given.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && has_image_extension(path))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

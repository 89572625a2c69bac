// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Machine-readable output goes to stdout; progress and
// user notices go to stderr.

use std::path::PathBuf;

use folio_core::error::{FolioError, Result};
use folio_core::human_errors::humanize_error;
use folio_core::types::EnhancementLevel;
use folio_document::order::{self, OrderingAnalysis};
use folio_pipeline::{BatchOutcome, progress_channel};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cli::{BuildArgs, LevelArg};
use crate::services::app_services::{AppServices, collect_inputs};

/// What `folio build` did.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub pages: usize,
    pub skipped: usize,
    pub level: EnhancementLevel,
    pub enhanced: usize,
    pub failed: usize,
    pub aborted: bool,
    pub order_fallback: bool,
}

fn no_inputs() -> FolioError {
    FolioError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "no JPEG, PNG, GIF, or WEBP files in the given inputs",
    ))
}

fn notify(err: &FolioError) {
    let human = humanize_error(err);
    eprintln!("{} {}", human.message, human.suggestion);
}

/// `folio build`: ingest, order, enhance, write.
pub async fn build(services: &AppServices, args: &BuildArgs) -> Result<BuildSummary> {
    let paths = collect_inputs(&args.inputs)?;
    let ingested = services.ingest(&paths);
    for (path, err) in &ingested.rejected {
        eprintln!("skipped {}: {}", path.display(), err);
    }
    if ingested.items.is_empty() {
        return Err(no_inputs());
    }

    let arranged = services.arrange(ingested.items, !args.no_order);
    let level = match args.level {
        Some(LevelArg::Auto) => services.recommended_level(),
        _ => services.config().default_level,
    };
    for notice in &services.device_state().budget.notices {
        eprintln!("{}", notice.message());
    }
    info!(count = arranged.items.len(), ?level, "building document");

    let monitor = services.start_monitor();
    let (tx, mut rx) = progress_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprintln!("[{}/{}] {}", event.completed, event.total, event.current_name);
        }
    });

    let result = services.enhance(arranged.items, level, Some(&tx)).await;
    drop(tx);
    monitor.stop().await;
    if let Err(err) = printer.await {
        warn!("progress printer ended abnormally: {err}");
    }
    let report = result?;

    for failure in &report.failures {
        warn!(name = %failure.name, error = %failure.error, "kept original image");
    }
    if let Some(err) = report.abort_error() {
        error!(%err, "enhancement stopped early");
        notify(&err);
    }

    let output = args.output.clone();
    services.write_pdf(&report.items, &output)?;

    Ok(BuildSummary {
        output,
        pages: report.items.len(),
        skipped: ingested.rejected.len(),
        level,
        enhanced: report.enhanced_count,
        failed: report.failures.len(),
        aborted: matches!(report.outcome, BatchOutcome::Aborted(_)),
        order_fallback: arranged.fallback,
    })
}

#[derive(Debug, Serialize)]
pub struct OrderReport {
    pub analysis: OrderingAnalysis,
    /// Names in the order `build` would use, fallback included.
    pub ordered: Vec<String>,
}

/// `folio order`: analyse names only, without reading the images.
pub fn order(inputs: &[PathBuf]) -> Result<OrderReport> {
    let paths = collect_inputs(inputs)?;
    if paths.is_empty() {
        return Err(no_inputs());
    }
    let names: Vec<String> = paths
        .iter()
        .map(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        })
        .collect();

    let analysis = order::infer(&names[..]);
    let sequence = if analysis.is_ambiguous() {
        order::lexicographic_order(&names[..])
    } else {
        analysis.order.clone()
    };
    let ordered = sequence.into_iter().map(|i| names[i].clone()).collect();
    Ok(OrderReport { analysis, ordered })
}

/// Print any serialisable value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

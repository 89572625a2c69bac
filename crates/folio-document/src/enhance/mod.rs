// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement module — sharpening kernels and the engine that drives them.

pub mod engine;
pub mod kernel;

pub use engine::{
    EnhanceOutcome, EnhanceSettings, EnhancementEngine, EnhancementMode, FilterStrategy,
};
pub use kernel::Kernel3;

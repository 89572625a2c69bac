// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — wires the folio crates together for the command handlers.
//
// Everything is constructed once at start-up and passed by reference.

pub mod app_services;
pub mod data_dir;

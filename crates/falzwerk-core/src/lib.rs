// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Falzwerk — Core types and error definitions shared across all crates.

pub mod config;
pub mod data_dir;
pub mod error;
pub mod processor;
pub mod types;

pub use config::AppConfig;
pub use error::FalzwerkError;
pub use processor::DocumentProcessor;
pub use types::*;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wallframe: Core types, platform table, and error definitions shared
// across all crates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod types;

pub use catalog::{InMemoryCatalog, TemplateCatalog};
pub use config::WallframeConfig;
pub use error::{Result, WallframeError};
pub use platform::{PlatformSpec, platform_spec};
pub use types::*;

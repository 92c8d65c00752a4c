// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wallframe.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Wallframe operations.
#[derive(Debug, Error)]
pub enum WallframeError {
    // -- Geometry errors --
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    // -- Caller input errors --
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("template {template_id} has {zone_count} placement zone(s), index {index} is out of range")]
    UnknownZoneIndex {
        template_id: String,
        index: usize,
        zone_count: usize,
    },

    #[error("invalid print size {0:?} (expected \"WxH\" in inches)")]
    InvalidPrintSize(String),

    #[error("invalid batch request: {0}")]
    InvalidRequest(String),

    #[error("unknown batch job: {0}")]
    UnknownJob(String),

    // -- Image errors --
    #[error("source image missing: {}", .0.display())]
    SourceImageMissing(PathBuf),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- External forwarding --
    #[error("forwarding {item} timed out after {timeout_ms} ms")]
    ForwardingTimeout { item: String, timeout_ms: u64 },

    #[error("forwarding failed: {0}")]
    Forwarding(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WallframeError {
    /// Stable kebab-case tag recorded in job error lists and manifests.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DegenerateGeometry(_) => "degenerate-geometry",
            Self::UnknownPlatform(_) => "unknown-platform",
            Self::UnknownTemplate(_) => "unknown-template",
            Self::UnknownZoneIndex { .. } => "unknown-zone-index",
            Self::InvalidPrintSize(_) => "invalid-print-size",
            Self::InvalidRequest(_) => "invalid-request",
            Self::UnknownJob(_) => "unknown-job",
            Self::SourceImageMissing(_) => "source-image-missing",
            Self::ImageError(_) => "image-error",
            Self::ForwardingTimeout { .. } => "forwarding-timeout",
            Self::Forwarding(_) => "forwarding-failed",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Caller input errors are surfaced immediately and never retried.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownPlatform(_)
                | Self::UnknownTemplate(_)
                | Self::UnknownZoneIndex { .. }
                | Self::InvalidPrintSize(_)
                | Self::InvalidRequest(_)
                | Self::UnknownJob(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WallframeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        assert!(WallframeError::UnknownPlatform("myspace".into()).is_input_error());
        assert!(WallframeError::UnknownTemplate("t-404".into()).is_input_error());
        assert!(!WallframeError::DegenerateGeometry("collinear".into()).is_input_error());
        assert!(!WallframeError::SourceImageMissing(PathBuf::from("a.jpg")).is_input_error());
    }

    #[test]
    fn zone_index_message_names_template() {
        let err = WallframeError::UnknownZoneIndex {
            template_id: "loft-01".into(),
            index: 2,
            zone_count: 1,
        };
        assert_eq!(err.code(), "unknown-zone-index");
        assert!(err.to_string().contains("loft-01"));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-N pair selection for seeding batch jobs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wallframe_core::types::Photo;

use crate::aspect::{EXACT_THRESHOLD, FitType, STRETCH_FACTOR};
use crate::matrix::CompatibilityMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SmartMatchOptions {
    pub max_per_photo: usize,
    /// Weakest tier accepted. `Stretched` also draws on near-misses.
    pub min_fit: FitType,
}

impl Default for SmartMatchOptions {
    fn default() -> Self {
        Self {
            max_per_photo: 3,
            min_fit: FitType::Good,
        }
    }
}

/// A (photo, template) pair ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPair {
    pub photo_id: String,
    pub photo_path: PathBuf,
    pub template_id: String,
    pub score: f64,
    pub fit_type: FitType,
    pub used_safe_zone: bool,
}

/// Lowest score admitted for a tier at the matrix tolerance.
pub fn score_floor(min_fit: FitType, tolerance: f64) -> f64 {
    match min_fit {
        FitType::Exact => 1.0 - EXACT_THRESHOLD,
        FitType::Good => 1.0 - tolerance,
        FitType::Stretched => 1.0 - STRETCH_FACTOR * tolerance,
        FitType::Incompatible => 0.0,
    }
}

/// For each photo, its best `max_per_photo` matches whose own tier meets
/// `min_fit` or whose score clears the tier's floor, highest score first.
/// Photos are visited in input order.
pub fn smart_match_pairs(
    matrix: &CompatibilityMatrix,
    photos: &[Photo],
    options: SmartMatchOptions,
) -> Vec<MatchPair> {
    let floor = score_floor(options.min_fit, matrix.config.tolerance);
    let mut pairs = Vec::new();

    for photo in photos {
        let mut candidates: Vec<_> = matrix.matches_for(&photo.id).iter().collect();
        if options.min_fit >= FitType::Stretched {
            candidates.extend(matrix.near_misses_for(&photo.id));
        }
        candidates.retain(|m| m.fit_type <= options.min_fit || m.score >= floor);
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(options.max_per_photo);

        debug!(photo = %photo.id, selected = candidates.len(), floor, "pairs selected");
        pairs.extend(candidates.into_iter().map(|m| MatchPair {
            photo_id: photo.id.clone(),
            photo_path: photo.path.clone(),
            template_id: m.template_id.clone(),
            score: m.score,
            fit_type: m.fit_type,
            used_safe_zone: m.used_safe_zone,
        }));
    }
    pairs
}

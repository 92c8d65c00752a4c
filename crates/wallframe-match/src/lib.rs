// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wallframe-match: Aspect-ratio matching between artwork and room templates.
//
// Classifies aspect ratios into named bands, scores photo/zone pairs, builds
// the photo x template compatibility matrix with its reverse index and
// unmatched recommendations, and derives coverage statistics and best-N
// pairings from it.

pub mod aspect;
pub mod matrix;
pub mod pairs;
pub mod stats;

pub use aspect::{AspectCategory, Compatibility, FitType, classify, is_compatible};
pub use matrix::{
    CompatibilityMatch, CompatibilityMatrix, MatcherConfig, UnmatchedPhoto,
    build_compatibility_matrix,
};
pub use pairs::{MatchPair, SmartMatchOptions, smart_match_pairs};
pub use stats::{CompatibilityStats, compatibility_stats};

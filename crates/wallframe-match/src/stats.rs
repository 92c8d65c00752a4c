// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summary statistics over a compatibility matrix. Pure functions only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aspect::AspectCategory;
use crate::matrix::CompatibilityMatrix;

/// How many photos have 0, 1, 2-5 and 6+ compatible templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDistribution {
    pub none: usize,
    pub one: usize,
    pub two_to_five: usize,
    pub six_plus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCoverage {
    pub collection: String,
    pub total: usize,
    pub matched: usize,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUtilization {
    pub template_id: String,
    pub matches: usize,
}

/// Unmatched photos in one aspect band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectGap {
    pub category: AspectCategory,
    pub unmatched: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityStats {
    pub total_photos: usize,
    pub matched_photos: usize,
    pub coverage_pct: f64,
    pub distribution: MatchDistribution,
    /// Sorted by collection name.
    pub collections: Vec<CollectionCoverage>,
    /// Most-used template first.
    pub template_utilization: Vec<TemplateUtilization>,
    /// Largest gap first.
    pub gaps: Vec<AspectGap>,
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn compatibility_stats(matrix: &CompatibilityMatrix) -> CompatibilityStats {
    let mut distribution = MatchDistribution::default();
    let mut collections: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    let mut matched_photos = 0;

    for entry in &matrix.photos {
        let count = matrix.matches_for(&entry.photo_id).len();
        match count {
            0 => distribution.none += 1,
            1 => distribution.one += 1,
            2..=5 => distribution.two_to_five += 1,
            _ => distribution.six_plus += 1,
        }
        let slot = collections.entry(entry.collection.as_str()).or_default();
        slot.0 += 1;
        if count > 0 {
            matched_photos += 1;
            slot.1 += 1;
        }
    }

    let mut template_utilization: Vec<TemplateUtilization> = matrix
        .template_ids
        .iter()
        .map(|id| TemplateUtilization {
            template_id: id.clone(),
            matches: matrix.photos_for(id).len(),
        })
        .collect();
    template_utilization.sort_by(|a, b| {
        b.matches
            .cmp(&a.matches)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });

    let mut gap_counts: BTreeMap<AspectCategory, usize> = BTreeMap::new();
    for unmatched in &matrix.unmatched {
        *gap_counts.entry(unmatched.category).or_default() += 1;
    }
    let mut gaps: Vec<AspectGap> = gap_counts
        .into_iter()
        .map(|(category, unmatched)| AspectGap {
            category,
            unmatched,
        })
        .collect();
    gaps.sort_by(|a, b| b.unmatched.cmp(&a.unmatched).then(a.category.cmp(&b.category)));

    let total_photos = matrix.photos.len();
    CompatibilityStats {
        total_photos,
        matched_photos,
        coverage_pct: pct(matched_photos, total_photos),
        distribution,
        collections: collections
            .into_iter()
            .map(|(name, (total, matched))| CollectionCoverage {
                collection: name.to_string(),
                total,
                matched,
                coverage_pct: pct(matched, total),
            })
            .collect(),
        template_utilization,
        gaps,
    }
}

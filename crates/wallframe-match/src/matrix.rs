// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photo x template compatibility matrix.
//
// Each photo is tested against the primary zone of every template. A miss on
// the tight zone is retried against the template's safe zone; templates
// without one get a relaxed tolerance instead. The matrix is a derived
// cache and is rebuilt from the catalog whenever it is needed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use wallframe_core::config::WallframeConfig;
use wallframe_core::types::{Photo, Template};

use crate::aspect::{
    AspectCategory, DEFAULT_TOLERANCE, FitType, classify, is_compatible, relative_difference,
};

/// Matching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatcherConfig {
    /// Relative difference accepted as a good fit.
    pub tolerance: f64,
    /// Fractional widening of the tolerance used for templates that carry
    /// no explicit safe zone.
    pub safe_zone_expansion: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            safe_zone_expansion: 0.3,
        }
    }
}

impl From<&WallframeConfig> for MatcherConfig {
    fn from(config: &WallframeConfig) -> Self {
        Self {
            tolerance: config.match_tolerance,
            safe_zone_expansion: config.safe_zone_expansion,
        }
    }
}

/// One scored (photo, template) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityMatch {
    pub photo_id: String,
    pub template_id: String,
    pub score: f64,
    pub fit_type: FitType,
    /// The pairing only succeeded against the relaxed safe zone.
    pub used_safe_zone: bool,
    pub photo_aspect: f64,
    pub zone_aspect: f64,
}

/// Photo bookkeeping kept alongside the matches for stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEntry {
    pub photo_id: String,
    pub collection: String,
    pub aspect_ratio: f64,
    pub category: AspectCategory,
}

/// A photo that matched no template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedPhoto {
    pub photo_id: String,
    pub aspect_ratio: f64,
    pub category: AspectCategory,
    /// Closest template by aspect ratio and its relative difference.
    pub closest_template: Option<String>,
    pub closest_difference: Option<f64>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityMatrix {
    pub config: MatcherConfig,
    /// Photos in input order.
    pub photos: Vec<PhotoEntry>,
    /// Template ids in catalog order.
    pub template_ids: Vec<String>,
    /// Compatible matches per photo, best first.
    pub by_photo: BTreeMap<String, Vec<CompatibilityMatch>>,
    /// Reverse index. Every template has an entry, possibly empty.
    pub by_template: BTreeMap<String, Vec<CompatibilityMatch>>,
    /// Stretched near-misses per photo, best first. Never compatible.
    pub near_misses: BTreeMap<String, Vec<CompatibilityMatch>>,
    pub unmatched: Vec<UnmatchedPhoto>,
    /// Photo ids seen more than once. Only the first occurrence is scored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_photo_ids: Vec<String>,
}

impl CompatibilityMatrix {
    /// Compatible matches for a photo, best first.
    pub fn matches_for(&self, photo_id: &str) -> &[CompatibilityMatch] {
        self.by_photo.get(photo_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Photos that fit a template, in photo order.
    pub fn photos_for(&self, template_id: &str) -> &[CompatibilityMatch] {
        self.by_template.get(template_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn near_misses_for(&self, photo_id: &str) -> &[CompatibilityMatch] {
        self.near_misses.get(photo_id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Score every photo against every template.
#[instrument(skip_all, fields(photos = photos.len(), templates = templates.len()))]
pub fn build_compatibility_matrix(
    photos: &[Photo],
    templates: &[Template],
    config: MatcherConfig,
) -> CompatibilityMatrix {
    let mut matrix = CompatibilityMatrix {
        config,
        template_ids: templates.iter().map(|t| t.id.clone()).collect(),
        by_template: templates
            .iter()
            .map(|t| (t.id.clone(), Vec::new()))
            .collect(),
        ..CompatibilityMatrix::default()
    };

    let zones: Vec<(&Template, f64)> = templates
        .iter()
        .filter_map(|t| match t.zone_aspect_ratio() {
            Some(ar) => Some((t, ar)),
            None => {
                warn!(template = %t.id, "template has no usable placement zone, skipping");
                None
            }
        })
        .collect();

    let mut seen = BTreeSet::new();
    for photo in photos {
        if !seen.insert(photo.id.as_str()) {
            warn!(photo = %photo.id, path = %photo.path.display(), "duplicate photo id, skipping");
            matrix.duplicate_photo_ids.push(photo.id.clone());
            continue;
        }
        let photo_ar = photo.aspect_ratio();
        let category = classify(photo_ar);
        matrix.photos.push(PhotoEntry {
            photo_id: photo.id.clone(),
            collection: photo.collection(),
            aspect_ratio: photo_ar,
            category,
        });

        let mut matches = Vec::new();
        let mut near = Vec::new();
        for &(template, zone_ar) in &zones {
            let tight = is_compatible(photo_ar, zone_ar, config.tolerance);
            let pairing = |score, fit_type, used_safe_zone, zone_aspect| CompatibilityMatch {
                photo_id: photo.id.clone(),
                template_id: template.id.clone(),
                score,
                fit_type,
                used_safe_zone,
                photo_aspect: photo_ar,
                zone_aspect,
            };

            if tight.compatible {
                matches.push(pairing(tight.score, tight.fit_type, false, zone_ar));
                continue;
            }

            let (relaxed, relaxed_ar) = match template.safe_zone_aspect_ratio() {
                Some(safe_ar) => (is_compatible(photo_ar, safe_ar, config.tolerance), safe_ar),
                None => (
                    is_compatible(
                        photo_ar,
                        zone_ar,
                        config.tolerance * (1.0 + config.safe_zone_expansion),
                    ),
                    zone_ar,
                ),
            };
            if relaxed.compatible {
                matches.push(pairing(relaxed.score, relaxed.fit_type, true, relaxed_ar));
            } else if tight.fit_type == FitType::Stretched {
                near.push(pairing(tight.score, tight.fit_type, false, zone_ar));
            }
        }

        sort_best_first(&mut matches);
        sort_best_first(&mut near);
        debug!(photo = %photo.id, matches = matches.len(), near = near.len(), "photo scored");

        if matches.is_empty() {
            matrix
                .unmatched
                .push(unmatched_entry(photo, photo_ar, category, &zones));
        }
        for m in &matches {
            if let Some(list) = matrix.by_template.get_mut(&m.template_id) {
                list.push(m.clone());
            }
        }
        if !near.is_empty() {
            matrix.near_misses.insert(photo.id.clone(), near);
        }
        matrix.by_photo.insert(photo.id.clone(), matches);
    }

    info!(
        unmatched = matrix.unmatched.len(),
        duplicates = matrix.duplicate_photo_ids.len(),
        "compatibility matrix built"
    );
    matrix
}

fn sort_best_first(matches: &mut [CompatibilityMatch]) {
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });
}

fn unmatched_entry(
    photo: &Photo,
    photo_ar: f64,
    category: AspectCategory,
    zones: &[(&Template, f64)],
) -> UnmatchedPhoto {
    let closest = zones
        .iter()
        .map(|(t, ar)| (t.id.clone(), relative_difference(photo_ar, *ar)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let band_covered = zones.iter().any(|(_, ar)| classify(*ar) == category);

    let recommendation = match &closest {
        Some((_, diff)) if band_covered => format!(
            "closest template differs by {:.0}%, consider generating a ~{:.2}:1 room",
            diff * 100.0,
            photo_ar
        ),
        _ => format!(
            "no template exists in this aspect band ({}), consider generating a ~{:.2}:1 room",
            category, photo_ar
        ),
    };

    UnmatchedPhoto {
        photo_id: photo.id.clone(),
        aspect_ratio: photo_ar,
        category,
        closest_difference: closest.as_ref().map(|(_, d)| *d),
        closest_template: closest.map(|(id, _)| id),
        recommendation,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use wallframe_core::types::{Corners, ImageDimensions, PlacementZone, SafeZone};

    pub(crate) fn template(id: &str, w: f64, h: f64) -> Template {
        Template {
            id: id.into(),
            name: id.into(),
            category: "test".into(),
            image_path: PathBuf::from(format!("{id}.jpg")),
            dimensions: ImageDimensions {
                width: 2000,
                height: 1500,
            },
            placement_zones: vec![PlacementZone::new(Corners::from_rect(
                100.0, 100.0, w, h,
            ))],
            safe_zone: None,
            print_sizes: vec![],
        }
    }

    pub(crate) fn photo(id: &str, collection: &str, w: u32, h: u32) -> Photo {
        Photo::new(id, format!("/art/{collection}/{id}.jpg"), w, h)
    }

    #[test]
    fn indexes_agree() {
        let templates = vec![template("square", 500.0, 500.0), template("wide", 900.0, 600.0)];
        let photos = vec![
            photo("p1", "abstract", 1000, 1000),
            photo("p2", "abstract", 1500, 1000),
        ];
        let matrix = build_compatibility_matrix(&photos, &templates, MatcherConfig::default());

        assert_eq!(matrix.matches_for("p1")[0].template_id, "square");
        assert_eq!(matrix.matches_for("p2")[0].template_id, "wide");
        assert_eq!(matrix.photos_for("square").len(), 1);
        assert_eq!(matrix.photos_for("wide")[0].photo_id, "p2");
        assert!(matrix.unmatched.is_empty());
    }

    #[test]
    fn safe_zone_rescues_a_miss() {
        let mut framed = template("framed", 500.0, 500.0);
        framed.safe_zone = Some(SafeZone { w: 700.0, h: 500.0 });
        let photos = vec![photo("p", "c", 1400, 1000)];
        let matrix = build_compatibility_matrix(&photos, &[framed], MatcherConfig::default());

        let m = &matrix.matches_for("p")[0];
        assert!(m.used_safe_zone);
        assert_eq!(m.fit_type, FitType::Exact);
        assert!((m.zone_aspect - 1.4).abs() < 1e-9);
    }

    #[test]
    fn implicit_safe_zone_widens_tolerance() {
        // diff = 1 - 1/1.22 ~= 0.18: outside 0.15 but inside 0.15 * 1.3.
        let photos = vec![photo("p", "c", 1220, 1000)];
        let matrix = build_compatibility_matrix(
            &photos,
            &[template("sq", 500.0, 500.0)],
            MatcherConfig::default(),
        );
        let m = &matrix.matches_for("p")[0];
        assert!(m.used_safe_zone);
        assert_eq!(m.fit_type, FitType::Good);

        let strict = MatcherConfig {
            safe_zone_expansion: 0.0,
            ..MatcherConfig::default()
        };
        let matrix = build_compatibility_matrix(&photos, &[template("sq", 500.0, 500.0)], strict);
        assert!(matrix.matches_for("p").is_empty());
        assert_eq!(matrix.near_misses_for("p")[0].fit_type, FitType::Stretched);
    }

    #[test]
    fn unmatched_recommendations() {
        let templates = vec![template("square", 500.0, 500.0), template("tall", 400.0, 600.0)];
        let photos = vec![
            photo("pano", "c", 3000, 1000),
            photo("squarish", "c", 1300, 1000),
        ];
        let strict = MatcherConfig {
            tolerance: 0.1,
            safe_zone_expansion: 0.0,
        };
        let matrix = build_compatibility_matrix(&photos, &templates, strict);
        assert_eq!(matrix.unmatched.len(), 2);

        let pano = &matrix.unmatched[0];
        assert_eq!(pano.category, AspectCategory::ThreeOne);
        assert!(pano.recommendation.starts_with("no template exists in this aspect band"));
        assert_eq!(pano.closest_template.as_deref(), Some("square"));

        // 1.3 sits in the 4:3 band; add a 4:3 template that is still too far.
        let mut templates = templates;
        templates.push(template("fourthree", 1160.0, 1000.0));
        let matrix = build_compatibility_matrix(&photos[1..], &templates, strict);
        let entry = &matrix.unmatched[0];
        assert!(
            entry.recommendation.starts_with("closest template differs by 11%"),
            "{}",
            entry.recommendation
        );
        assert!(entry.recommendation.ends_with("~1.30:1 room"));
    }

    #[test]
    fn duplicate_photo_ids_are_not_overwritten() {
        let photos = vec![
            photo("IMG_0001", "florals", 1000, 1000),
            photo("IMG_0001", "landscapes", 3000, 1000),
        ];
        let matrix = build_compatibility_matrix(
            &photos,
            &[template("square", 500.0, 500.0)],
            MatcherConfig::default(),
        );
        assert_eq!(matrix.photos.len(), 1);
        assert_eq!(matrix.photos[0].collection, "florals");
        assert_eq!(matrix.matches_for("IMG_0001")[0].template_id, "square");
        assert!(matrix.unmatched.is_empty());
        assert_eq!(matrix.duplicate_photo_ids, vec!["IMG_0001"]);
    }

    #[test]
    fn every_template_has_reverse_entry() {
        let templates = vec![template("a", 500.0, 500.0), template("b", 2000.0, 500.0)];
        let matrix = build_compatibility_matrix(
            &[photo("p", "c", 100, 100)],
            &templates,
            MatcherConfig::default(),
        );
        assert!(matrix.by_template.contains_key("b"));
        assert!(matrix.photos_for("b").is_empty());
    }
}

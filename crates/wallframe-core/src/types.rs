// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: templates, placement zones, photos, detection results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WallframeError};

/// Unique identifier for a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = WallframeError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| WallframeError::UnknownJob(s.to_string()))
    }
}

// -- Geometry -----------------------------------------------------------------

/// A 2D point in image pixel coordinates. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Four corners of a quadrilateral, clockwise from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Corners {
    /// Axis-aligned rectangle from its top-left corner and size.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top_left: Point::new(x, y),
            top_right: Point::new(x + width, y),
            bottom_right: Point::new(x + width, y + height),
            bottom_left: Point::new(x, y + height),
        }
    }

    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    pub fn from_array(points: [Point; 4]) -> Self {
        Self {
            top_left: points[0],
            top_right: points[1],
            bottom_right: points[2],
            bottom_left: points[3],
        }
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::from_array(self.to_array().map(|p| p.scaled(sx, sy)))
    }

    /// Approximate width and height: the mean of opposite edge lengths.
    pub fn approx_size(&self) -> (f64, f64) {
        let width = (self.top_left.distance(&self.top_right)
            + self.bottom_left.distance(&self.bottom_right))
            / 2.0;
        let height = (self.top_left.distance(&self.bottom_left)
            + self.top_right.distance(&self.bottom_right))
            / 2.0;
        (width, height)
    }

    /// Shoelace area of the quadrilateral.
    pub fn area(&self) -> f64 {
        let pts = self.to_array();
        let mut twice = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            twice += pts[i].x * pts[j].y - pts[j].x * pts[i].y;
        }
        twice.abs() / 2.0
    }

    /// Reject duplicate or collinear corners and non-convex (including
    /// self-intersecting) quadrilaterals.
    pub fn validate(&self) -> Result<()> {
        let pts = self.to_array();
        let scale = pts
            .iter()
            .flat_map(|p| [p.x.abs(), p.y.abs()])
            .fold(1.0_f64, f64::max);
        let eps = 1e-9 * scale * scale;

        for i in 0..4 {
            for j in (i + 1)..4 {
                if pts[i].distance(&pts[j]) < 1e-6 * scale {
                    return Err(WallframeError::DegenerateGeometry(format!(
                        "corners {i} and {j} coincide"
                    )));
                }
            }
        }

        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let c = pts[(i + 2) % 4];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross.abs() <= eps {
                return Err(WallframeError::DegenerateGeometry(format!(
                    "corners {i}, {}, {} are collinear",
                    (i + 1) % 4,
                    (i + 2) % 4
                )));
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return Err(WallframeError::DegenerateGeometry(
                    "quadrilateral is not convex".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Approximate width x height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Expanded zone dimensions used as a relaxed matching target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub w: f64,
    pub h: f64,
}

/// A quadrilateral region of a room image where artwork is composited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementZone {
    pub corners: Corners,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dimensions: Option<Size>,
}

impl PlacementZone {
    pub fn new(corners: Corners) -> Self {
        Self {
            corners,
            max_dimensions: None,
        }
    }

    /// Approximate pixel size: `maxDimensions` when annotated, otherwise
    /// derived from the corner edge lengths.
    pub fn approx_size(&self) -> (f64, f64) {
        match self.max_dimensions {
            Some(size) => (size.width, size.height),
            None => self.corners.approx_size(),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.approx_size();
        if h <= 0.0 { 0.0 } else { w / h }
    }

    /// Corner validation; see [`Corners::validate`].
    pub fn validate(&self) -> Result<()> {
        self.corners.validate()
    }
}

/// Pixel dimensions of a room image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// A room photograph with one or more annotated placement zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub image_path: PathBuf,
    pub dimensions: ImageDimensions,
    pub placement_zones: Vec<PlacementZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_zone: Option<SafeZone>,
    #[serde(default)]
    pub print_sizes: Vec<String>,
}

impl Template {
    /// Look up a placement zone by index.
    pub fn zone(&self, index: usize) -> Result<&PlacementZone> {
        self.placement_zones
            .get(index)
            .ok_or_else(|| WallframeError::UnknownZoneIndex {
                template_id: self.id.clone(),
                index,
                zone_count: self.placement_zones.len(),
            })
    }

    /// Aspect ratio of the primary (first) placement zone.
    pub fn zone_aspect_ratio(&self) -> Option<f64> {
        self.placement_zones
            .first()
            .map(PlacementZone::aspect_ratio)
            .filter(|ar| ar.is_finite() && *ar > 0.0)
    }

    pub fn safe_zone_aspect_ratio(&self) -> Option<f64> {
        self.safe_zone
            .filter(|sz| sz.w > 0.0 && sz.h > 0.0)
            .map(|sz| sz.w / sz.h)
    }
}

// -- Photos -------------------------------------------------------------------

/// Artwork pixel dimensions plus the derived aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDimensions {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

/// A catalogued artwork image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub path: PathBuf,
    pub filename: String,
    pub dimensions: PhotoDimensions,
}

impl Photo {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            width as f64 / height as f64
        };
        Self {
            id: id.into(),
            path,
            filename,
            dimensions: PhotoDimensions {
                width,
                height,
                aspect_ratio,
            },
        }
    }

    /// Catalogue a photo by reading its dimensions from the file header.
    ///
    /// The id is `{collection}/{file stem}`, so same-named files in different
    /// collections stay distinct. Re-scanning is the only way the aspect
    /// ratio is recomputed.
    pub fn scan(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WallframeError::SourceImageMissing(path.to_path_buf()));
        }
        let (width, height) = image::image_dimensions(path).map_err(|err| {
            WallframeError::ImageError(format!("failed to read {}: {}", path.display(), err))
        })?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut photo = Self::new(stem, path, width, height);
        photo.id = format!("{}/{}", photo.collection(), photo.id);
        Ok(photo)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.dimensions.aspect_ratio
    }

    /// Collection name: the photo's parent directory.
    pub fn collection(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uncategorized".to_string())
    }
}

/// Nominal print size in inches. Metadata only; never alters fill behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl FromStr for PrintSize {
    type Err = WallframeError;

    /// Parse `"24x36"`, `"8.5X11"`, or `"12×16"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || WallframeError::InvalidPrintSize(s.to_string());
        let normalised = s.trim().replace(|c: char| c == 'X' || c == '×', "x");
        let (w, h) = normalised.split_once('x').ok_or_else(invalid)?;
        let width_in: f64 = w.trim().parse().map_err(|_| invalid())?;
        let height_in: f64 = h.trim().parse().map_err(|_| invalid())?;
        if !(width_in > 0.0 && height_in > 0.0 && width_in.is_finite() && height_in.is_finite()) {
            return Err(invalid());
        }
        Ok(Self {
            width_in,
            height_in,
        })
    }
}

impl fmt::Display for PrintSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width_in, self.height_in)
    }
}

// -- Zone detection -----------------------------------------------------------

/// Strategy that produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ChromaKey,
    Frame,
    BlankWall,
    /// Fixed centred rectangle used when every strategy declined.
    Fallback,
}

/// Best-guess placement zone emitted by the zone detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub corners: Corners,
    pub method: DetectionMethod,
    /// In `[0, 1]`.
    pub confidence: f64,
}

impl DetectionResult {
    /// Low-confidence results need an operator to confirm the zone.
    pub fn needs_review(&self) -> bool {
        self.confidence < 0.5
    }

    /// Accept the detection as a template placement zone.
    pub fn into_zone(self) -> PlacementZone {
        let (width, height) = self.corners.approx_size();
        PlacementZone {
            corners: self.corners,
            max_dimensions: Some(Size { width, height }),
        }
    }
}

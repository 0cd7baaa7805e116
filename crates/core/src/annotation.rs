//! Annotation types, geometry and validation.
//!
//! Every stored annotation carries a [`Geometry`] whose shape must agree
//! with its [`AnnotationType`]: detections are normalized center boxes,
//! segmentations are normalized polygons. All coordinates live in `[0, 1]`
//! relative to the image; conversion to pixels happens only at export time.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Annotation type string for bounding-box annotations.
pub const ANNOTATION_TYPE_DETECTION: &str = "detection";

/// Annotation type string for polygon annotations.
pub const ANNOTATION_TYPE_SEGMENTATION: &str = "segmentation";

/// All valid annotation type strings.
const VALID_ANNOTATION_TYPES: &[&str] = &[ANNOTATION_TYPE_DETECTION, ANNOTATION_TYPE_SEGMENTATION];

/// A polygon needs at least this many vertices to enclose an area.
pub const MIN_POLYGON_VERTICES: usize = 3;

// ---------------------------------------------------------------------------
// Annotation type
// ---------------------------------------------------------------------------

/// Kind of annotation, and by extension the kind of geometry it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationType {
    Detection,
    Segmentation,
}

impl AnnotationType {
    /// Return the type as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detection => ANNOTATION_TYPE_DETECTION,
            Self::Segmentation => ANNOTATION_TYPE_SEGMENTATION,
        }
    }

    /// Parse an annotation type from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            ANNOTATION_TYPE_DETECTION => Ok(Self::Detection),
            ANNOTATION_TYPE_SEGMENTATION => Ok(Self::Segmentation),
            _ => Err(CoreError::Validation(format!(
                "Invalid annotation type '{s}'. Must be one of: {}",
                VALID_ANNOTATION_TYPES.join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Normalized center-point box: `(x, y)` is the box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CenterBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CenterBox {
    /// The box as corner coordinates.
    pub fn extent(&self) -> Extent {
        Extent {
            min_x: self.x - self.width / 2.0,
            min_y: self.y - self.height / 2.0,
            max_x: self.x + self.width / 2.0,
            max_y: self.y + self.height / 2.0,
        }
    }
}

/// Axis-aligned corner rectangle, in whatever unit the caller works in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Convert back to a center box (same unit).
    pub fn to_center_box(&self) -> CenterBox {
        CenterBox {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
            width: self.width(),
            height: self.height(),
        }
    }

    /// Scale a normalized extent to pixel units.
    pub fn scaled(&self, width: u32, height: u32) -> Extent {
        let (w, h) = (f64::from(width), f64::from(height));
        Extent {
            min_x: self.min_x * w,
            min_y: self.min_y * h,
            max_x: self.max_x * w,
            max_y: self.max_y * h,
        }
    }
}

/// Annotation geometry.
///
/// Serialized untagged so the stored JSON is either a box object
/// (`{"x", "y", "width", "height"}`) or a vertex list (`[[x, y], ...]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    Box(CenterBox),
    Polygon(Vec<[f64; 2]>),
}

impl Geometry {
    /// The annotation type this geometry shape belongs to.
    pub fn annotation_type(&self) -> AnnotationType {
        match self {
            Self::Box(_) => AnnotationType::Detection,
            Self::Polygon(_) => AnnotationType::Segmentation,
        }
    }

    /// Normalized axis-aligned bounding extent. `None` for an empty polygon.
    pub fn extent(&self) -> Option<Extent> {
        match self {
            Self::Box(b) => Some(b.extent()),
            Self::Polygon(points) => polygon_extent(points),
        }
    }

    /// Polygon vertices in pixel units. Empty for boxes.
    pub fn pixel_points(&self, width: u32, height: u32) -> Vec<(f64, f64)> {
        match self {
            Self::Box(_) => Vec::new(),
            Self::Polygon(points) => points
                .iter()
                .map(|[x, y]| (x * f64::from(width), y * f64::from(height)))
                .collect(),
        }
    }
}

/// Axis-aligned extent of a vertex list.
pub fn polygon_extent(points: &[[f64; 2]]) -> Option<Extent> {
    let first = points.first()?;
    let init = Extent {
        min_x: first[0],
        min_y: first[1],
        max_x: first[0],
        max_y: first[1],
    };
    Some(points.iter().fold(init, |acc, [x, y]| Extent {
        min_x: acc.min_x.min(*x),
        min_y: acc.min_y.min(*y),
        max_x: acc.max_x.max(*x),
        max_y: acc.max_y.max(*y),
    }))
}

/// Area of a simple polygon using the shoelace formula.
///
/// Returns `0.0` for fewer than three vertices.
pub fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < MIN_POLYGON_VERTICES {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    (twice / 2.0).abs()
}

/// Clamp a value into `[0, 1]`, mapping NaN to `0`.
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn ensure_unit(name: &str, v: f64) -> Result<(), CoreError> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite value in [0, 1], got {v}"
        )));
    }
    Ok(())
}

/// Validate a confidence score.
pub fn validate_confidence(confidence: f64) -> Result<(), CoreError> {
    ensure_unit("confidence", confidence)
}

/// Validate that a geometry is well formed and matches `annotation_type`.
pub fn validate_annotation(
    annotation_type: AnnotationType,
    geometry: &Geometry,
) -> Result<(), CoreError> {
    if geometry.annotation_type() != annotation_type {
        return Err(CoreError::Validation(format!(
            "{annotation_type} annotation carries {} geometry",
            geometry.annotation_type()
        )));
    }

    match geometry {
        Geometry::Box(b) => {
            ensure_unit("x", b.x)?;
            ensure_unit("y", b.y)?;
            ensure_unit("width", b.width)?;
            ensure_unit("height", b.height)?;
        }
        Geometry::Polygon(points) => {
            if points.len() < MIN_POLYGON_VERTICES {
                return Err(CoreError::Validation(format!(
                    "polygon needs at least {MIN_POLYGON_VERTICES} vertices, got {}",
                    points.len()
                )));
            }
            for (i, [x, y]) in points.iter().enumerate() {
                ensure_unit(&format!("polygon[{i}].x"), *x)?;
                ensure_unit(&format!("polygon[{i}].y"), *y)?;
            }
        }
    }
    Ok(())
}

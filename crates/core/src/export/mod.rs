//! Dataset export encoders.
//!
//! Each encoder turns a fully loaded dataset (images plus their stored
//! annotations) into the files of one annotation format; [`export_dataset`]
//! packs those files into a single zip archive held in memory.
//!
//! All formats share two rules:
//!
//! - class ids come from the sorted, deduplicated set of labels present in
//!   the dataset, never from database order (see [`ClassMap`]);
//! - pixel coordinates use the true image size read from the file header.
//!   An unreadable image degrades that one image, never the archive.

pub mod archive;
pub mod coco;
pub mod cvat;
pub mod labelme;
pub mod yolo;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::annotation::{AnnotationType, Geometry};
use crate::error::CoreError;
use crate::naming::file_stem;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to produce an archive. Per-image read problems are not errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

// ---------------------------------------------------------------------------
// Format
// ---------------------------------------------------------------------------

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Yolo,
    LabelMe,
    Coco,
    Cvat,
}

const VALID_FORMATS: &[&str] = &["yolo", "labelme", "coco", "cvat"];

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yolo => "yolo",
            Self::LabelMe => "labelme",
            Self::Coco => "coco",
            Self::Cvat => "cvat",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s.to_ascii_lowercase().as_str() {
            "yolo" => Ok(Self::Yolo),
            "labelme" => Ok(Self::LabelMe),
            "coco" => Ok(Self::Coco),
            "cvat" => Ok(Self::Cvat),
            _ => Err(CoreError::Validation(format!(
                "Unknown export format '{s}'. Must be one of: {}",
                VALID_FORMATS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A dataset with everything an encoder needs.
#[derive(Debug, Clone)]
pub struct ExportDataset {
    pub name: String,
    pub images: Vec<ExportImage>,
}

#[derive(Debug, Clone)]
pub struct ExportImage {
    /// File name as uploaded, used inside the archive.
    pub file_name: String,
    /// Absolute or working-directory-relative path used to read the header.
    pub path: PathBuf,
    pub annotations: Vec<ExportAnnotation>,
}

#[derive(Debug, Clone)]
pub struct ExportAnnotation {
    pub annotation_type: AnnotationType,
    pub class_label: String,
    pub confidence: f64,
    pub geometry: Geometry,
}

/// One file inside the export archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ExportFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// ---------------------------------------------------------------------------
// Class map
// ---------------------------------------------------------------------------

/// Deterministic label-to-id assignment: labels sorted lexicographically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    labels: Vec<String>,
}

impl ClassMap {
    /// Collect every label present in the dataset.
    pub fn from_dataset(dataset: &ExportDataset) -> Self {
        let labels: BTreeSet<&str> = dataset
            .images
            .iter()
            .flat_map(|img| img.annotations.iter().map(|a| a.class_label.as_str()))
            .collect();
        Self {
            labels: labels.into_iter().map(str::to_string).collect(),
        }
    }

    /// Zero-based id of a label.
    pub fn id(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// Labels in id order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// ---------------------------------------------------------------------------
// Entry names
// ---------------------------------------------------------------------------

/// Archive stem of every image, parallel to `dataset.images`.
///
/// Images whose stems collide (`a.jpg` and `a.png`, or names differing only
/// in case) get a numeric suffix in image order: `a`, `a_1`, `a_2`.
pub fn entry_stems(dataset: &ExportDataset) -> Vec<String> {
    let mut taken = HashSet::new();
    dataset
        .images
        .iter()
        .map(|image| {
            let stem = file_stem(&image.file_name);
            let mut candidate = stem.to_string();
            let mut suffix = 1;
            while !taken.insert(candidate.to_lowercase()) {
                candidate = format!("{stem}_{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Image dimensions
// ---------------------------------------------------------------------------

/// Read an image's pixel size from its header.
///
/// Returns `None` (after logging) when the file is missing or unreadable.
pub fn read_image_size(path: &Path) -> Option<ImageSize> {
    match image::image_dimensions(path) {
        Ok((width, height)) => Some(ImageSize { width, height }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot read image size for export");
            None
        }
    }
}

/// Probe every image of the dataset once, in image order.
pub fn probe_sizes(dataset: &ExportDataset) -> Vec<Option<ImageSize>> {
    dataset.images.iter().map(|img| read_image_size(&img.path)).collect()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Encode a dataset into the files of `format`.
///
/// `sizes` must be parallel to `dataset.images`.
pub fn encode_files(
    dataset: &ExportDataset,
    sizes: &[Option<ImageSize>],
    format: ExportFormat,
) -> Result<Vec<ExportFile>, ExportError> {
    let classes = ClassMap::from_dataset(dataset);
    match format {
        ExportFormat::Yolo => Ok(yolo::encode(dataset, &classes)),
        ExportFormat::LabelMe => labelme::encode(dataset, sizes),
        ExportFormat::Coco => coco::encode(dataset, sizes, &classes),
        ExportFormat::Cvat => cvat::encode(dataset, sizes, &classes),
    }
}

/// Export a dataset as an in-memory zip archive.
///
/// Reads image headers from disk, so call it off the async executor.
pub fn export_dataset(dataset: &ExportDataset, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let sizes = probe_sizes(dataset);
    let files = encode_files(dataset, &sizes, format)?;

    tracing::info!(
        dataset = %dataset.name,
        format = format.as_str(),
        images = dataset.images.len(),
        files = files.len(),
        "Dataset exported"
    );

    archive::build_zip(&files)
}

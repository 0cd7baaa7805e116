//! LabelMe JSON encoder: one document per image, pixel coordinates.

use std::collections::HashMap;

use serde::Serialize;

use crate::annotation::Geometry;

use super::{entry_stems, ExportDataset, ExportError, ExportFile, ImageSize};

/// LabelMe schema version written into each document.
pub const LABELME_VERSION: &str = "5.2.1";

#[derive(Debug, Serialize)]
pub struct LabelMeShape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub group_id: Option<i64>,
    pub shape_type: String,
    pub flags: HashMap<String, bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMeDocument {
    pub version: String,
    pub flags: HashMap<String, bool>,
    pub shapes: Vec<LabelMeShape>,
    pub image_path: String,
    pub image_data: Option<String>,
    pub image_height: u32,
    pub image_width: u32,
}

fn shape(label: &str, geometry: &Geometry, size: ImageSize) -> Option<LabelMeShape> {
    let (shape_type, points) = match geometry {
        Geometry::Box(b) => {
            let e = b.extent().scaled(size.width, size.height);
            ("rectangle", vec![(e.min_x, e.min_y), (e.max_x, e.max_y)])
        }
        Geometry::Polygon(_) => ("polygon", geometry.pixel_points(size.width, size.height)),
    };
    if points.is_empty() {
        return None;
    }
    Some(LabelMeShape {
        label: label.to_string(),
        points,
        group_id: None,
        shape_type: shape_type.to_string(),
        flags: HashMap::new(),
    })
}

/// Build the document for one image.
pub fn document(image: &super::ExportImage, size: ImageSize) -> LabelMeDocument {
    LabelMeDocument {
        version: LABELME_VERSION.to_string(),
        flags: HashMap::new(),
        shapes: image
            .annotations
            .iter()
            .filter_map(|a| shape(&a.class_label, &a.geometry, size))
            .collect(),
        image_path: image.file_name.clone(),
        image_data: None,
        image_height: size.height,
        image_width: size.width,
    }
}

/// Encode the dataset into `{image stem}.json` documents. Images whose size
/// cannot be read are left out.
pub fn encode(
    dataset: &ExportDataset,
    sizes: &[Option<ImageSize>],
) -> Result<Vec<ExportFile>, ExportError> {
    let mut files = Vec::with_capacity(dataset.images.len());

    for ((image, size), stem) in dataset.images.iter().zip(sizes).zip(entry_stems(dataset)) {
        let Some(size) = size.filter(|s| !s.is_degenerate()) else {
            tracing::warn!(file_name = %image.file_name, "Skipping LabelMe document for unreadable image");
            continue;
        };
        let doc = document(image, size);
        files.push(ExportFile::new(
            format!("{stem}.json"),
            serde_json::to_vec_pretty(&doc)?,
        ));
    }

    Ok(files)
}

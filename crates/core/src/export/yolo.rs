//! YOLO (darknet txt) encoder and label decoder.
//!
//! Layout: `classes.txt` with one label per line in id order, plus one
//! `labels/{image stem}.txt` per annotated image holding
//! `class_id cx cy w h` lines in normalized units. Polygons are written as
//! their bounding box.

use crate::annotation::{CenterBox, Geometry};

use super::{entry_stems, ClassMap, ExportDataset, ExportFile};

/// Name of the label mapping file.
pub const CLASSES_FILE: &str = "classes.txt";

/// Directory holding the per-image label files.
pub const LABELS_DIR: &str = "labels";

/// Archive path of the label file for an image stem.
pub fn label_file_name(stem: &str) -> String {
    format!("{LABELS_DIR}/{stem}.txt")
}

/// Format one annotation line.
fn line(class_id: usize, b: &CenterBox) -> String {
    format!(
        "{class_id} {:.6} {:.6} {:.6} {:.6}",
        b.x, b.y, b.width, b.height
    )
}

/// Encode the dataset. YOLO works in normalized units, so image sizes are
/// not needed and unreadable images still get their label files.
pub fn encode(dataset: &ExportDataset, classes: &ClassMap) -> Vec<ExportFile> {
    let mut files = vec![ExportFile::new(CLASSES_FILE, classes.labels().join("\n"))];

    for (image, stem) in dataset.images.iter().zip(entry_stems(dataset)) {
        let lines: Vec<String> = image
            .annotations
            .iter()
            .filter_map(|ann| {
                let class_id = classes.id(&ann.class_label)?;
                let b = match &ann.geometry {
                    Geometry::Box(b) => *b,
                    polygon => polygon.extent()?.to_center_box(),
                };
                Some(line(class_id, &b))
            })
            .collect();

        if lines.is_empty() {
            continue;
        }
        files.push(ExportFile::new(label_file_name(&stem), lines.join("\n")));
    }

    files
}

/// Parse a label file back into `(label, box)` pairs using the class list
/// from `classes.txt`. Malformed lines and unknown ids are skipped.
pub fn parse_labels(classes_txt: &str, label_txt: &str) -> Vec<(String, CenterBox)> {
    let labels: Vec<&str> = classes_txt.lines().map(str::trim).collect();

    label_txt
        .lines()
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let id: usize = parts.next()?.parse().ok()?;
            let nums: Vec<f64> = parts.map(|p| p.parse().ok()).collect::<Option<_>>()?;
            let [x, y, width, height] = nums.as_slice() else {
                return None;
            };
            let label = labels.get(id)?;
            Some((
                label.to_string(),
                CenterBox { x: *x, y: *y, width: *width, height: *height },
            ))
        })
        .collect()
}

//! COCO JSON encoder and decoder.
//!
//! A single `annotations.json` describes the whole dataset. Image ids,
//! annotation ids and category ids all start at 1. Boxes are
//! `[x, y, width, height]` in pixels; polygons are flattened pixel vertex
//! lists and their area comes from the shoelace formula.

use serde::{Deserialize, Serialize};

use crate::annotation::{polygon_area, CenterBox, Geometry};

use super::{ClassMap, ExportDataset, ExportError, ExportFile, ImageSize};

/// Name of the COCO document inside the archive.
pub const COCO_FILE: &str = "annotations.json";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoDocument {
    #[serde(default)]
    pub info: CocoInfo,
    #[serde(default)]
    pub licenses: Vec<serde_json::Value>,
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CocoInfo {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub date_created: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    pub bbox: [f64; 4],
    pub area: f64,
    #[serde(default)]
    pub segmentation: Vec<Vec<f64>>,
    #[serde(default)]
    pub iscrowd: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub supercategory: String,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Build the COCO document. Images with an unreadable size are listed with
/// zero dimensions and contribute no annotations.
pub fn build(dataset: &ExportDataset, sizes: &[Option<ImageSize>], classes: &ClassMap) -> CocoDocument {
    let categories = classes
        .labels()
        .iter()
        .enumerate()
        .map(|(i, name)| CocoCategory {
            id: i as u64 + 1,
            name: name.clone(),
            supercategory: "none".to_string(),
        })
        .collect();

    let mut images = Vec::with_capacity(dataset.images.len());
    let mut annotations = Vec::new();
    let mut next_annotation_id = 1u64;

    for (idx, (image, size)) in dataset.images.iter().zip(sizes).enumerate() {
        let image_id = idx as u64 + 1;
        let size = size.unwrap_or(ImageSize { width: 0, height: 0 });
        images.push(CocoImage {
            id: image_id,
            file_name: image.file_name.clone(),
            width: size.width,
            height: size.height,
        });

        if size.is_degenerate() {
            tracing::warn!(file_name = %image.file_name, "COCO export: image size unknown, annotations omitted");
            continue;
        }

        for ann in &image.annotations {
            let Some(class_id) = classes.id(&ann.class_label) else {
                continue;
            };
            let Some(extent) = ann.geometry.extent() else {
                continue;
            };
            let px = extent.scaled(size.width, size.height);
            let bbox = [px.min_x, px.min_y, px.width(), px.height()];

            let (area, segmentation) = match &ann.geometry {
                Geometry::Box(_) => (px.width() * px.height(), Vec::new()),
                Geometry::Polygon(_) => {
                    let points = ann.geometry.pixel_points(size.width, size.height);
                    let flat = points.iter().flat_map(|(x, y)| [*x, *y]).collect();
                    (polygon_area(&points), vec![flat])
                }
            };

            annotations.push(CocoAnnotation {
                id: next_annotation_id,
                image_id,
                category_id: class_id as u64 + 1,
                bbox,
                area,
                segmentation,
                iscrowd: 0,
                score: Some(ann.confidence),
            });
            next_annotation_id += 1;
        }
    }

    CocoDocument {
        info: CocoInfo {
            description: dataset.name.clone(),
            version: "1.0".to_string(),
            date_created: chrono::Utc::now().to_rfc3339(),
        },
        licenses: Vec::new(),
        images,
        annotations,
        categories,
    }
}

/// Encode the dataset as a single COCO file.
pub fn encode(
    dataset: &ExportDataset,
    sizes: &[Option<ImageSize>],
    classes: &ClassMap,
) -> Result<Vec<ExportFile>, ExportError> {
    let doc = build(dataset, sizes, classes);
    Ok(vec![ExportFile::new(COCO_FILE, serde_json::to_vec_pretty(&doc)?)])
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// One annotation recovered from a COCO document, in normalized units.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAnnotation {
    pub file_name: String,
    pub label: String,
    pub geometry: Geometry,
}

/// Recover `(image, label, normalized geometry)` triples from a COCO document.
///
/// Annotations with a polygon become polygons, the rest become boxes.
/// Annotations on images without a size are skipped.
pub fn decode(json: &[u8]) -> Result<Vec<DecodedAnnotation>, ExportError> {
    let doc: CocoDocument = serde_json::from_slice(json)?;

    let decoded = doc
        .annotations
        .iter()
        .filter_map(|ann| {
            let image = doc.images.iter().find(|i| i.id == ann.image_id)?;
            let category = doc.categories.iter().find(|c| c.id == ann.category_id)?;
            if image.width == 0 || image.height == 0 {
                return None;
            }
            let (w, h) = (f64::from(image.width), f64::from(image.height));

            let geometry = match ann.segmentation.first() {
                Some(flat) if flat.len() >= 6 => Geometry::Polygon(
                    flat.chunks_exact(2).map(|c| [c[0] / w, c[1] / h]).collect(),
                ),
                _ => {
                    let [x, y, bw, bh] = ann.bbox;
                    Geometry::Box(CenterBox {
                        x: (x + bw / 2.0) / w,
                        y: (y + bh / 2.0) / h,
                        width: bw / w,
                        height: bh / h,
                    })
                }
            };

            Some(DecodedAnnotation {
                file_name: image.file_name.clone(),
                label: category.name.clone(),
                geometry,
            })
        })
        .collect();

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn size(width: u32, height: u32) -> Option<ImageSize> {
        Some(ImageSize { width, height })
    }

    #[test]
    fn categories_are_sorted_and_start_at_one() {
        let ds = dataset(vec![image(
            "a.jpg",
            vec![det("dog", 0.5, 0.5, 0.1, 0.1), det("cat", 0.5, 0.5, 0.1, 0.1), det("bird", 0.5, 0.5, 0.1, 0.1)],
        )]);
        let doc = build(&ds, &[size(100, 100)], &ClassMap::from_dataset(&ds));

        let cats: Vec<(u64, &str)> = doc.categories.iter().map(|c| (c.id, c.name.as_str())).collect();
        assert_eq!(cats, vec![(1, "bird"), (2, "cat"), (3, "dog")]);

        let dog = doc.annotations.iter().find(|a| a.id == 1).unwrap();
        assert_eq!(dog.category_id, 3);
    }

    #[test]
    fn annotation_ids_are_global() {
        let ds = dataset(vec![
            image("a.jpg", vec![det("cat", 0.5, 0.5, 0.1, 0.1), det("cat", 0.2, 0.2, 0.1, 0.1)]),
            image("b.jpg", vec![det("cat", 0.5, 0.5, 0.1, 0.1)]),
        ]);
        let doc = build(&ds, &[size(10, 10), size(10, 10)], &ClassMap::from_dataset(&ds));
        let ids: Vec<u64> = doc.annotations.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(doc.annotations[2].image_id, 2);
    }

    #[test]
    fn detection_bbox_and_area_in_pixels() {
        let ds = dataset(vec![image("a.jpg", vec![det("dog", 0.5, 0.5, 0.2, 0.1)])]);
        let doc = build(&ds, &[size(200, 100)], &ClassMap::from_dataset(&ds));
        let ann = &doc.annotations[0];
        let expected = [80.0, 45.0, 40.0, 10.0];
        for (got, want) in ann.bbox.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
        assert!((ann.area - 400.0).abs() < 1e-6);
        assert!(ann.segmentation.is_empty());
    }

    #[test]
    fn segmentation_area_uses_shoelace() {
        // Right triangle with legs 100px and 50px.
        let ds = dataset(vec![image("a.jpg", vec![seg("cat", &[[0.0, 0.0], [0.5, 0.0], [0.0, 0.5]])])]);
        let doc = build(&ds, &[size(200, 100)], &ClassMap::from_dataset(&ds));
        let ann = &doc.annotations[0];
        assert!((ann.area - 2500.0).abs() < 1e-6);
        assert_eq!(ann.segmentation[0], vec![0.0, 0.0, 100.0, 0.0, 0.0, 50.0]);
        assert_eq!(ann.bbox, [0.0, 0.0, 100.0, 50.0]);
    }

    #[test]
    fn unreadable_image_is_listed_without_annotations() {
        let ds = dataset(vec![
            image("a.jpg", vec![det("cat", 0.5, 0.5, 0.1, 0.1)]),
            image("b.jpg", vec![det("cat", 0.5, 0.5, 0.1, 0.1)]),
        ]);
        let doc = build(&ds, &[None, size(10, 10)], &ClassMap::from_dataset(&ds));
        assert_eq!(doc.images.len(), 2);
        assert_eq!((doc.images[0].width, doc.images[0].height), (0, 0));
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].id, 1);
        assert_eq!(doc.annotations[0].image_id, 2);
    }

    #[test]
    fn decode_round_trips_labels_and_geometry() {
        let polygon = [[0.1, 0.1], [0.4, 0.1], [0.4, 0.3], [0.1, 0.35]];
        let ds = dataset(vec![image(
            "a.jpg",
            vec![det("dog", 0.5, 0.5, 0.2, 0.1), seg("cat", &polygon)],
        )]);
        let files = encode(&ds, &[size(640, 480)], &ClassMap::from_dataset(&ds)).unwrap();
        let decoded = decode(&files[0].contents).unwrap();

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].label, "dog");
        match &decoded[0].geometry {
            Geometry::Box(b) => {
                assert!((b.x - 0.5).abs() < 1e-9);
                assert!((b.width - 0.2).abs() < 1e-9);
                assert!((b.height - 0.1).abs() < 1e-9);
            }
            other => panic!("expected box, got {other:?}"),
        }
        assert_eq!(decoded[1].label, "cat");
        match &decoded[1].geometry {
            Geometry::Polygon(points) => {
                assert_eq!(points.len(), polygon.len());
                for (got, want) in points.iter().zip(polygon) {
                    assert!((got[0] - want[0]).abs() < 1e-9 && (got[1] - want[1]).abs() < 1e-9);
                }
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }
}

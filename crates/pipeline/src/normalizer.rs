//! Conversion of raw inference objects into annotation records.

use adaptlabel_core::annotation::{clamp_unit, AnnotationType, CenterBox, Geometry, MIN_POLYGON_VERTICES};
use adaptlabel_core::class_filter::ClassNames;
use adaptlabel_core::error::CoreError;
use adaptlabel_db::models::annotation::NewAnnotation;
use adaptlabel_inference::{DetectedObject, ObjectShape};

/// Normalize model output for an image into annotations of `target` type.
///
/// Coordinates and confidences are clamped into `[0, 1]` and polygons with
/// fewer than three vertices are dropped. A shape that does not match
/// `target`, or a class index missing from `class_names`, makes the whole
/// output unusable.
pub fn normalize(
    objects: &[DetectedObject],
    class_names: &ClassNames,
    target: AnnotationType,
) -> Result<Vec<NewAnnotation>, CoreError> {
    let mut annotations = Vec::with_capacity(objects.len());

    for (idx, object) in objects.iter().enumerate() {
        let class_label = class_names.get(&object.class_index).ok_or_else(|| {
            CoreError::Pipeline(format!(
                "object {idx} has class index {} unknown to the model",
                object.class_index
            ))
        })?;

        let geometry = match (&object.shape, target) {
            (ObjectShape::Box { x, y, width, height }, AnnotationType::Detection) => {
                Geometry::Box(CenterBox {
                    x: clamp_unit(*x),
                    y: clamp_unit(*y),
                    width: clamp_unit(*width),
                    height: clamp_unit(*height),
                })
            }
            (ObjectShape::Polygon { points }, AnnotationType::Segmentation) => {
                if points.len() < MIN_POLYGON_VERTICES {
                    tracing::debug!(object = idx, vertices = points.len(), "Dropping degenerate polygon");
                    continue;
                }
                Geometry::Polygon(points.iter().map(|[x, y]| [clamp_unit(*x), clamp_unit(*y)]).collect())
            }
            (shape, target) => {
                let kind = match shape {
                    ObjectShape::Box { .. } => "box",
                    ObjectShape::Polygon { .. } => "polygon",
                };
                return Err(CoreError::Pipeline(format!(
                    "object {idx} is a {kind} but {target} output was expected"
                )));
            }
        };

        annotations.push(NewAnnotation {
            annotation_type: target,
            class_label: class_label.clone(),
            confidence: clamp_unit(object.confidence),
            geometry,
        });
    }

    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{boxed, polygon};
    use assert_matches::assert_matches;

    fn names() -> ClassNames {
        [(0, "person".to_string()), (16, "dog".to_string())].into_iter().collect()
    }

    #[test]
    fn boxes_become_detections() {
        let out = normalize(&[boxed(16, 0.9, 0.5, 0.5, 0.2, 0.1)], &names(), AnnotationType::Detection).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_label, "dog");
        assert_eq!(out[0].annotation_type, AnnotationType::Detection);
        assert_eq!(
            out[0].geometry,
            Geometry::Box(CenterBox { x: 0.5, y: 0.5, width: 0.2, height: 0.1 })
        );
    }

    #[test]
    fn values_are_clamped() {
        let out = normalize(&[boxed(0, 1.2, 1.01, -0.01, 0.2, 0.1)], &names(), AnnotationType::Detection).unwrap();
        assert_eq!(out[0].confidence, 1.0);
        assert_matches!(out[0].geometry, Geometry::Box(b) if b.x == 1.0 && b.y == 0.0);
    }

    #[test]
    fn degenerate_polygons_are_dropped() {
        let objects = [
            polygon(0, 0.5, &[[0.1, 0.1], [0.2, 0.2]]),
            polygon(16, 0.7, &[[0.1, 0.1], [0.4, 0.1], [0.4, 1.3]]),
        ];
        let out = normalize(&objects, &names(), AnnotationType::Segmentation).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].geometry, Geometry::Polygon(vec![[0.1, 0.1], [0.4, 0.1], [0.4, 1.0]]));
    }

    #[test]
    fn shape_mismatch_is_a_pipeline_error() {
        let err = normalize(&[boxed(0, 0.9, 0.5, 0.5, 0.1, 0.1)], &names(), AnnotationType::Segmentation).unwrap_err();
        assert_matches!(err, CoreError::Pipeline(msg) if msg.contains("box"));
    }

    #[test]
    fn unknown_class_index_is_a_pipeline_error() {
        let err = normalize(&[boxed(3, 0.9, 0.5, 0.5, 0.1, 0.1)], &names(), AnnotationType::Detection).unwrap_err();
        assert_matches!(err, CoreError::Pipeline(_));
    }

    #[test]
    fn empty_output_is_empty() {
        assert!(normalize(&[], &names(), AnnotationType::Detection).unwrap().is_empty());
    }
}

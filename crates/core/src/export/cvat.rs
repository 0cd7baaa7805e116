//! CVAT for images 1.1 XML encoder.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::annotation::Geometry;

use super::{ClassMap, ExportDataset, ExportError, ExportFile, ImageSize};

/// Name of the CVAT document inside the archive.
pub const CVAT_FILE: &str = "annotations.xml";

/// CVAT annotation format version.
pub const CVAT_VERSION: &str = "1.1";

fn fmt2(v: f64) -> String {
    format!("{v:.2}")
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ExportError> {
    writer.write_event(event).map_err(|e| ExportError::Xml(e.into()))
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<(), ExportError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(value)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write_meta<W: Write>(
    writer: &mut Writer<W>,
    dataset: &ExportDataset,
    classes: &ClassMap,
) -> Result<(), ExportError> {
    write(writer, Event::Start(BytesStart::new("meta")))?;
    write(writer, Event::Start(BytesStart::new("task")))?;
    text_element(writer, "name", &dataset.name)?;
    text_element(writer, "size", &dataset.images.len().to_string())?;
    write(writer, Event::Start(BytesStart::new("labels")))?;
    for label in classes.labels() {
        write(writer, Event::Start(BytesStart::new("label")))?;
        text_element(writer, "name", label)?;
        write(writer, Event::End(BytesEnd::new("label")))?;
    }
    write(writer, Event::End(BytesEnd::new("labels")))?;
    write(writer, Event::End(BytesEnd::new("task")))?;
    write(writer, Event::End(BytesEnd::new("meta")))
}

/// Render the whole dataset as one CVAT XML document.
///
/// Coordinates are absolute pixels with two decimals. Images whose size
/// cannot be read are written as 0x0 with no shapes.
pub fn render(
    dataset: &ExportDataset,
    sizes: &[Option<ImageSize>],
    classes: &ClassMap,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write(&mut writer, Event::Start(BytesStart::new("annotations")))?;
    text_element(&mut writer, "version", CVAT_VERSION)?;
    write_meta(&mut writer, dataset, classes)?;

    for (idx, (image, size)) in dataset.images.iter().zip(sizes).enumerate() {
        let size = size.unwrap_or(ImageSize { width: 0, height: 0 });

        let mut start = BytesStart::new("image");
        start.push_attribute(("id", idx.to_string().as_str()));
        start.push_attribute(("name", image.file_name.as_str()));
        start.push_attribute(("width", size.width.to_string().as_str()));
        start.push_attribute(("height", size.height.to_string().as_str()));

        if size.is_degenerate() {
            tracing::warn!(file_name = %image.file_name, "CVAT export: image size unknown, shapes omitted");
            write(&mut writer, Event::Empty(start))?;
            continue;
        }
        write(&mut writer, Event::Start(start))?;

        for ann in &image.annotations {
            if classes.id(&ann.class_label).is_none() {
                continue;
            }
            match &ann.geometry {
                Geometry::Box(b) => {
                    let e = b.extent().scaled(size.width, size.height);
                    let mut el = BytesStart::new("box");
                    el.push_attribute(("label", ann.class_label.as_str()));
                    el.push_attribute(("occluded", "0"));
                    el.push_attribute(("xtl", fmt2(e.min_x).as_str()));
                    el.push_attribute(("ytl", fmt2(e.min_y).as_str()));
                    el.push_attribute(("xbr", fmt2(e.max_x).as_str()));
                    el.push_attribute(("ybr", fmt2(e.max_y).as_str()));
                    write(&mut writer, Event::Empty(el))?;
                }
                Geometry::Polygon(_) => {
                    let points = ann
                        .geometry
                        .pixel_points(size.width, size.height)
                        .iter()
                        .map(|(x, y)| format!("{},{}", fmt2(*x), fmt2(*y)))
                        .collect::<Vec<_>>()
                        .join(";");
                    let mut el = BytesStart::new("polygon");
                    el.push_attribute(("label", ann.class_label.as_str()));
                    el.push_attribute(("occluded", "0"));
                    el.push_attribute(("points", points.as_str()));
                    write(&mut writer, Event::Empty(el))?;
                }
            }
        }

        write(&mut writer, Event::End(BytesEnd::new("image")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("annotations")))?;
    Ok(writer.into_inner())
}

pub fn encode(
    dataset: &ExportDataset,
    sizes: &[Option<ImageSize>],
    classes: &ClassMap,
) -> Result<Vec<ExportFile>, ExportError> {
    Ok(vec![ExportFile::new(CVAT_FILE, render(dataset, sizes, classes)?)])
}

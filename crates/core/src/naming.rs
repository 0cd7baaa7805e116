//! Upload file-name validation and download file naming.
//!
//! Uploaded images and model weights are written under fixed storage roots
//! using the client-supplied file name, so names must not be able to escape
//! their directory.

use crate::error::CoreError;

/// Extensions accepted for custom model weights.
pub const WEIGHTS_EXTENSIONS: &[&str] = &["pt", "pth"];

/// Extensions accepted for dataset images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Maximum length of an uploaded file name.
const MAX_FILE_NAME_LEN: usize = 255;

/// Lowercased extension of a file name, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File name without its final extension.
///
/// ```
/// use adaptlabel_core::naming::file_stem;
///
/// assert_eq!(file_stem("street.01.jpg"), "street.01");
/// assert_eq!(file_stem("README"), "README");
/// ```
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Validate that a client-supplied file name is a single safe path segment.
pub fn validate_upload_name(file_name: &str) -> Result<(), CoreError> {
    if file_name.trim().is_empty() {
        return Err(CoreError::Validation("File name must not be empty".into()));
    }
    if file_name.len() > MAX_FILE_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "File name must not exceed {MAX_FILE_NAME_LEN} characters"
        )));
    }
    if file_name.contains("..") || file_name.contains(['/', '\\', '\0']) {
        return Err(CoreError::Validation(format!("Invalid file name '{file_name}'")));
    }
    Ok(())
}

fn validate_extension(file_name: &str, allowed: &[&str], kind: &str) -> Result<(), CoreError> {
    validate_upload_name(file_name)?;
    match file_extension(file_name) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "Invalid {kind} file '{file_name}'. Allowed extensions: .{}",
            allowed.join(", .")
        ))),
    }
}

/// Validate a custom model weights file name (`.pt` / `.pth`).
pub fn validate_weights_file(file_name: &str) -> Result<(), CoreError> {
    validate_extension(file_name, WEIGHTS_EXTENSIONS, "model weights")
}

/// Validate a dataset image file name.
pub fn validate_image_file(file_name: &str) -> Result<(), CoreError> {
    validate_extension(file_name, IMAGE_EXTENSIONS, "image")
}

/// Attachment file name for a dataset export archive.
///
/// ```
/// use adaptlabel_core::naming::export_archive_name;
///
/// assert_eq!(export_archive_name("Street Scenes", "coco"), "Street_Scenes_coco.zip");
/// ```
pub fn export_archive_name(dataset_name: &str, format: &str) -> String {
    let base: String = dataset_name
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '"' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let base = if base.is_empty() { "dataset".to_string() } else { base };
    format!("{base}_{format}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("Model.PT").as_deref(), Some("pt"));
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn traversal_names_are_rejected() {
        assert_matches!(validate_upload_name("../etc/passwd"), Err(CoreError::Validation(_)));
        assert_matches!(validate_upload_name("a/b.png"), Err(CoreError::Validation(_)));
        assert_matches!(validate_upload_name("a\\b.png"), Err(CoreError::Validation(_)));
        assert_matches!(validate_upload_name("  "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn weights_must_be_pt_or_pth() {
        assert!(validate_weights_file("best.pt").is_ok());
        assert!(validate_weights_file("best.PTH").is_ok());
        assert_matches!(validate_weights_file("best.onnx"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn images_must_have_image_extensions() {
        assert!(validate_image_file("cat.jpeg").is_ok());
        assert!(validate_image_file("cat.webp").is_ok());
        assert!(validate_image_file("cat.txt").is_err());
    }

    #[test]
    fn archive_name_replaces_spaces() {
        assert_eq!(export_archive_name("my set", "yolo"), "my_set_yolo.zip");
        assert_eq!(export_archive_name("  ", "cvat"), "dataset_cvat.zip");
    }

    #[test]
    fn archive_name_replaces_control_characters() {
        assert_eq!(export_archive_name("a\x01b\x7f", "coco"), "a_b__coco.zip");
        assert_eq!(export_archive_name("line\r\nbreak", "yolo"), "line__break_yolo.zip");
        assert_eq!(export_archive_name("Straße", "cvat"), "Straße_cvat.zip");
    }
}

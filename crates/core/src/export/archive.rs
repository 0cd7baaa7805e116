//! In-memory zip packing of export files.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ExportError, ExportFile};

/// Pack files into a deflate-compressed zip archive.
pub fn build_zip(files: &[ExportFile]) -> Result<Vec<u8>, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        writer.start_file(file.name.as_str(), options)?;
        writer.write_all(&file.contents)?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn files_survive_a_round_trip() {
        let files = vec![
            ExportFile::new("classes.txt", "cat\ndog"),
            ExportFile::new("a.txt", "0 0.5 0.5 0.1 0.1"),
        ];
        let bytes = build_zip(&files).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut contents = String::new();
        archive.by_name("classes.txt").unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "cat\ndog");
    }

    #[test]
    fn empty_archive_is_valid() {
        let bytes = build_zip(&[]).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}

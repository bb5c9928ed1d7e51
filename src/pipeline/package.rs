//! Packaging: the downloadable zip archive.
//!
//! ```text
//! report.zip
//! ├── report.docx
//! ├── analysis.md
//! ├── ocr/<stem>.txt      one per image that yielded text
//! └── images/<file>       every source photograph, unmodified
//! ```
//!
//! Phones name photos `IMG_0001.jpg` per device, so two users' uploads often
//! collide. Names are made unique with a numeric suffix (`IMG_0001-2.jpg`)
//! before anything is written.

use super::input::SourceImage;
use crate::error::ReportError;
use crate::output::ImageResult;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const REPORT_ENTRY: &str = "report.docx";
pub const ANALYSIS_ENTRY: &str = "analysis.md";

/// Make every name unique, in order. Repeats get `-2`, `-3`, … before the
/// extension. Path separators are replaced so an entry can't escape its folder.
pub fn unique_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    names
        .into_iter()
        .map(|raw| {
            let name = sanitize(raw);
            let (stem, ext) = split_extension(&name);
            let mut candidate = name.clone();
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{stem}-{n}{ext}");
                n += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "image".to_string(),
        s => s.to_string(),
    }
}

/// `("shelf", ".jpg")`; a leading dot is part of the stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Build the archive in memory.
pub fn build_archive(
    docx: &[u8],
    analysis_markdown: &str,
    images: &[SourceImage],
    results: &[ImageResult],
) -> Result<Vec<u8>, ReportError> {
    let image_names = unique_names(images.iter().map(|i| i.file_name.as_str()));

    let texts: Vec<(usize, &str)> = images
        .iter()
        .enumerate()
        .filter_map(|(i, image)| {
            results
                .iter()
                .find(|r| r.image_num == image.image_num && r.error.is_none())
                .map(|r| (i, r.text.as_str()))
        })
        .collect();
    let stems: Vec<String> = texts
        .iter()
        .map(|(i, _)| format!("{}.txt", split_extension(&image_names[*i]).0))
        .collect();
    let text_names = unique_names(stems.iter().map(String::as_str));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = || {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
    };

    write_entry(&mut zip, REPORT_ENTRY, docx, deflated())?;
    write_entry(&mut zip, ANALYSIS_ENTRY, analysis_markdown.as_bytes(), deflated())?;
    for ((_, text), name) in texts.iter().zip(&text_names) {
        write_entry(&mut zip, &format!("ocr/{name}"), text.as_bytes(), deflated())?;
    }
    for (image, name) in images.iter().zip(&image_names) {
        write_entry(
            &mut zip,
            &format!("images/{name}"),
            &image.bytes,
            deflated().compression_method(CompressionMethod::Stored),
        )?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        "Built archive: {} images, {} text files, {} bytes",
        images.len(),
        text_names.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn write_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<(), ReportError> {
    zip.start_file(name, options)?;
    zip.write_all(bytes)
        .map_err(|e| ReportError::Document(format!("archive entry {name}: {e}")))
}

/// Write `bytes` to `path` atomically: a temp file in the same directory,
/// then rename. A crash mid-write never leaves a truncated archive behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let write_failed = |source| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(bytes).map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn png(name: &str, num: usize) -> SourceImage {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        SourceImage::from_bytes(num, name, bytes).unwrap()
    }

    fn result(num: usize, text: &str) -> ImageResult {
        ImageResult {
            image_num: num,
            file_name: String::new(),
            text: text.into(),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            retries: 0,
            error: None,
        }
    }

    #[test]
    fn unique_names_suffix_repeats() {
        let names = unique_names(["a.jpg", "a.jpg", "b.png", "a.jpg"]);
        assert_eq!(names, vec!["a.jpg", "a-2.jpg", "b.png", "a-3.jpg"]);
    }

    #[test]
    fn unique_names_skip_existing_suffix() {
        let names = unique_names(["a-2.jpg", "a.jpg", "a.jpg"]);
        assert_eq!(names, vec!["a-2.jpg", "a.jpg", "a-3.jpg"]);
    }

    #[test]
    fn unique_names_without_extension_and_separators() {
        let names = unique_names(["README", "README", "../x.png", ".hidden"]);
        assert_eq!(names, vec!["README", "README-2", ".._x.png", ".hidden"]);
    }

    #[test]
    fn archive_layout() {
        let images = vec![png("shelf.png", 1), png("shelf.png", 2), png("end.png", 3)];
        let mut failed = result(3, "");
        failed.error = Some(crate::error::ImageError::NoText { image: 3 });
        let results = vec![result(1, "Dior -20%"), result(2, "Chanel 2+1"), failed];

        let bytes = build_archive(b"docx", "# Report\n", &images, &results).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "analysis.md",
                "images/end.png",
                "images/shelf-2.png",
                "images/shelf.png",
                "ocr/shelf-2.txt",
                "ocr/shelf.txt",
                "report.docx",
            ]
        );

        let mut text = String::new();
        archive
            .by_name("ocr/shelf-2.txt")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "Chanel 2+1");
    }

    #[test]
    fn write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let path = out.join("report.zip");
        write_atomic(&path, b"zip").unwrap();
        write_atomic(&path, b"zip2").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"zip2");
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }
}

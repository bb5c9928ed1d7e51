//! Input resolution: read user-supplied photographs and validate them.
//!
//! Every file is sniffed by its magic bytes, not its extension: phones and
//! messaging apps happily save WEBP data as `.jpg`. Dimensions are read from
//! the header only, so validating a 12 MP photo doesn't decode it.

use crate::error::ReportError;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Formats accepted as input.
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// A validated input photograph held in memory.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// 1-indexed position in the input list.
    pub image_num: usize,
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    /// Validate raw bytes that did not come from disk (e.g. an upload).
    pub fn from_bytes(
        image_num: usize,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ReportError> {
        let file_name = file_name.into();
        let path = PathBuf::from(&file_name);
        let format = sniff_format(&path, &bytes)?;
        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), format)
            .into_dimensions()
            .map_err(|e| ReportError::CorruptImage {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            image_num,
            path,
            file_name,
            bytes,
            format,
            width,
            height,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        mime_type(self.format)
    }

    /// Canonical file extension for the detected format.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

pub fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        _ => "application/octet-stream",
    }
}

fn sniff_format(path: &Path, bytes: &[u8]) -> Result<ImageFormat, ReportError> {
    match image::guess_format(bytes) {
        Ok(format) if SUPPORTED_FORMATS.contains(&format) => Ok(format),
        _ => Err(ReportError::NotAnImage {
            path: path.to_path_buf(),
            magic: bytes.iter().take(8).copied().collect(),
        }),
    }
}

/// Read and validate one image file.
pub fn load_image(path: &Path, image_num: usize) -> Result<SourceImage, ReportError> {
    if !path.exists() {
        return Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReportError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ReportError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("image{image_num}"));

    let mut image = SourceImage::from_bytes(image_num, file_name, bytes)?;
    image.path = path.to_path_buf();

    debug!(
        "Loaded image {}: {} ({:?}, {}x{})",
        image_num,
        path.display(),
        image.format,
        image.width,
        image.height
    );
    Ok(image)
}

/// Read and validate every input path, in order.
///
/// Fails on the first unreadable or non-image file: a report silently missing
/// one of the photos the user picked is worse than an error.
pub fn load_images<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourceImage>, ReportError> {
    if paths.is_empty() {
        return Err(ReportError::NoImages);
    }
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| load_image(p.as_ref(), i + 1))
        .collect()
}

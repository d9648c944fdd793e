//! Media processor: classify, validate and derive presentation variants.
//!
//! ## Presets
//!
//! | Preset | Bounds | Notes |
//! |---|---|---|
//! | `thumbnail` | 300×200 | fit within, never upscaled |
//! | `medium` | 800×600 | |
//! | `large` | 1200×900 | |
//! | `original` | none | re-encoded at source size |
//!
//! Each derivative is written as `<file name>_<preset>.jpg` (for example
//! `garden.png_medium.jpg`) at the configured JPEG quality. Orientation is
//! corrected and transparency flattened onto white by the backend. There is
//! no change detection: deriving again overwrites.

use crate::imaging::{
    self, BackendError, ImageBackend, Quality, SizePreset, create_preset_images,
    supported_input_extensions,
};
use crate::types::MediaKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "webm"];

/// 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const MIN_DIMENSIONS: (u32, u32) = (100, 100);
/// Above this an image is accepted with a warning.
pub const MAX_DIMENSIONS: (u32, u32) = (8000, 8000);

/// Subdirectory of a property's media directory holding derivatives, so a
/// derivative never shares a name with an attached original.
pub const DERIVED_DIR: &str = "derived";

pub const PRESETS: [SizePreset; 4] = [
    SizePreset::fit("thumbnail", 300, 200),
    SizePreset::fit("medium", 800, 600),
    SizePreset::fit("large", 1200, 900),
    SizePreset::original("original"),
];

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported media file: {0}")]
    Unsupported(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Classify by extension alone, case-insensitively.
pub fn classify(path: &Path) -> MediaKind {
    match extension(path) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
        _ => MediaKind::Other,
    }
}

/// Facts gathered while validating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub size_bytes: u64,
    pub kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Option<FileInfo>,
}

/// Structural checks on one file. Never fails; problems land in the report.
pub fn validate(backend: &impl ImageBackend, path: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        path: path.to_path_buf(),
        valid: false,
        errors: Vec::new(),
        warnings: Vec::new(),
        info: None,
    };

    let metadata = match fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => {
            report.errors.push("File does not exist".to_string());
            return report;
        }
    };

    let size_bytes = metadata.len();
    let kind = classify(path);
    let mut info = FileInfo {
        size_bytes,
        kind,
        dimensions: None,
    };

    if size_bytes > MAX_FILE_SIZE {
        report.errors.push(format!(
            "File size ({:.1}MB) exceeds maximum ({}MB)",
            size_bytes as f64 / (1024.0 * 1024.0),
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }

    match kind {
        MediaKind::Other => report.errors.push("Unsupported file format".to_string()),
        MediaKind::Video => {}
        MediaKind::Image => match imaging::get_dimensions(backend, path) {
            Ok((width, height)) => {
                info.dimensions = Some((width, height));
                if width < MIN_DIMENSIONS.0 || height < MIN_DIMENSIONS.1 {
                    report.errors.push(format!(
                        "Image dimensions ({}x{}) too small (minimum {}x{})",
                        width, height, MIN_DIMENSIONS.0, MIN_DIMENSIONS.1
                    ));
                }
                if width > MAX_DIMENSIONS.0 || height > MAX_DIMENSIONS.1 {
                    report.warnings.push(format!(
                        "Image dimensions ({}x{}) very large (recommended max {}x{})",
                        width, height, MAX_DIMENSIONS.0, MAX_DIMENSIONS.1
                    ));
                }
            }
            Err(e) => report.errors.push(format!("Unreadable image: {}", e)),
        },
    }

    report.info = Some(info);
    report.valid = report.errors.is_empty();
    report
}

/// Preset name to written file.
pub type Derivatives = BTreeMap<String, PathBuf>;

fn original_only(path: &Path) -> Derivatives {
    BTreeMap::from([("original".to_string(), path.to_path_buf())])
}

/// Write every preset of an image into `output_dir`.
///
/// Non-images (including images whose decoder is not compiled in) come back
/// as `{original: path}` without touching the disk.
pub fn derive(
    backend: &impl ImageBackend,
    path: &Path,
    output_dir: &Path,
    quality: Quality,
) -> Result<Derivatives, MediaError> {
    if !path.is_file() {
        return Err(MediaError::NotFound(path.to_path_buf()));
    }
    let decodable = extension(path)
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()));
    if classify(path) != MediaKind::Image || !decodable {
        return Ok(original_only(path));
    }

    fs::create_dir_all(output_dir)?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MediaError::Unsupported(path.to_path_buf()))?;
    let dims = imaging::get_dimensions(backend, path)?;
    let derived = create_preset_images(backend, path, output_dir, name, dims, &PRESETS, quality)?;

    Ok(derived
        .into_iter()
        .map(|d| (d.preset.to_string(), output_dir.join(d.file_name)))
        .collect())
}

/// [`derive`], degrading any failure to `{original: path}` with a warning.
pub fn derive_or_original(
    backend: &impl ImageBackend,
    path: &Path,
    output_dir: &Path,
    quality: Quality,
) -> Derivatives {
    derive(backend, path, output_dir, quality).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "image processing failed, keeping original only");
        original_only(path)
    })
}

/// Derive every image in `paths`. Non-images are skipped.
///
/// One file failing never stops the batch.
pub fn derive_batch(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    output_dir: &Path,
    quality: Quality,
) -> BTreeMap<PathBuf, Derivatives> {
    paths
        .iter()
        .filter(|path| {
            let is_image = classify(path) == MediaKind::Image;
            if !is_image {
                tracing::debug!(path = %path.display(), "skipping non-image file");
            }
            is_image
        })
        .map(|path| {
            (
                path.clone(),
                derive_or_original(backend, path, output_dir, quality),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // classify tests
    // =========================================================================

    #[test]
    fn classify_by_extension() {
        assert_eq!(classify(Path::new("a/b/house.JPG")), MediaKind::Image);
        assert_eq!(classify(Path::new("plan.webp")), MediaKind::Image);
        assert_eq!(classify(Path::new("tour.mov")), MediaKind::Video);
        assert_eq!(classify(Path::new("notes.pdf")), MediaKind::Other);
        assert_eq!(classify(Path::new("README")), MediaKind::Other);
    }

    // =========================================================================
    // validate tests
    // =========================================================================

    #[test]
    fn validate_missing_file() {
        let report = validate(&MockBackend::new(), Path::new("/nonexistent/x.jpg"));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["File does not exist"]);
        assert!(report.info.is_none());
    }

    #[test]
    fn validate_good_image() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "front.jpg", 10);
        let backend = MockBackend::with_dimensions(vec![dims(1600, 1200)]);

        let report = validate(&backend, &path);
        assert!(report.valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.info.unwrap().dimensions, Some((1600, 1200)));
    }

    #[test]
    fn validate_small_image_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "icon.png", 10);
        let backend = MockBackend::with_dimensions(vec![dims(64, 300)]);

        let report = validate(&backend, &path);
        assert!(!report.valid);
        assert!(report.errors[0].contains("too small"));
    }

    #[test]
    fn validate_huge_image_is_warning() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "pano.jpg", 10);
        let backend = MockBackend::with_dimensions(vec![dims(12000, 3000)]);

        let report = validate(&backend, &path);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn validate_unsupported_format() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "brochure.pdf", 10);

        let report = validate(&MockBackend::new(), &path);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Unsupported file format"]);
    }

    #[test]
    fn validate_video_needs_no_decoding() {
        let tmp = TempDir::new().unwrap();
        let path = touch(tmp.path(), "walkthrough.mp4", 10);
        let backend = MockBackend::new();

        let report = validate(&backend, &path);
        assert!(report.valid);
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // derive tests
    // =========================================================================

    #[test]
    fn derive_writes_four_presets() {
        let tmp = TempDir::new().unwrap();
        let source = touch(tmp.path(), "garden.jpg", 10);
        let out = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(vec![dims(4000, 3000)]);

        let derived = derive(&backend, &source, &out, Quality::default()).unwrap();

        assert_eq!(
            derived.keys().map(String::as_str).collect::<Vec<_>>(),
            ["large", "medium", "original", "thumbnail"]
        );
        assert_eq!(derived["medium"], out.join("garden.jpg_medium.jpg"));
        assert!(derived.values().all(|p| p.exists()));

        let resizes: Vec<_> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize { width, height, .. } => Some((width, height)),
                _ => None,
            })
            .collect();
        assert_eq!(resizes, vec![(267, 200), (800, 600), (1200, 900), (4000, 3000)]);
    }

    #[test]
    fn derive_non_image_returns_original() {
        let tmp = TempDir::new().unwrap();
        let source = touch(tmp.path(), "tour.mp4", 10);
        let backend = MockBackend::new();

        let derived = derive(&backend, &source, tmp.path(), Quality::default()).unwrap();
        assert_eq!(derived, original_only(&source));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn derive_missing_file_is_error() {
        let result = derive(
            &MockBackend::new(),
            Path::new("/nonexistent/a.jpg"),
            Path::new("/tmp"),
            Quality::default(),
        );
        assert!(matches!(result, Err(MediaError::NotFound(_))));
    }

    #[test]
    fn batch_degrades_failures_and_skips_non_images() {
        let tmp = TempDir::new().unwrap();
        let good = touch(tmp.path(), "good.jpg", 10);
        let bad = touch(tmp.path(), "bad.jpg", 10);
        let video = touch(tmp.path(), "tour.mp4", 10);
        // Only one set of dimensions: the second identify fails
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);

        let results = derive_batch(
            &backend,
            &[good.clone(), bad.clone(), video.clone()],
            &tmp.path().join("out"),
            Quality::default(),
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[&good].len(), 4);
        assert_eq!(results[&bad], original_only(&bad));
        assert!(!results.contains_key(&video));
    }
}

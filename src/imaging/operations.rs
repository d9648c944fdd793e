//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_thumbnail_dimensions, exceeds_bounds, fit_within};
use super::params::{Quality, ResizeParams, Sharpening, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// A named target size. `bounds: None` re-encodes at the source dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePreset {
    pub name: &'static str,
    pub bounds: Option<(u32, u32)>,
}

impl SizePreset {
    pub const fn fit(name: &'static str, width: u32, height: u32) -> Self {
        Self {
            name,
            bounds: Some((width, height)),
        }
    }

    pub const fn original(name: &'static str) -> Self {
        Self { name, bounds: None }
    }

    /// Output dimensions for a source of the given size.
    pub fn target_for(&self, original: (u32, u32)) -> (u32, u32) {
        match self.bounds {
            Some(bounds) => fit_within(original, bounds),
            None => original,
        }
    }
}

/// One derivative written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedImage {
    pub preset: &'static str,
    /// File name inside the output directory, e.g. `kitchen.png_medium.jpg`.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

/// Derivative file name: `<source file name>_<preset>.jpg`.
///
/// Keyed on the whole source name, so `front.jpg` and `front.png` never
/// share a derivative. Preset names contain no `_`, which keeps the mapping
/// one-to-one.
pub fn derived_file_name(source_name: &str, preset: &str) -> String {
    format!("{}_{}.jpg", source_name, preset)
}

fn write_derivative(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    source_name: &str,
    preset: &SizePreset,
    (width, height): (u32, u32),
    quality: Quality,
) -> Result<DerivedImage> {
    let file_name = derived_file_name(source_name, preset.name);
    backend.resize(&ResizeParams {
        source: source.to_path_buf(),
        output: output_dir.join(&file_name),
        width,
        height,
        quality,
    })?;
    Ok(DerivedImage {
        preset: preset.name,
        file_name,
        width,
        height,
    })
}

/// Create one derivative per preset, unconditionally.
///
/// Presets fit the source inside their bounds without upscaling, so a small
/// source produces several derivatives at its own size.
pub fn create_preset_images(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    source_name: &str,
    original_dims: (u32, u32),
    presets: &[SizePreset],
    quality: Quality,
) -> Result<Vec<DerivedImage>> {
    presets
        .iter()
        .map(|preset| {
            let target = preset.target_for(original_dims);
            write_derivative(backend, source, output_dir, source_name, preset, target, quality)
        })
        .collect()
}

/// Create derivatives only for caps the source actually exceeds.
pub fn create_capped_images(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    source_name: &str,
    original_dims: (u32, u32),
    caps: &[SizePreset],
    quality: Quality,
) -> Result<Vec<DerivedImage>> {
    caps.iter()
        .filter(|cap| {
            cap.bounds
                .is_some_and(|bounds| exceeds_bounds(original_dims, bounds))
        })
        .map(|cap| {
            let target = cap.target_for(original_dims);
            write_derivative(backend, source, output_dir, source_name, cap, target, quality)
        })
        .collect()
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub aspect: (u32, u32),
    pub short_edge: u32,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            aspect: (3, 2),
            short_edge: 200,
            quality: Quality::default(),
            sharpening: Some(Sharpening::light()),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output_path: &Path,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (crop_w, crop_h) = calculate_thumbnail_dimensions(config.aspect, config.short_edge);

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        crop_width: crop_w,
        crop_height: crop_h,
        quality: config.quality,
        sharpening: config.sharpening,
    }
}

/// Create a fixed-size thumbnail: fill the target aspect ratio, then center-crop.
///
/// Written as `<output_dir>/<source name>_thumbnail.jpg`; returns the file name.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    source_name: &str,
    config: &ThumbnailConfig,
) -> Result<String> {
    let thumb_name = derived_file_name(source_name, "thumbnail");
    let params = plan_thumbnail(source, &output_dir.join(&thumb_name), config);
    backend.thumbnail(&params)?;
    Ok(thumb_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    const PRESETS: &[SizePreset] = &[
        SizePreset::fit("thumbnail", 300, 200),
        SizePreset::fit("medium", 800, 600),
        SizePreset::original("original"),
    ];

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn plan_thumbnail_uses_card_dimensions() {
        let params = plan_thumbnail(
            Path::new("/source.jpg"),
            Path::new("/thumb.jpg"),
            &ThumbnailConfig::default(),
        );

        assert_eq!(params.crop_width, 300);
        assert_eq!(params.crop_height, 200);
    }

    #[test]
    fn create_thumbnail_uses_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();

        let name = create_thumbnail(
            &backend,
            Path::new("/source.png"),
            tmp.path(),
            "living-room.png",
            &ThumbnailConfig::default(),
        )
        .unwrap();

        assert_eq!(name, "living-room.png_thumbnail.jpg");
        assert!(tmp.path().join("living-room.png_thumbnail.jpg").exists());
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Thumbnail {
                crop_width: 300,
                crop_height: 200,
                ..
            }
        ));
    }

    #[test]
    fn derived_names_distinguish_extensions() {
        assert_ne!(
            derived_file_name("front.jpg", "medium"),
            derived_file_name("front.png", "medium")
        );
        assert_eq!(derived_file_name("front.png", "large"), "front.png_large.jpg");
    }

    #[test]
    fn preset_images_always_written() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();

        let derived = create_preset_images(
            &backend,
            Path::new("/source.jpg"),
            tmp.path(),
            "facade.jpg",
            (640, 480),
            PRESETS,
            Quality::default(),
        )
        .unwrap();

        assert_eq!(derived.len(), 3);
        assert_eq!(derived[0].file_name, "facade.jpg_thumbnail.jpg");
        assert_eq!((derived[0].width, derived[0].height), (267, 200));
        // medium does not upscale a 640x480 source
        assert_eq!((derived[1].width, derived[1].height), (640, 480));
        assert_eq!(derived[2].preset, "original");
    }

    #[test]
    fn capped_images_skip_caps_not_exceeded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let caps = [
            SizePreset::fit("small", 800, 600),
            SizePreset::fit("medium", 1200, 900),
            SizePreset::fit("large", 1920, 1440),
        ];

        let derived = create_capped_images(
            &backend,
            Path::new("/source.jpg"),
            tmp.path(),
            "garden.jpg",
            (1000, 750),
            &caps,
            Quality::new(80),
        )
        .unwrap();

        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].preset, "small");
        assert_eq!(backend.get_operations().len(), 1);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Resize { width: 800, height: 600, quality: 80, .. }
        ));
    }

    #[test]
    fn capped_images_empty_for_small_source() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();
        let caps = [SizePreset::fit("small", 800, 600)];

        let derived = create_capped_images(
            &backend,
            Path::new("/source.jpg"),
            tmp.path(),
            "tiny.jpg",
            (320, 240),
            &caps,
            Quality::default(),
        )
        .unwrap();

        assert!(derived.is_empty());
        assert!(backend.get_operations().is_empty());
    }
}

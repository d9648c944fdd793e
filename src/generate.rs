//! Static site generation.
//!
//! Turns one property record plus a template into a self-contained website.
//!
//! ## Output Structure
//!
//! ```text
//! sites/<output_name>/
//! ├── index.html
//! ├── gallery.html
//! ├── contact.html
//! ├── details.html
//! ├── robots.txt
//! ├── sitemap.xml
//! ├── css/style.css          # template assets, or the compiled-in defaults
//! ├── js/script.js
//! └── media/
//!     ├── images/            # originals
//!     │   └── sized/         # <file name>_{small,medium,large}.jpg
//!     ├── thumbnails/        # <file name>_thumbnail.jpg, 300x200 centre crop
//!     └── videos/
//! ```
//!
//! ## Run
//!
//! Preparing → processing media → rendering pages → copying assets →
//! finalizing → done. An unknown template id fails before anything touches
//! the disk. A page that cannot be rendered becomes the fallback page; any
//! other failure removes the output directory and returns the error.
//!
//! Two runs targeting the same output name at the same time are not
//! coordinated.
//!
//! ## CSS and JavaScript
//!
//! Default assets are embedded at compile time from `static/`: a base
//! stylesheet plus one variant per built-in style, and a script for smooth
//! scrolling, lazy images, the gallery overlay and the mortgage calculator.

use crate::config::Settings;
use crate::fsutil::copy_dir_recursive;
use crate::imaging::{
    BackendError, ImageBackend, Quality, SizePreset, ThumbnailConfig, create_capped_images,
    create_thumbnail, get_dimensions,
};
use crate::render::{
    Features, Page, PageOutcome, PageRenderer, RenderContext, SiteImage, SiteVideo,
};
use crate::templates::TemplateRegistry;
use crate::types::{MediaKind, PropertyRecord, Template, TemplateStyle};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

const BASE_CSS: &str = include_str!("../static/css/base.css");
const MODERN_CSS: &str = include_str!("../static/css/modern.css");
const LUXURY_CSS: &str = include_str!("../static/css/luxury.css");
const MINIMAL_CSS: &str = include_str!("../static/css/minimal.css");
const BOLD_CSS: &str = include_str!("../static/css/bold.css");
const SCRIPT_JS: &str = include_str!("../static/js/script.js");

/// Template asset directories copied into the site.
pub const ASSET_DIRS: [&str; 4] = ["css", "js", "images", "fonts"];

const ROBOTS_TXT: &str = "User-agent: *\nAllow: /\n\nSitemap: sitemap.xml\n";

/// (page, change frequency, priority)
const SITEMAP_ENTRIES: [(Page, &str, &str); 4] = [
    (Page::Index, "weekly", "1.0"),
    (Page::Gallery, "weekly", "0.8"),
    (Page::Contact, "monthly", "0.6"),
    (Page::Details, "weekly", "0.7"),
];

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Invalid output name: {0:?}")]
    InvalidOutputName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    ProcessingMedia,
    RenderingPages,
    CopyingAssets,
    Finalizing,
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Preparing => "preparing",
            Stage::ProcessingMedia => "processing media",
            Stage::RenderingPages => "rendering pages",
            Stage::CopyingAssets => "copying assets",
            Stage::Finalizing => "finalizing",
            Stage::Done => "done",
        }
    }
}

/// Progress reported while a run is underway.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateEvent {
    Stage {
        stage: Stage,
        percent: u8,
        message: String,
    },
    Page {
        page: Page,
        outcome: PageOutcome,
    },
}

/// Per-run choices. `None` fields take the generator's defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub features: Features,
    pub quality: Option<Quality>,
    pub max_image_size: Option<u32>,
    pub lang: Option<String>,
}

/// Defaults applied when [`GenerateOptions`] leaves a field unset.
#[derive(Debug, Clone)]
pub struct SiteDefaults {
    pub quality: Quality,
    /// Width bound of the `large` derivative; its height bound is three quarters of it.
    pub max_image_size: u32,
    pub lang: String,
}

impl Default for SiteDefaults {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            max_image_size: 1920,
            lang: "en".to_string(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GeneratedSite {
    pub root: PathBuf,
    pub template_id: String,
    pub pages: Vec<(Page, PageOutcome)>,
    pub media_copied: usize,
}

impl GeneratedSite {
    pub fn fallback_pages(&self) -> impl Iterator<Item = Page> + '_ {
        self.pages
            .iter()
            .filter(|(_, outcome)| outcome.is_fallback())
            .map(|(page, _)| *page)
    }
}

/// Optional progress channel. Send failures (receiver gone) are ignored.
struct Progress(Option<Sender<GenerateEvent>>);

impl Progress {
    fn stage(&self, stage: Stage, percent: u8, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(stage = stage.label(), percent, %message);
        if let Some(tx) = &self.0 {
            let _ = tx.send(GenerateEvent::Stage {
                stage,
                percent,
                message,
            });
        }
    }

    fn page(&self, page: Page, outcome: &PageOutcome) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(GenerateEvent::Page {
                page,
                outcome: outcome.clone(),
            });
        }
    }
}

/// Output names are a single plain directory name.
fn validate_output_name(name: &str) -> Result<(), GenerateError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(GenerateError::InvalidOutputName(name.to_string())),
    }
}

/// Run `build`; if it fails, remove `root` before returning the error.
fn with_cleanup<T>(
    root: &Path,
    build: impl FnOnce() -> Result<T, GenerateError>,
) -> Result<T, GenerateError> {
    let result = build();
    if result.is_err()
        && root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(root = %root.display(), error = %e, "could not remove partial output");
    }
    result
}

fn style_css(style: TemplateStyle) -> Option<&'static str> {
    match style {
        TemplateStyle::Modern => Some(MODERN_CSS),
        TemplateStyle::Luxury => Some(LUXURY_CSS),
        TemplateStyle::Minimal => Some(MINIMAL_CSS),
        TemplateStyle::Bold => Some(BOLD_CSS),
        TemplateStyle::Custom => None,
    }
}

/// Compiled-in stylesheet for a style: base rules plus the style's variant.
pub fn default_css(style: TemplateStyle) -> String {
    match style_css(style) {
        Some(variant) => format!("{}\n{}", BASE_CSS, variant),
        None => BASE_CSS.to_string(),
    }
}

pub fn sitemap_xml() -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (page, changefreq, priority) in SITEMAP_ENTRIES {
        xml.push_str(&format!(
            "    <url>\n        <loc>{}</loc>\n        <changefreq>{}</changefreq>\n        <priority>{}</priority>\n    </url>\n",
            page.file_name(),
            changefreq,
            priority
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Subdirectory of `media/images` holding the capped derivatives.
pub const SIZED_DIR: &str = "sized";

/// `name`, or `<n>-<name>` with the first free `n` when an earlier
/// attachment already took it.
fn site_file_name(taken: &mut HashSet<String>, name: &str) -> String {
    let mut candidate = name.to_string();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{}-{}", n, name);
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Site-size caps: derivatives are written only for caps the source exceeds.
fn site_caps(max_image_size: u32) -> [SizePreset; 3] {
    [
        SizePreset::fit("small", 800, 600),
        SizePreset::fit("medium", 1200, 900),
        // Three quarters of any u32 fits back in a u32
        SizePreset::fit("large", max_image_size, (u64::from(max_image_size) * 3 / 4) as u32),
    ]
}

pub struct SiteGenerator<B: ImageBackend> {
    backend: B,
    registry: TemplateRegistry,
    output_dir: PathBuf,
    projects_dir: PathBuf,
    defaults: SiteDefaults,
}

impl<B: ImageBackend> SiteGenerator<B> {
    pub fn new(
        backend: B,
        registry: TemplateRegistry,
        output_dir: impl Into<PathBuf>,
        projects_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            registry,
            output_dir: output_dir.into(),
            projects_dir: projects_dir.into(),
            defaults: SiteDefaults::default(),
        }
    }

    /// Generator configured from settings, with templates loaded from disk.
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        Self::new(
            backend,
            TemplateRegistry::load(&settings.paths.templates_dir),
            &settings.paths.output_dir,
            &settings.paths.projects_dir,
        )
        .with_defaults(SiteDefaults {
            quality: Quality::new(settings.images.quality),
            max_image_size: settings.images.max_image_size,
            lang: settings.language.clone(),
        })
    }

    pub fn with_defaults(mut self, defaults: SiteDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn output_root(&self, output_name: &str) -> PathBuf {
        self.output_dir.join(output_name)
    }

    /// Generate `<output_dir>/<output_name>` for `record` with `template_id`.
    pub fn generate(
        &self,
        record: &PropertyRecord,
        template_id: &str,
        output_name: &str,
        options: &GenerateOptions,
        events: Option<Sender<GenerateEvent>>,
    ) -> Result<GeneratedSite, GenerateError> {
        let template = self
            .registry
            .get(template_id)
            .ok_or_else(|| GenerateError::UnknownTemplate(template_id.to_string()))?;
        validate_output_name(output_name)?;

        let progress = Progress(events);
        let root = self.output_root(output_name);
        progress.stage(Stage::Preparing, 10, format!("Preparing {}", root.display()));

        if root.exists() {
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;

        let site = with_cleanup(&root, || {
            self.build(record, template, &root, options, &progress)
        })?;
        tracing::info!(
            id = record.id,
            template = %template.id,
            root = %site.root.display(),
            media = site.media_copied,
            "site generated"
        );
        Ok(site)
    }

    fn build(
        &self,
        record: &PropertyRecord,
        template: &Template,
        root: &Path,
        options: &GenerateOptions,
        progress: &Progress,
    ) -> Result<GeneratedSite, GenerateError> {
        let lang = options.lang.as_deref().unwrap_or(&self.defaults.lang);
        let mut context = RenderContext::new(record.clone(), lang, options.features, Utc::now());

        let media_copied = self.process_media(&mut context, root, options, progress)?;

        let renderer = PageRenderer::new(template, &context)?;
        let mut pages = Vec::with_capacity(Page::ALL.len());
        for (i, page) in Page::ALL.into_iter().enumerate() {
            let percent = 40 + (30 * i / Page::ALL.len()) as u8;
            progress.stage(Stage::RenderingPages, percent, format!("Rendering {}", page.file_name()));
            let rendered = renderer.render(page);
            fs::write(root.join(page.file_name()), &rendered.html)?;
            progress.page(page, &rendered.outcome);
            pages.push((page, rendered.outcome));
        }

        progress.stage(Stage::CopyingAssets, 70, "Copying assets");
        copy_template_assets(template, root)?;

        progress.stage(Stage::Finalizing, 90, "Writing robots.txt and sitemap.xml");
        fs::write(root.join("robots.txt"), ROBOTS_TXT)?;
        fs::write(root.join("sitemap.xml"), sitemap_xml())?;

        progress.stage(Stage::Done, 100, "Done");
        Ok(GeneratedSite {
            root: root.to_path_buf(),
            template_id: template.id.clone(),
            pages,
            media_copied,
        })
    }

    /// Copy every attached file into `media/` and derive site sizes for images.
    ///
    /// Returns how many files were copied.
    fn process_media(
        &self,
        context: &mut RenderContext,
        root: &Path,
        options: &GenerateOptions,
        progress: &Progress,
    ) -> Result<usize, GenerateError> {
        let images_dir = root.join("media/images");
        let sized_dir = images_dir.join(SIZED_DIR);
        let thumbs_dir = root.join("media/thumbnails");
        let videos_dir = root.join("media/videos");
        for dir in [&images_dir, &sized_dir, &thumbs_dir, &videos_dir] {
            fs::create_dir_all(dir)?;
        }

        let quality = options.quality.unwrap_or(self.defaults.quality);
        let caps = site_caps(options.max_image_size.unwrap_or(self.defaults.max_image_size));
        let thumbnail = ThumbnailConfig {
            quality,
            ..ThumbnailConfig::default()
        };

        let media = context.record.property.media.clone();
        let total = media.len();
        let mut copied = 0;
        let mut taken = HashSet::new();
        for (i, descriptor) in media.iter().enumerate() {
            let percent = 20 + (20 * i / total) as u8;
            let filename = descriptor.filename();
            progress.stage(Stage::ProcessingMedia, percent, format!("Processing {}", filename));

            let source = descriptor.source_path(&self.projects_dir);
            // Only the final component, so a stored name can never escape media/
            let Some(name) = Path::new(filename).file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !source.is_file() {
                tracing::warn!(path = %source.display(), "media file missing, skipping");
                continue;
            }
            // External files from different directories may share a name
            let name = site_file_name(&mut taken, name);

            match descriptor.kind {
                MediaKind::Image => {
                    fs::copy(&source, images_dir.join(&name))?;
                    copied += 1;
                    let mut image = SiteImage {
                        filename: name.clone(),
                        url: format!("media/images/{}", name),
                        thumbnail: None,
                        sizes: BTreeMap::new(),
                    };
                    match self.derive_site_sizes(&source, &sized_dir, &thumbs_dir, &name, &caps, &thumbnail, quality) {
                        Ok((thumb, sizes)) => {
                            image.thumbnail = Some(format!("media/thumbnails/{}", thumb));
                            image.sizes = sizes;
                        }
                        Err(e) => {
                            tracing::warn!(file = %name, error = %e, "image processing failed, keeping original");
                        }
                    }
                    context.images.push(image);
                }
                MediaKind::Video => {
                    fs::copy(&source, videos_dir.join(&name))?;
                    copied += 1;
                    context.videos.push(SiteVideo {
                        url: format!("media/videos/{}", name),
                        filename: name,
                    });
                }
                MediaKind::Other => {
                    tracing::debug!(file = %name, "not an image or video, skipping");
                }
            }
        }
        Ok(copied)
    }

    /// Thumbnail plus capped derivatives. Returns the thumbnail file name and
    /// cap name to site URL.
    #[allow(clippy::too_many_arguments)]
    fn derive_site_sizes(
        &self,
        source: &Path,
        sized_dir: &Path,
        thumbs_dir: &Path,
        name: &str,
        caps: &[SizePreset],
        thumbnail: &ThumbnailConfig,
        quality: Quality,
    ) -> Result<(String, BTreeMap<String, String>), BackendError> {
        let dims = get_dimensions(&self.backend, source)?;
        let thumb = create_thumbnail(&self.backend, source, thumbs_dir, name, thumbnail)?;
        let sizes = create_capped_images(&self.backend, source, sized_dir, name, dims, caps, quality)?
            .into_iter()
            .map(|d| (d.preset.to_string(), format!("media/images/{}/{}", SIZED_DIR, d.file_name)))
            .collect();
        Ok((thumb, sizes))
    }
}

/// Copy the template's asset directories, then fill in whichever default
/// stylesheet or script is still missing.
fn copy_template_assets(template: &Template, root: &Path) -> std::io::Result<()> {
    if let Some(dir) = &template.directory {
        for name in ASSET_DIRS {
            let src = dir.join(name);
            if src.is_dir() {
                copy_dir_recursive(&src, &root.join(name))?;
            }
        }
    }

    let css = root.join("css/style.css");
    if !css.exists() {
        fs::create_dir_all(root.join("css"))?;
        fs::write(&css, default_css(template.style))?;
    }
    let js = root.join("js/script.js");
    if !js.exists() {
        fs::create_dir_all(root.join("js"))?;
        fs::write(&js, SCRIPT_JS)?;
    }
    Ok(())
}

//! Property service: record lifecycle plus the media directory each property owns.
//!
//! ```text
//! <projects_dir>/
//! └── property_12/
//!     └── media/
//!         ├── kitchen.jpg                       # copied original
//!         ├── tour.mp4                          # non-images are copied unchanged
//!         └── derived/                          # see media::PRESETS
//!             ├── kitchen.jpg_thumbnail.jpg
//!             ├── kitchen.jpg_medium.jpg
//!             ├── kitchen.jpg_large.jpg
//!             └── kitchen.jpg_original.jpg
//! ```
//!
//! The media directory is created when the first file is attached and
//! removed when the property is deleted. Nothing is rolled back: if a copy
//! fails halfway through a batch the files already copied stay where they are.

use crate::fsutil::copy_dir_recursive;
use crate::imaging::{ImageBackend, Quality};
use crate::media::{DERIVED_DIR, classify, derive_or_original};
use crate::query::{PropertyFilter, Sort, filter_and_sort};
use crate::store::{RecordStore, StoreError};
use crate::types::{
    MediaDescriptor, MediaKind, MediaLocation, Property, PropertyId, PropertyRecord,
    PropertySummary, Statistics, Status, media_dir, property_dir,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Record dump inside an export bundle.
pub const BUNDLE_FILE: &str = "property_data.json";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Property not found: {0}")]
    NotFound(PropertyId),
    #[error("Invalid property: {0}")]
    Validation(String),
    #[error("No {BUNDLE_FILE} in {0}")]
    MissingBundle(PathBuf),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

fn validate(property: &Property) -> Result<()> {
    if property.title.trim().is_empty() {
        return Err(ServiceError::Validation("title is required".into()));
    }
    Ok(())
}

pub struct PropertyService<B: ImageBackend> {
    store: RecordStore,
    backend: B,
    projects_dir: PathBuf,
    quality: Quality,
}

impl<B: ImageBackend> PropertyService<B> {
    pub fn new(store: RecordStore, backend: B, projects_dir: impl Into<PathBuf>, quality: Quality) -> Self {
        Self {
            store,
            backend,
            projects_dir: projects_dir.into(),
            quality,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    pub fn media_dir(&self, id: PropertyId) -> PathBuf {
        media_dir(&self.projects_dir, id)
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub async fn create(&self, property: &Property) -> Result<PropertyId> {
        validate(property)?;
        let id = self.store.create_property(property).await?;
        tracing::info!(id, title = %property.title, "created property");
        Ok(id)
    }

    pub async fn get(&self, id: PropertyId) -> Result<PropertyRecord> {
        self.store
            .get_property(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Replace every field of an existing property.
    pub async fn update(&self, id: PropertyId, property: &Property) -> Result<()> {
        validate(property)?;
        if !self.store.update_property(id, property).await? {
            return Err(ServiceError::NotFound(id));
        }
        Ok(())
    }

    pub async fn summary(&self, id: PropertyId) -> Result<PropertySummary> {
        let record = self.get(id).await?;
        Ok(PropertySummary::from_record(&record, &self.projects_dir))
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Copy `paths` into the property's media directory and derive image presets.
    ///
    /// Missing inputs are skipped. A file with the same name as an already
    /// attached one replaces it. Returns how many files were attached.
    fn attach_files(
        &self,
        id: PropertyId,
        media: &mut Vec<MediaDescriptor>,
        paths: &[PathBuf],
    ) -> Result<usize> {
        let dir = self.media_dir(id);
        let mut attached = 0;
        for path in paths {
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "skipping missing media file");
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::debug!(path = %path.display(), "skipping media file without a usable name");
                continue;
            };

            fs::create_dir_all(&dir)?;
            let dest = dir.join(filename);
            fs::copy(path, &dest)?;

            let kind = classify(&dest);
            let mut descriptor = MediaDescriptor::owned(id, filename, kind);
            if kind == MediaKind::Image {
                let derived_dir = dir.join(DERIVED_DIR);
                descriptor.variants = derive_or_original(&self.backend, &dest, &derived_dir, self.quality)
                    .into_iter()
                    .filter(|(_, derived)| derived != &dest)
                    .filter_map(|(preset, derived)| {
                        let name = derived.file_name()?.to_str()?;
                        Some((preset, format!("{}/{}", DERIVED_DIR, name)))
                    })
                    .collect();
            }

            media.retain(|existing| existing.location != descriptor.location);
            media.push(descriptor);
            attached += 1;
        }
        Ok(attached)
    }

    /// Create a property and attach `paths` to it.
    ///
    /// Returns the new id and the property's media directory.
    pub async fn create_with_media(
        &self,
        property: &Property,
        paths: &[PathBuf],
    ) -> Result<(PropertyId, PathBuf)> {
        let id = self.create(property).await?;
        let dir = self.media_dir(id);
        fs::create_dir_all(&dir)?;

        let mut record = property.clone();
        let attached = self.attach_files(id, &mut record.media, paths)?;
        if attached > 0 {
            self.store.update_property(id, &record).await?;
        }
        tracing::info!(id, attached, skipped = paths.len() - attached, "attached media");
        Ok((id, dir))
    }

    /// Append files to an existing property.
    pub async fn add_media(&self, id: PropertyId, paths: &[PathBuf]) -> Result<usize> {
        let mut record = self.get(id).await?;
        let attached = self.attach_files(id, &mut record.property.media, paths)?;
        if attached > 0 {
            self.store.update_property(id, &record.property).await?;
        }
        Ok(attached)
    }

    /// Detach a file by name, deleting it and its derivatives from disk.
    ///
    /// Returns `false` if no attached file has that name.
    pub async fn remove_media(&self, id: PropertyId, filename: &str) -> Result<bool> {
        let mut record = self.get(id).await?;
        let Some(index) = record
            .property
            .media
            .iter()
            .position(|m| m.filename() == filename)
        else {
            return Ok(false);
        };

        let descriptor = record.property.media.remove(index);
        if let MediaLocation::Owned { .. } = descriptor.location {
            for path in descriptor.all_paths(&self.projects_dir) {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        self.store.update_property(id, &record.property).await?;
        Ok(true)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Copy a property and its media tree under a new id, as a draft.
    ///
    /// The title defaults to `"<title> (Copy)"`.
    pub async fn duplicate(&self, id: PropertyId, new_title: Option<&str>) -> Result<PropertyId> {
        let source = self.get(id).await?.property;

        let mut copy = source.clone();
        copy.title = match new_title {
            Some(title) => title.to_string(),
            None => format!("{} (Copy)", source.title),
        };
        copy.status = Status::Draft;
        copy.media.clear();
        let new_id = self.create(&copy).await?;

        let source_media = self.media_dir(id);
        if source_media.is_dir() {
            copy_dir_recursive(&source_media, &self.media_dir(new_id))?;
        }
        copy.media = source.media.iter().map(|m| m.rehomed(new_id)).collect();
        self.store.update_property(new_id, &copy).await?;

        tracing::info!(source = id, copy = new_id, "duplicated property");
        Ok(new_id)
    }

    /// Remove the property's directory (best effort), then its record.
    ///
    /// Returns `false` if there was no such record.
    pub async fn delete_with_media(&self, id: PropertyId) -> Result<bool> {
        let dir = property_dir(&self.projects_dir, id);
        if dir.exists()
            && let Err(e) = fs::remove_dir_all(&dir)
        {
            tracing::warn!(id, dir = %dir.display(), error = %e, "could not remove media directory");
        }
        let deleted = self.store.delete_property(id).await?;
        if deleted {
            tracing::info!(id, "deleted property");
        }
        Ok(deleted)
    }

    /// Write `<dest>/property_data.json` and copy the media tree to `<dest>/media`.
    pub async fn export(&self, id: PropertyId, dest: &Path) -> Result<PathBuf> {
        let record = self.get(id).await?;
        fs::create_dir_all(dest)?;
        fs::write(dest.join(BUNDLE_FILE), serde_json::to_string_pretty(&record)?)?;

        let source_media = self.media_dir(id);
        if source_media.is_dir() {
            copy_dir_recursive(&source_media, &dest.join("media"))?;
        }
        Ok(dest.to_path_buf())
    }

    /// Insert the record from an export bundle as a new property.
    ///
    /// The bundle's id and timestamps are ignored; owned media are re-homed
    /// onto the new id.
    pub async fn import(&self, src: &Path) -> Result<PropertyId> {
        let bundle = src.join(BUNDLE_FILE);
        if !bundle.is_file() {
            return Err(ServiceError::MissingBundle(src.to_path_buf()));
        }
        // Property ignores id, created_at and updated_at
        let mut property: Property = serde_json::from_str(&fs::read_to_string(&bundle)?)?;
        let media = std::mem::take(&mut property.media);
        let new_id = self.create(&property).await?;

        let bundle_media = src.join("media");
        if bundle_media.is_dir() {
            copy_dir_recursive(&bundle_media, &self.media_dir(new_id))?;
        }
        if !media.is_empty() {
            property.media = media.iter().map(|m| m.rehomed(new_id)).collect();
            self.store.update_property(new_id, &property).await?;
        }
        tracing::info!(id = new_id, src = %src.display(), "imported property");
        Ok(new_id)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Summaries of every property, narrowed and ordered in memory.
    pub async fn filtered_list(
        &self,
        filter: &PropertyFilter,
        sort: &Sort,
    ) -> Result<Vec<PropertySummary>> {
        let summaries = self
            .store
            .all_properties()
            .await?
            .iter()
            .map(|record| PropertySummary::from_record(record, &self.projects_dir))
            .collect();
        Ok(filter_and_sort(summaries, filter, sort))
    }

    pub async fn statistics(&self) -> Result<Statistics> {
        let records = self.store.all_properties().await?;
        let mut stats = Statistics {
            total_properties: records.len(),
            ..Statistics::default()
        };
        for record in &records {
            let property = &record.property;
            *stats
                .by_type
                .entry(property.property_type.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_status
                .entry(property.status.as_str().to_string())
                .or_default() += 1;
            stats.total_value += property.price.unwrap_or(0.0);
            stats.total_media_files += property.media.len();
        }
        if stats.total_properties > 0 {
            stats.average_price = stats.total_value / stats.total_properties as f64;
        }
        Ok(stats)
    }
}

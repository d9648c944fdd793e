//! Domain records shared by the store, the property service and the site
//! generator.
//!
//! Records are plain serde structs. The store persists them column by column
//! (list and mapping fields as JSON text), the export bundle writes them as
//! pretty JSON, and the generator feeds them into page contexts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Store-assigned property identity. Immutable after creation.
pub type PropertyId = i64;

pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Listing lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Draft, Status::Published, Status::Archived];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Categorical property type. Unknown labels are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    #[default]
    House,
    Apartment,
    Condo,
    Townhouse,
    Villa,
    Studio,
    Loft,
    Commercial,
    Land,
    Other(String),
}

impl PropertyType {
    pub const KNOWN: [PropertyType; 9] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Villa,
        PropertyType::Studio,
        PropertyType::Loft,
        PropertyType::Commercial,
        PropertyType::Land,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::House => "House",
            PropertyType::Apartment => "Apartment",
            PropertyType::Condo => "Condo",
            PropertyType::Townhouse => "Townhouse",
            PropertyType::Villa => "Villa",
            PropertyType::Studio => "Studio",
            PropertyType::Loft => "Loft",
            PropertyType::Commercial => "Commercial",
            PropertyType::Land => "Land",
            PropertyType::Other(label) => label,
        }
    }
}

impl From<String> for PropertyType {
    fn from(label: String) -> Self {
        let trimmed = label.trim();
        PropertyType::KNOWN
            .into_iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| PropertyType::Other(trimmed.to_string()))
    }
}

impl From<&str> for PropertyType {
    fn from(label: &str) -> Self {
        PropertyType::from(label.to_string())
    }
}

impl From<PropertyType> for String {
    fn from(kind: PropertyType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Street line. Stored in the `address` column.
    #[serde(rename = "address")]
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A real-estate listing as entered by the user.
///
/// Every field is optional on input; missing keys take the defaults below
/// (currency `EUR`, status `draft`, empty lists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub price: Option<f64>,
    pub currency: String,
    /// Square metres.
    pub surface_area: Option<f64>,
    pub rooms: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    #[serde(flatten)]
    pub address: Address,
    pub coordinates: Option<Coordinates>,
    pub features: Vec<String>,
    pub amenities: Vec<String>,
    pub media: Vec<MediaDescriptor>,
    pub floor_plan: serde_json::Map<String, serde_json::Value>,
    pub virtual_staging: bool,
    pub template_id: Option<String>,
    pub status: Status,
}

impl Default for Property {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            property_type: PropertyType::default(),
            price: None,
            currency: DEFAULT_CURRENCY.to_string(),
            surface_area: None,
            rooms: None,
            bedrooms: None,
            bathrooms: None,
            address: Address::default(),
            coordinates: None,
            features: Vec::new(),
            amenities: Vec::new(),
            media: Vec::new(),
            floor_plan: serde_json::Map::new(),
            virtual_staging: false,
            template_id: None,
            status: Status::default(),
        }
    }
}

impl Property {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn city(&self) -> Option<&str> {
        self.address.city.as_deref()
    }

    /// "city, country" with whichever parts are present.
    pub fn location(&self) -> String {
        [&self.address.city, &self.address.country]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn images(&self) -> impl Iterator<Item = &MediaDescriptor> {
        self.media.iter().filter(|m| m.kind == MediaKind::Image)
    }
}

/// A stored property: the record plus store-owned identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PropertyId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub property: Property,
}

/// Media classification by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }
}

/// Where an attached file lives.
///
/// Owned files sit in the property's media directory and are addressed by
/// owner id and file name, so moving a descriptor to another property only
/// changes `property_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaLocation {
    Owned {
        property_id: PropertyId,
        filename: String,
    },
    External {
        path: PathBuf,
    },
}

/// One attached file and its derived variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub location: MediaLocation,
    /// Preset name to derivative path, relative to the source file's directory.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, String>,
}

impl MediaDescriptor {
    pub fn owned(property_id: PropertyId, filename: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            kind,
            location: MediaLocation::Owned {
                property_id,
                filename: filename.into(),
            },
            variants: BTreeMap::new(),
        }
    }

    pub fn external(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self {
            kind,
            location: MediaLocation::External { path: path.into() },
            variants: BTreeMap::new(),
        }
    }

    pub fn filename(&self) -> &str {
        match &self.location {
            MediaLocation::Owned { filename, .. } => filename,
            MediaLocation::External { path } => path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default(),
        }
    }

    fn directory(&self, projects_dir: &Path) -> PathBuf {
        match &self.location {
            MediaLocation::Owned { property_id, .. } => media_dir(projects_dir, *property_id),
            MediaLocation::External { path } => {
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            }
        }
    }

    /// Absolute (or projects-relative) path of the attached file.
    pub fn source_path(&self, projects_dir: &Path) -> PathBuf {
        match &self.location {
            MediaLocation::Owned { filename, .. } => self.directory(projects_dir).join(filename),
            MediaLocation::External { path } => path.clone(),
        }
    }

    pub fn variant_path(&self, projects_dir: &Path, preset: &str) -> Option<PathBuf> {
        self.variants
            .get(preset)
            .map(|name| self.directory(projects_dir).join(name))
    }

    /// Every file this descriptor accounts for on disk: source plus variants.
    pub fn all_paths(&self, projects_dir: &Path) -> Vec<PathBuf> {
        let dir = self.directory(projects_dir);
        std::iter::once(self.source_path(projects_dir))
            .chain(self.variants.values().map(|name| dir.join(name)))
            .collect()
    }

    /// The same descriptor owned by another property. External files are unchanged.
    pub fn rehomed(&self, new_owner: PropertyId) -> Self {
        let location = match &self.location {
            MediaLocation::Owned { filename, .. } => MediaLocation::Owned {
                property_id: new_owner,
                filename: filename.clone(),
            },
            external @ MediaLocation::External { .. } => external.clone(),
        };
        Self {
            kind: self.kind,
            location,
            variants: self.variants.clone(),
        }
    }
}

/// `<projects_dir>/property_<id>`
pub fn property_dir(projects_dir: &Path, id: PropertyId) -> PathBuf {
    projects_dir.join(format!("property_{}", id))
}

/// `<projects_dir>/property_<id>/media`
pub fn media_dir(projects_dir: &Path, id: PropertyId) -> PathBuf {
    property_dir(projects_dir, id).join("media")
}

/// Display-oriented projection of a stored property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub title: String,
    pub property_type: PropertyType,
    pub price: Option<f64>,
    pub currency: String,
    pub surface_area: Option<f64>,
    pub rooms: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub city: Option<String>,
    pub status: Status,
    pub media_count: usize,
    pub image_count: usize,
    /// Thumbnail of the first image, else that image's original.
    pub primary_image: Option<PathBuf>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PropertySummary {
    pub fn from_record(record: &PropertyRecord, projects_dir: &Path) -> Self {
        let property = &record.property;
        let primary_image = property.images().next().map(|image| {
            image
                .variant_path(projects_dir, "thumbnail")
                .unwrap_or_else(|| image.source_path(projects_dir))
        });
        Self {
            id: record.id,
            title: property.title.clone(),
            property_type: property.property_type.clone(),
            price: property.price,
            currency: property.currency.clone(),
            surface_area: property.surface_area,
            rooms: property.rooms,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            city: property.address.city.clone(),
            status: property.status,
            media_count: property.media.len(),
            image_count: property.images().count(),
            primary_image,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Aggregates over every stored property.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_properties: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    /// Sum of prices; a missing price counts as zero.
    pub total_value: f64,
    pub average_price: f64,
    pub total_media_files: usize,
}

/// Visual family of a website template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    #[default]
    Modern,
    Luxury,
    Minimal,
    Bold,
    Custom,
}

impl TemplateStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateStyle::Modern => "modern",
            TemplateStyle::Luxury => "luxury",
            TemplateStyle::Minimal => "minimal",
            TemplateStyle::Bold => "bold",
            TemplateStyle::Custom => "custom",
        }
    }
}

/// Presentation switches of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub color_scheme: String,
    pub layout: String,
    pub animations: bool,
    pub responsive: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            color_scheme: "light".to_string(),
            layout: "grid".to_string(),
            animations: true,
            responsive: true,
        }
    }
}

/// A website template: style configuration plus advertised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub style: TemplateStyle,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub seo_optimized: bool,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub config: TemplateConfig,
    /// On-disk location for directory templates; built-ins have none.
    #[serde(skip)]
    pub directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

/// Outcome of a recorded generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Created,
    Generated,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Created => "created",
            ProjectStatus::Generated => "generated",
            ProjectStatus::Failed => "failed",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(ProjectStatus::Created),
            "generated" => Ok(ProjectStatus::Generated),
            "failed" => Ok(ProjectStatus::Failed),
            _ => Err(ParseEnumError {
                kind: "project status",
                value: s.to_string(),
            }),
        }
    }
}

/// A website generation recorded against a property and a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: Option<String>,
    pub property_id: PropertyId,
    pub template_id: String,
    pub output_path: PathBuf,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// A stored project with the joined property title and template name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub id: i64,
    #[serde(flatten)]
    pub project: Project,
    pub property_title: Option<String>,
    pub template_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_defaults_from_empty_json() {
        let property: Property = serde_json::from_str(r#"{"title": "Loft"}"#).unwrap();
        assert_eq!(property.title, "Loft");
        assert_eq!(property.currency, "EUR");
        assert_eq!(property.status, Status::Draft);
        assert_eq!(property.property_type, PropertyType::House);
        assert!(property.media.is_empty());
    }

    #[test]
    fn property_address_is_flat_in_json() {
        let property: Property = serde_json::from_str(
            r#"{"title": "T", "address": "1 Rue Haute", "city": "Nice", "country": "France"}"#,
        )
        .unwrap();
        assert_eq!(property.address.street.as_deref(), Some("1 Rue Haute"));
        assert_eq!(property.location(), "Nice, France");

        let value = serde_json::to_value(&property).unwrap();
        assert_eq!(value["city"], "Nice");
    }

    #[test]
    fn property_type_parses_case_insensitively() {
        assert_eq!(PropertyType::from("villa"), PropertyType::Villa);
        assert_eq!(
            PropertyType::from("Houseboat"),
            PropertyType::Other("Houseboat".into())
        );
        assert_eq!(String::from(PropertyType::Condo), "Condo");
    }

    #[test]
    fn status_from_str() {
        assert_eq!("Published".parse::<Status>().unwrap(), Status::Published);
        assert!("sold".parse::<Status>().is_err());
    }

    // =========================================================================
    // Media descriptor tests
    // =========================================================================

    #[test]
    fn owned_media_paths_rebuilt_from_id() {
        let mut media = MediaDescriptor::owned(12, "pool.jpg", MediaKind::Image);
        media
            .variants
            .insert("thumbnail".into(), "derived/pool.jpg_thumbnail.jpg".into());

        let root = Path::new("/data/projects");
        assert_eq!(
            media.source_path(root),
            PathBuf::from("/data/projects/property_12/media/pool.jpg")
        );
        assert_eq!(
            media.variant_path(root, "thumbnail").unwrap(),
            PathBuf::from("/data/projects/property_12/media/derived/pool.jpg_thumbnail.jpg")
        );
        assert_eq!(media.all_paths(root).len(), 2);
    }

    #[test]
    fn rehomed_changes_owner_only() {
        // Filename deliberately contains the old id
        let media = MediaDescriptor::owned(7, "unit_7_kitchen.jpg", MediaKind::Image);
        let moved = media.rehomed(42);

        assert_eq!(moved.filename(), "unit_7_kitchen.jpg");
        assert_eq!(
            moved.source_path(Path::new("p")),
            PathBuf::from("p/property_42/media/unit_7_kitchen.jpg")
        );
    }

    #[test]
    fn rehomed_keeps_external_paths() {
        let media = MediaDescriptor::external("/photos/7/a.jpg", MediaKind::Image);
        assert_eq!(media.rehomed(8), media);
    }

    #[test]
    fn media_descriptor_json_shape() {
        let media = MediaDescriptor::owned(3, "tour.mp4", MediaKind::Video);
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["location"]["type"], "owned");
        assert_eq!(json["location"]["property_id"], 3);
        assert!(json.get("variants").is_none());
    }

    #[test]
    fn summary_prefers_thumbnail_of_first_image() {
        let mut image = MediaDescriptor::owned(1, "front.jpg", MediaKind::Image);
        image
            .variants
            .insert("thumbnail".into(), "derived/front.jpg_thumbnail.jpg".into());
        let record = PropertyRecord {
            id: 1,
            created_at: None,
            updated_at: None,
            property: Property {
                media: vec![MediaDescriptor::owned(1, "tour.mp4", MediaKind::Video), image],
                ..Property::new("House")
            },
        };

        let summary = PropertySummary::from_record(&record, Path::new("root"));
        assert_eq!(summary.media_count, 2);
        assert_eq!(summary.image_count, 1);
        assert_eq!(
            summary.primary_image.unwrap(),
            PathBuf::from("root/property_1/media/derived/front.jpg_thumbnail.jpg")
        );
    }
}

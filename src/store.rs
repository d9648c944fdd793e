//! Record store: properties, templates and projects in SQLite.
//!
//! List and mapping fields (`features`, `amenities`, `media_files`,
//! `floor_plan`, template and project `config`) are stored as JSON text.
//! Malformed JSON decodes to an empty container with a warning rather than
//! failing the read. Timestamps are RFC 3339 text written by the store.
//!
//! The store does no validation of its own: whatever the caller hands in is
//! persisted, and missing optional fields become NULL.

use crate::query::{PropertyFilter, Sort, filter_and_sort};
use crate::templates::builtin_templates;
use crate::types::{
    Address, Coordinates, Project, ProjectRecord, ProjectStatus, Property, PropertyId,
    PropertyRecord, PropertyType, Status, Template, TemplateConfig, TemplateStyle,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed record store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if needed) a database file, migrate it and seed templates.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// A private in-memory database (for tests).
    ///
    /// Limited to one connection that never expires, since every connection
    /// to `:memory:` is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create tables and seed the built-in templates. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                property_type TEXT NOT NULL,
                price REAL,
                currency TEXT DEFAULT 'EUR',
                surface_area REAL,
                rooms INTEGER,
                bedrooms INTEGER,
                bathrooms INTEGER,
                address TEXT,
                city TEXT,
                postal_code TEXT,
                country TEXT,
                latitude REAL,
                longitude REAL,
                features TEXT,
                amenities TEXT,
                media_files TEXT,
                floor_plan TEXT,
                virtual_staging BOOLEAN DEFAULT 0,
                template_id TEXT,
                status TEXT DEFAULT 'draft',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                category TEXT,
                preview_image TEXT,
                config TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                property_id INTEGER REFERENCES properties (id) ON DELETE CASCADE,
                template_id TEXT REFERENCES templates (id),
                output_path TEXT,
                config TEXT,
                status TEXT DEFAULT 'created',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let now = timestamp();
        for template in builtin_templates() {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO templates
                    (id, name, description, category, preview_image, config, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&template.id)
            .bind(&template.name)
            .bind(&template.description)
            .bind(&template.category)
            .bind(&template.preview_image)
            .bind(serde_json::to_string(&StoredTemplateConfig::from(&template))?)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Insert a property and return its new id.
    pub async fn create_property(&self, property: &Property) -> Result<PropertyId> {
        let now = timestamp();
        let coords = property.coordinates;
        let result = sqlx::query(
            r#"
            INSERT INTO properties (
                title, description, property_type, price, currency, surface_area,
                rooms, bedrooms, bathrooms, address, city, postal_code, country,
                latitude, longitude, features, amenities, media_files, floor_plan,
                virtual_staging, template_id, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.property_type.as_str())
        .bind(property.price)
        .bind(&property.currency)
        .bind(property.surface_area)
        .bind(property.rooms.map(i64::from))
        .bind(property.bedrooms.map(i64::from))
        .bind(property.bathrooms.map(i64::from))
        .bind(&property.address.street)
        .bind(&property.address.city)
        .bind(&property.address.postal_code)
        .bind(&property.address.country)
        .bind(coords.map(|c| c.latitude))
        .bind(coords.map(|c| c.longitude))
        .bind(serde_json::to_string(&property.features)?)
        .bind(serde_json::to_string(&property.amenities)?)
        .bind(serde_json::to_string(&property.media)?)
        .bind(serde_json::to_string(&property.floor_plan)?)
        .bind(property.virtual_staging)
        .bind(&property.template_id)
        .bind(property.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_property(&self, id: PropertyId) -> Result<Option<PropertyRecord>> {
        let row = sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PropertyRow::into_record))
    }

    /// Every property, most recently updated first.
    pub async fn all_properties(&self) -> Result<Vec<PropertyRecord>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            "SELECT * FROM properties ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PropertyRow::into_record).collect())
    }

    /// All properties narrowed by `filter` and ordered by `sort`.
    pub async fn list_properties(
        &self,
        filter: &PropertyFilter,
        sort: &Sort,
    ) -> Result<Vec<PropertyRecord>> {
        Ok(filter_and_sort(self.all_properties().await?, filter, sort))
    }

    /// Replace every field of a property. Returns `false` if the id does not exist.
    pub async fn update_property(&self, id: PropertyId, property: &Property) -> Result<bool> {
        let coords = property.coordinates;
        let result = sqlx::query(
            r#"
            UPDATE properties SET
                title = ?, description = ?, property_type = ?, price = ?, currency = ?,
                surface_area = ?, rooms = ?, bedrooms = ?, bathrooms = ?, address = ?,
                city = ?, postal_code = ?, country = ?, latitude = ?, longitude = ?,
                features = ?, amenities = ?, media_files = ?, floor_plan = ?,
                virtual_staging = ?, template_id = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.property_type.as_str())
        .bind(property.price)
        .bind(&property.currency)
        .bind(property.surface_area)
        .bind(property.rooms.map(i64::from))
        .bind(property.bedrooms.map(i64::from))
        .bind(property.bathrooms.map(i64::from))
        .bind(&property.address.street)
        .bind(&property.address.city)
        .bind(&property.address.postal_code)
        .bind(&property.address.country)
        .bind(coords.map(|c| c.latitude))
        .bind(coords.map(|c| c.longitude))
        .bind(serde_json::to_string(&property.features)?)
        .bind(serde_json::to_string(&property.amenities)?)
        .bind(serde_json::to_string(&property.media)?)
        .bind(serde_json::to_string(&property.floor_plan)?)
        .bind(property.virtual_staging)
        .bind(&property.template_id)
        .bind(property.status.as_str())
        .bind(timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if the id does not exist.
    pub async fn delete_property(&self, id: PropertyId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let rows = sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TemplateRow::into_template).collect())
    }

    pub async fn get_template(&self, id: &str) -> Result<Option<Template>> {
        let row = sqlx::query_as::<_, TemplateRow>("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TemplateRow::into_template))
    }

    /// Insert or refresh one template row, keeping its original `created_at`.
    pub async fn upsert_template(&self, template: &Template) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO templates
                (id, name, description, category, preview_image, config, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category = excluded.category,
                preview_image = excluded.preview_image,
                config = excluded.config
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.category)
        .bind(&template.preview_image)
        .bind(serde_json::to_string(&StoredTemplateConfig::from(template))?)
        .bind(timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Restore the built-in template rows to their stock values.
    pub async fn reseed_templates(&self) -> Result<()> {
        for template in builtin_templates() {
            self.upsert_template(&template).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub async fn create_project(&self, project: &Project) -> Result<i64> {
        let now = timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO projects (
                name, description, property_id, template_id, output_path,
                config, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.property_id)
        .bind(&project.template_id)
        .bind(project.output_path.to_string_lossy().to_string())
        .bind(serde_json::to_string(&project.config)?)
        .bind(project.status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// All projects with their property title and template name, newest first.
    pub async fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT p.*, pr.title AS property_title, t.name AS template_name
            FROM projects p
            LEFT JOIN properties pr ON p.property_id = pr.id
            LEFT JOIN templates t ON p.template_id = t.id
            ORDER BY p.updated_at DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProjectRow::into_record).collect())
    }

    pub async fn update_project_status(&self, id: i64, status: ProjectStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE projects SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Write a consistent copy of the database to `path`, which must not exist.
    pub async fn backup_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        sqlx::query("VACUUM INTO ?")
            .bind(path.to_string_lossy().to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// RFC 3339, or SQLite's `CURRENT_TIMESTAMP` layout for older rows.
fn parse_timestamp(text: Option<&str>) -> Option<DateTime<Utc>> {
    let text = text?.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Decode a JSON column, falling back to an empty value on malformed text.
fn decode_json<T: DeserializeOwned + Default>(
    table: &str,
    column: &str,
    id: &str,
    text: Option<&str>,
) -> T {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return T::default();
    };
    serde_json::from_str(text).unwrap_or_else(|e| {
        tracing::warn!(table, column, id, error = %e, "malformed JSON column, using empty value");
        T::default()
    })
}

// Row types for sqlx queries

#[derive(Debug, FromRow)]
struct PropertyRow {
    id: i64,
    title: String,
    description: Option<String>,
    property_type: String,
    price: Option<f64>,
    currency: Option<String>,
    surface_area: Option<f64>,
    rooms: Option<i64>,
    bedrooms: Option<i64>,
    bathrooms: Option<i64>,
    address: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    features: Option<String>,
    amenities: Option<String>,
    media_files: Option<String>,
    floor_plan: Option<String>,
    virtual_staging: Option<bool>,
    template_id: Option<String>,
    status: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn count(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

impl PropertyRow {
    fn into_record(self) -> PropertyRecord {
        let id = self.id.to_string();
        let status = match self.status.as_deref() {
            None => Status::default(),
            Some(text) => text.parse().unwrap_or_else(|e| {
                tracing::warn!(id = %id, error = %e, "unknown status, treating as draft");
                Status::default()
            }),
        };
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        PropertyRecord {
            id: self.id,
            created_at: parse_timestamp(self.created_at.as_deref()),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
            property: Property {
                title: self.title,
                description: self.description,
                property_type: PropertyType::from(self.property_type),
                price: self.price,
                currency: self
                    .currency
                    .unwrap_or_else(|| crate::types::DEFAULT_CURRENCY.to_string()),
                surface_area: self.surface_area,
                rooms: count(self.rooms),
                bedrooms: count(self.bedrooms),
                bathrooms: count(self.bathrooms),
                address: Address {
                    street: self.address,
                    city: self.city,
                    postal_code: self.postal_code,
                    country: self.country,
                },
                coordinates,
                features: decode_json("properties", "features", &id, self.features.as_deref()),
                amenities: decode_json("properties", "amenities", &id, self.amenities.as_deref()),
                media: decode_json("properties", "media_files", &id, self.media_files.as_deref()),
                floor_plan: decode_json("properties", "floor_plan", &id, self.floor_plan.as_deref()),
                virtual_staging: self.virtual_staging.unwrap_or(false),
                template_id: self.template_id,
                status,
            },
        }
    }
}

/// What the `templates.config` column holds beyond the table's own columns.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredTemplateConfig {
    style: Option<TemplateStyle>,
    features: Vec<String>,
    seo_optimized: Option<bool>,
    #[serde(flatten)]
    config: TemplateConfig,
}

impl From<&Template> for StoredTemplateConfig {
    fn from(template: &Template) -> Self {
        Self {
            style: Some(template.style),
            features: template.features.clone(),
            seo_optimized: Some(template.seo_optimized),
            config: template.config.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    preview_image: Option<String>,
    config: Option<String>,
}

impl TemplateRow {
    fn into_template(self) -> Template {
        let stored: StoredTemplateConfig =
            decode_json("templates", "config", &self.id, self.config.as_deref());
        Template {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            style: stored.style.unwrap_or(TemplateStyle::Custom),
            features: stored.features,
            seo_optimized: stored.seo_optimized.unwrap_or(true),
            preview_image: self.preview_image,
            config: stored.config,
            directory: None,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: Option<String>,
    property_id: Option<i64>,
    template_id: Option<String>,
    output_path: Option<String>,
    config: Option<String>,
    status: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    property_title: Option<String>,
    template_name: Option<String>,
}

impl ProjectRow {
    fn into_record(self) -> ProjectRecord {
        let id = self.id.to_string();
        ProjectRecord {
            id: self.id,
            project: Project {
                name: self.name,
                description: self.description,
                property_id: self.property_id.unwrap_or_default(),
                template_id: self.template_id.unwrap_or_default(),
                output_path: self.output_path.unwrap_or_default().into(),
                config: decode_json("projects", "config", &id, self.config.as_deref()),
                status: self
                    .status
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            property_title: self.property_title,
            template_name: self.template_name,
            created_at: parse_timestamp(self.created_at.as_deref()),
            updated_at: parse_timestamp(self.updated_at.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaDescriptor, MediaKind};
    use std::path::PathBuf;

    fn villa() -> Property {
        let mut floor_plan = serde_json::Map::new();
        floor_plan.insert("levels".into(), serde_json::json!(2));
        let mut media = MediaDescriptor::owned(1, "pool.jpg", MediaKind::Image);
        media
            .variants
            .insert("thumbnail".into(), "derived/pool.jpg_thumbnail.jpg".into());

        Property {
            title: "Villa A".into(),
            description: Some("Sea view".into()),
            property_type: PropertyType::Villa,
            price: Some(500_000.0),
            currency: "EUR".into(),
            surface_area: Some(180.5),
            rooms: Some(6),
            bedrooms: Some(4),
            bathrooms: Some(2),
            address: Address {
                street: Some("1 Chemin des Pins".into()),
                city: Some("Antibes".into()),
                postal_code: Some("06600".into()),
                country: Some("France".into()),
            },
            coordinates: Some(Coordinates {
                latitude: 43.58,
                longitude: 7.12,
            }),
            features: vec!["Pool".into(), "Garden".into()],
            amenities: vec!["Beach".into()],
            media: vec![media],
            floor_plan,
            virtual_staging: true,
            template_id: Some("luxury".into()),
            status: Status::Published,
        }
    }

    // =========================================================================
    // Property CRUD tests
    // =========================================================================

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = RecordStore::in_memory().await.unwrap();
        let property = villa();

        let id = store.create_property(&property).await.unwrap();
        let record = store.get_property(id).await.unwrap().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.property, property);
        assert!(record.created_at.is_some());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn minimal_property_round_trips() {
        let store = RecordStore::in_memory().await.unwrap();
        let property = Property::new("Plot");

        let id = store.create_property(&property).await.unwrap();
        let record = store.get_property(id).await.unwrap().unwrap();
        assert_eq!(record.property, property);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = RecordStore::in_memory().await.unwrap();
        assert!(store.get_property(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_distinct() {
        let store = RecordStore::in_memory().await.unwrap();
        let a = store.create_property(&Property::new("A")).await.unwrap();
        let b = store.create_property(&Property::new("B")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = RecordStore::in_memory().await.unwrap();
        let id = store.create_property(&villa()).await.unwrap();

        let replacement = Property::new("Renamed");
        assert!(store.update_property(id, &replacement).await.unwrap());

        let record = store.get_property(id).await.unwrap().unwrap();
        assert_eq!(record.property, replacement);
        assert!(record.updated_at >= record.created_at);
    }

    #[tokio::test]
    async fn update_missing_reports_no_rows() {
        let store = RecordStore::in_memory().await.unwrap();
        assert!(!store.update_property(42, &villa()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = RecordStore::in_memory().await.unwrap();
        let id = store.create_property(&villa()).await.unwrap();

        assert!(store.delete_property(id).await.unwrap());
        assert!(store.get_property(id).await.unwrap().is_none());
        assert!(!store.delete_property(id).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_json_decodes_to_empty() {
        let store = RecordStore::in_memory().await.unwrap();
        let id = store.create_property(&villa()).await.unwrap();
        sqlx::query("UPDATE properties SET features = '[oops', media_files = 'null?' WHERE id = ?")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();

        let record = store.get_property(id).await.unwrap().unwrap();
        assert!(record.property.features.is_empty());
        assert!(record.property.media.is_empty());
        assert_eq!(record.property.amenities, vec!["Beach"]);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let store = RecordStore::in_memory().await.unwrap();
        for (title, price) in [("Cheap", 100_000.0), ("Mid", 250_000.0), ("Dear", 900_000.0)] {
            let property = Property {
                price: Some(price),
                ..Property::new(title)
            };
            store.create_property(&property).await.unwrap();
        }

        let filter = PropertyFilter {
            min_price: Some(100_000.0),
            max_price: Some(250_000.0),
            ..Default::default()
        };
        let listed = store
            .list_properties(&filter, &Sort::desc("price"))
            .await
            .unwrap();
        let titles: Vec<_> = listed.iter().map(|r| r.property.title.as_str()).collect();
        assert_eq!(titles, ["Mid", "Cheap"]);
    }

    // =========================================================================
    // Template tests
    // =========================================================================

    #[tokio::test]
    async fn builtin_templates_are_seeded() {
        let store = RecordStore::in_memory().await.unwrap();
        let templates = store.list_templates().await.unwrap();
        let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Bold", "Luxury", "Minimal", "Modern"]);

        let luxury = store.get_template("luxury").await.unwrap().unwrap();
        assert_eq!(luxury.style, TemplateStyle::Luxury);
        assert_eq!(luxury.config.layout, "fullscreen");
        assert_eq!(luxury.features.len(), 4);
    }

    #[tokio::test]
    async fn migrate_twice_does_not_duplicate_templates() {
        let store = RecordStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        assert_eq!(store.list_templates().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn reseed_restores_stock_values() {
        let store = RecordStore::in_memory().await.unwrap();
        sqlx::query("UPDATE templates SET name = 'Changed' WHERE id = 'modern'")
            .execute(store.pool())
            .await
            .unwrap();

        store.reseed_templates().await.unwrap();
        let modern = store.get_template("modern").await.unwrap().unwrap();
        assert_eq!(modern.name, "Modern");
    }

    // =========================================================================
    // Project tests
    // =========================================================================

    #[tokio::test]
    async fn projects_join_property_and_template() {
        let store = RecordStore::in_memory().await.unwrap();
        let property_id = store.create_property(&villa()).await.unwrap();
        let project_id = store
            .create_project(&Project {
                name: "villa-site".into(),
                description: None,
                property_id,
                template_id: "modern".into(),
                output_path: PathBuf::from("sites/villa-site"),
                config: serde_json::Map::new(),
                status: ProjectStatus::Created,
            })
            .await
            .unwrap();

        assert!(
            store
                .update_project_status(project_id, ProjectStatus::Generated)
                .await
                .unwrap()
        );

        let projects = store.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].property_title.as_deref(), Some("Villa A"));
        assert_eq!(projects[0].template_name.as_deref(), Some("Modern"));
        assert_eq!(projects[0].project.status, ProjectStatus::Generated);
    }

    #[tokio::test]
    async fn deleting_property_cascades_to_projects() {
        let store = RecordStore::in_memory().await.unwrap();
        let property_id = store.create_property(&villa()).await.unwrap();
        store
            .create_project(&Project {
                name: "p".into(),
                description: None,
                property_id,
                template_id: "bold".into(),
                output_path: PathBuf::from("out"),
                config: serde_json::Map::new(),
                status: ProjectStatus::default(),
            })
            .await
            .unwrap();

        assert!(store.delete_property(property_id).await.unwrap());
        assert!(store.list_projects().await.unwrap().is_empty());
    }

    // =========================================================================
    // File-backed tests
    // =========================================================================

    #[tokio::test]
    async fn open_creates_file_and_backup_copies_it() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db = tmp.path().join("data/database.db");
        let store = RecordStore::open(&db).await.unwrap();
        store.create_property(&villa()).await.unwrap();
        assert!(db.exists());

        let copy = tmp.path().join("backups/copy.db");
        store.backup_to(&copy).await.unwrap();
        store.close().await;

        let restored = RecordStore::open(&copy).await.unwrap();
        assert_eq!(restored.all_properties().await.unwrap().len(), 1);
    }

    #[test]
    fn parse_timestamp_accepts_sqlite_layout() {
        let parsed = parse_timestamp(Some("2024-03-05 10:00:00")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T10:00:00+00:00");
        assert!(parse_timestamp(Some("yesterday")).is_none());
    }
}

//! Application settings.
//!
//! Handles loading, validating, and merging `settings.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! language = "fr"              # "en" or "fr"; sets the `lang` of generated pages
//! default_currency = "EUR"     # currency for records that do not name one
//! website_template = "modern"  # template used when `generate` is given none
//! export_format = "json"
//!
//! [paths]
//! data_dir = "data"            # database lives at <data_dir>/database.db
//! projects_dir = "data/projects"
//! templates_dir = "templates"
//! output_dir = "sites"
//!
//! [images]
//! quality = 85                 # JPEG quality (1-100)
//! max_image_size = 1920        # longest edge of the `large` site derivative
//!
//! [backup]
//! auto_backup = true
//! interval_hours = 24
//! max_backups = 10
//! directory = "backups"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "settings.toml";

const LANGUAGES: &[&str] = &["en", "fr"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application settings loaded from `settings.toml`.
///
/// All fields have defaults. User files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// UI and page language.
    pub language: String,
    /// ISO 4217 code applied to new records without a currency.
    pub default_currency: String,
    /// Template id used when the caller does not pick one.
    pub website_template: String,
    /// Export bundle format. Only `json` exists.
    pub export_format: String,
    pub paths: PathsConfig,
    pub images: ImagesConfig,
    pub backup: BackupConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "fr".to_string(),
            default_currency: "EUR".to_string(),
            website_template: "modern".to_string(),
            export_format: "json".to_string(),
            paths: PathsConfig::default(),
            images: ImagesConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LANGUAGES.contains(&self.language.as_str()) {
            return Err(ConfigError::Validation(format!(
                "language must be one of {:?}, got {:?}",
                LANGUAGES, self.language
            )));
        }
        if self.default_currency.len() != 3
            || !self
                .default_currency
                .chars()
                .all(|c| c.is_ascii_uppercase())
        {
            return Err(ConfigError::Validation(
                "default_currency must be a three-letter uppercase code".into(),
            ));
        }
        if self.export_format != "json" {
            return Err(ConfigError::Validation(
                "export_format must be \"json\"".into(),
            ));
        }
        if self.website_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "website_template must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.max_image_size < 800 {
            return Err(ConfigError::Validation(
                "images.max_image_size must be at least 800".into(),
            ));
        }
        if self.backup.max_backups == 0 {
            return Err(ConfigError::Validation(
                "backup.max_backups must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Location of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.paths.data_dir.join("database.db")
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    /// Per-property media directories live under here.
    pub projects_dir: PathBuf,
    /// Directory-based website templates.
    pub templates_dir: PathBuf,
    /// Generated sites are written to `<output_dir>/<name>`.
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            projects_dir: PathBuf::from("data/projects"),
            templates_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("sites"),
        }
    }
}

/// Image derivative settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Lossy JPEG quality for every derivative.
    pub quality: u32,
    /// Longest edge of the largest site derivative.
    pub max_image_size: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            max_image_size: 1920,
        }
    }
}

/// Database backup policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    pub auto_backup: bool,
    pub interval_hours: u64,
    pub max_backups: usize,
    pub directory: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            auto_backup: true,
            interval_hours: 24,
            max_backups: 10,
            directory: PathBuf::from("backups"),
        }
    }
}

/// Returns the stock default settings as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Settings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_settings(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_settings(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file, falling back to stock defaults when it is absent.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_settings(path)?;
    resolve_settings(base, overlay)
}

/// Returns a fully-commented stock `settings.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_settings_toml() -> &'static str {
    r##"# homeshow settings
# =================
# All settings are optional. Remove any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Language of generated pages: "en" or "fr".
language = "fr"

# Currency code applied to records that do not name one.
default_currency = "EUR"

# Template used by `generate` when --template is not given.
# Built-ins: modern, luxury, minimal, bold. Directory templates use their id.
website_template = "modern"

# Export bundle format. Only "json" is supported.
export_format = "json"

# ---------------------------------------------------------------------------
# Filesystem layout
# ---------------------------------------------------------------------------
[paths]
# The database is stored at <data_dir>/database.db
data_dir = "data"

# Each property's media lives in <projects_dir>/property_<id>/media
projects_dir = "data/projects"

# Directory templates: <templates_dir>/<name>/template.json
templates_dir = "templates"

# Generated sites are written to <output_dir>/<name>
output_dir = "sites"

# ---------------------------------------------------------------------------
# Image derivatives
# ---------------------------------------------------------------------------
[images]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 85

# Longest edge of the largest image written into a generated site.
max_image_size = 1920

# ---------------------------------------------------------------------------
# Database backups
# ---------------------------------------------------------------------------
[backup]
# Take a backup automatically when the newest one is older than the interval.
auto_backup = true
interval_hours = 24

# Oldest backups beyond this count are deleted.
max_backups = 10
directory = "backups"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_values() {
        let settings = Settings::default();
        assert_eq!(settings.language, "fr");
        assert_eq!(settings.default_currency, "EUR");
        assert_eq!(settings.website_template, "modern");
        assert_eq!(settings.images.quality, 85);
        assert_eq!(settings.images.max_image_size, 1920);
        assert_eq!(settings.backup.max_backups, 10);
    }

    #[test]
    fn database_path_under_data_dir() {
        let settings = Settings::default();
        assert_eq!(settings.database_path(), PathBuf::from("data/database.db"));
    }

    #[test]
    fn parse_partial_settings() {
        let settings: Settings = toml::from_str(
            r#"
language = "en"

[images]
quality = 70
"#,
        )
        .unwrap();

        assert_eq!(settings.language, "en");
        assert_eq!(settings.images.quality, 70);
        // Unspecified values keep their defaults
        assert_eq!(settings.images.max_image_size, 1920);
        assert_eq!(settings.paths.output_dir, PathBuf::from("sites"));
    }

    // =========================================================================
    // load_settings tests
    // =========================================================================

    #[test]
    fn load_settings_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings(&tmp.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_settings_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"
website_template = "luxury"

[paths]
output_dir = "public"

[backup]
auto_backup = false
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.website_template, "luxury");
        assert_eq!(settings.paths.output_dir, PathBuf::from("public"));
        assert!(!settings.backup.auto_backup);
        assert_eq!(settings.backup.interval_hours, 24);
    }

    #[test]
    fn load_settings_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"language = "fr""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"language = "en""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("language").unwrap().as_str(), Some("en"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[images]
quality = 85
max_image_size = 1920
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[images]
quality = 70
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let images = merged.get("images").unwrap();
        assert_eq!(images.get("quality").unwrap().as_integer(), Some(70));
        assert_eq!(
            images.get("max_image_size").unwrap().as_integer(),
            Some(1920)
        );
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Settings, _> = toml::from_str(
            r#"
[images]
qualty = 90
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Settings, _> = toml::from_str("[imagez]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_settings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        fs::write(&path, "[backup]\nkeep = 3\n").unwrap();

        assert!(load_settings(&path).is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_settings_passes() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut settings = Settings::default();
        settings.images.quality = 100;
        assert!(settings.validate().is_ok());
        settings.images.quality = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Validation(_))
        ));
        settings.images.quality = 101;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_unknown_language() {
        let settings = Settings {
            language: "de".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_currency_shape() {
        let mut settings = Settings::default();
        settings.default_currency = "usd".into();
        assert!(settings.validate().is_err());
        settings.default_currency = "USD".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_export_format() {
        let settings = Settings {
            export_format: "csv".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_small_max_image_size() {
        let mut settings = Settings::default();
        settings.images.max_image_size = 640;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_zero_max_backups() {
        let mut settings = Settings::default();
        settings.backup.max_backups = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_settings_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        fs::write(&path, "[images]\nquality = 250\n").unwrap();

        assert!(matches!(
            load_settings(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // Stock settings tests
    // =========================================================================

    #[test]
    fn stock_settings_toml_roundtrips_to_defaults() {
        let parsed: Settings = toml::from_str(stock_settings_toml()).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        for key in ["paths", "images", "backup", "language"] {
            assert!(table.contains_key(key), "missing {key}");
        }
    }
}

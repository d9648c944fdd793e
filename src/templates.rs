//! Website template registry.
//!
//! Four templates are compiled in (`modern`, `luxury`, `minimal`, `bold`).
//! More are discovered from the templates directory:
//!
//! ```text
//! templates/
//! └── coastal/
//!     ├── template.json   # descriptor, every key optional
//!     ├── index.html      # Jinja-style page files ({{ }}, {% for %}, {% if %})
//!     ├── gallery.html
//!     ├── css/ js/ images/ fonts/
//! ```
//!
//! A directory template whose id matches a built-in replaces it.

use crate::types::{Template, TemplateConfig, TemplateStyle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DESCRIPTOR_FILE: &str = "template.json";

#[allow(clippy::too_many_arguments)]
fn builtin(
    id: &str,
    style: TemplateStyle,
    description: &str,
    category: &str,
    features: &[&str],
    color_scheme: &str,
    layout: &str,
    animations: bool,
) -> Template {
    let mut name = id.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Template {
        id: id.to_string(),
        name,
        description: description.to_string(),
        category: category.to_string(),
        style,
        features: features.iter().map(|f| f.to_string()).collect(),
        seo_optimized: true,
        preview_image: Some(format!("{}_preview.jpg", id)),
        config: TemplateConfig {
            color_scheme: color_scheme.to_string(),
            layout: layout.to_string(),
            animations,
            responsive: true,
        },
        directory: None,
    }
}

/// The compiled-in templates, also seeded into the record store.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        builtin(
            "modern",
            TemplateStyle::Modern,
            "Clean, contemporary design with smooth animations",
            "residential",
            &["Responsive", "Image Gallery", "Contact Form", "SEO Optimized"],
            "light",
            "grid",
            true,
        ),
        builtin(
            "luxury",
            TemplateStyle::Luxury,
            "Elegant design for high-end properties",
            "luxury",
            &["Responsive", "Video Background", "Virtual Tour", "Premium Styling"],
            "dark",
            "fullscreen",
            true,
        ),
        builtin(
            "minimal",
            TemplateStyle::Minimal,
            "Simple, clean design focusing on content",
            "residential",
            &["Responsive", "Fast Loading", "Clean Layout", "Mobile First"],
            "light",
            "single_column",
            false,
        ),
        builtin(
            "bold",
            TemplateStyle::Bold,
            "Eye-catching design with vibrant colors",
            "commercial",
            &["Responsive", "Animated Elements", "Bold Typography", "Interactive"],
            "colorful",
            "masonry",
            true,
        ),
    ]
}

/// On-disk `template.json`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Descriptor {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    preview_image: Option<String>,
    style: Option<TemplateStyle>,
    features: Vec<String>,
    responsive: Option<bool>,
    seo_optimized: Option<bool>,
    config: Option<TemplateConfig>,
}

fn title_case(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Load one template directory. `Ok(None)` when it has no descriptor.
pub fn load_template_dir(dir: &Path) -> Result<Option<Template>, String> {
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    if !descriptor_path.is_file() {
        return Ok(None);
    }
    let dir_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let content = fs::read_to_string(&descriptor_path).map_err(|e| e.to_string())?;
    let descriptor: Descriptor = serde_json::from_str(&content).map_err(|e| e.to_string())?;

    let mut config = descriptor.config.unwrap_or_default();
    if let Some(responsive) = descriptor.responsive {
        config.responsive = responsive;
    }
    Ok(Some(Template {
        id: descriptor.id.unwrap_or_else(|| dir_name.clone()),
        name: descriptor.name.unwrap_or_else(|| title_case(&dir_name)),
        description: descriptor.description.unwrap_or_default(),
        category: descriptor.category.unwrap_or_else(|| "custom".to_string()),
        style: descriptor.style.unwrap_or(TemplateStyle::Custom),
        features: descriptor.features,
        seo_optimized: descriptor.seo_optimized.unwrap_or(true),
        preview_image: descriptor.preview_image,
        config,
        directory: Some(dir.to_path_buf()),
    }))
}

/// All known templates keyed by id.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
}

impl TemplateRegistry {
    /// Built-ins only.
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates()
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
        }
    }

    /// Built-ins plus every valid template directory under `templates_dir`.
    ///
    /// A missing directory is not an error. Broken descriptors are logged
    /// and skipped.
    pub fn load(templates_dir: &Path) -> Self {
        let mut registry = Self::builtin();
        let Ok(entries) = fs::read_dir(templates_dir) else {
            return registry;
        };
        let mut dirs: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            match load_template_dir(&dir) {
                Ok(Some(template)) => {
                    tracing::debug!(id = %template.id, dir = %dir.display(), "loaded template");
                    registry.insert(template);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping broken template");
                }
            }
        }
        registry
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

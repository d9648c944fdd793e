//! Everything a page can see while rendering.

use super::filters::{format_area, format_price};
use crate::types::{Property, PropertyRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const GENERATOR: &str = "homeshow";
pub const SEO_DESCRIPTION_LIMIT: usize = 160;

/// Optional page sections. Everything is on by default except the virtual tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub contact_form: bool,
    pub image_gallery: bool,
    pub virtual_tour: bool,
    pub mortgage_calculator: bool,
    pub map_integration: bool,
    pub social_sharing: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            contact_form: true,
            image_gallery: true,
            virtual_tour: false,
            mortgage_calculator: true,
            map_integration: true,
            social_sharing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    /// Local ISO-8601 timestamp without offset, e.g. `2024-03-05T10:00:00`.
    pub generated_date: String,
    pub generator: String,
    pub version: String,
}

impl SiteMeta {
    pub fn for_property(property: &Property, generated: DateTime<Utc>) -> Self {
        Self {
            title: property.title.clone(),
            description: property.description.clone().unwrap_or_default(),
            generated_date: generated.format("%Y-%m-%dT%H:%M:%S").to_string(),
            generator: GENERATOR.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Search-engine and social-card metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seo {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub og_title: String,
    pub og_description: String,
    pub og_type: String,
    pub twitter_card: String,
}

impl Seo {
    pub fn for_property(property: &Property) -> Self {
        let description: String = property
            .description
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(SEO_DESCRIPTION_LIMIT)
            .collect();
        Self {
            title: property.title.clone(),
            description: description.clone(),
            keywords: format!(
                "real estate, property, {}, {}",
                property.location(),
                property.property_type
            ),
            og_title: property.title.clone(),
            og_description: description,
            og_type: "website".to_string(),
            twitter_card: "summary_large_image".to_string(),
        }
    }
}

/// schema.org `RealEstateListing` as a JSON-LD document.
pub fn structured_data(property: &Property) -> String {
    let mut data = json!({
        "@context": "https://schema.org",
        "@type": "RealEstateListing",
        "name": property.title,
        "description": property.description.as_deref().unwrap_or_default(),
        "url": "index.html",
    });
    if let Some(price) = property.price {
        data["offers"] = json!({
            "@type": "Offer",
            "price": price,
            "priceCurrency": property.currency,
        });
    }
    if let Some(city) = property.city().filter(|c| !c.trim().is_empty()) {
        let mut address = json!({
            "@type": "PostalAddress",
            "addressLocality": city,
        });
        if let Some(street) = &property.address.street {
            address["streetAddress"] = json!(street);
        }
        if let Some(postal_code) = &property.address.postal_code {
            address["postalCode"] = json!(postal_code);
        }
        if let Some(country) = &property.address.country {
            address["addressCountry"] = json!(country);
        }
        data["address"] = address;
    }
    data.to_string()
}

/// A copied image, addressed relative to the site root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteImage {
    pub filename: String,
    pub url: String,
    pub thumbnail: Option<String>,
    /// Capped derivative name (`small`, `medium`, `large`) to URL.
    pub sizes: BTreeMap<String, String>,
}

impl SiteImage {
    /// Largest capped derivative, else the copied original.
    pub fn full_url(&self) -> &str {
        ["large", "medium", "small"]
            .iter()
            .find_map(|size| self.sizes.get(*size))
            .unwrap_or(&self.url)
    }

    /// Medium-sized rendition for hero images.
    pub fn display_url(&self) -> &str {
        ["medium", "small"]
            .iter()
            .find_map(|size| self.sizes.get(*size))
            .unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteVideo {
    pub filename: String,
    pub url: String,
}

/// Rendering context for one generation run.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub lang: String,
    pub record: PropertyRecord,
    pub site: SiteMeta,
    pub features: Features,
    pub seo: Seo,
    pub structured_data: String,
    pub images: Vec<SiteImage>,
    pub videos: Vec<SiteVideo>,
}

impl RenderContext {
    pub fn new(
        record: PropertyRecord,
        lang: impl Into<String>,
        features: Features,
        generated: DateTime<Utc>,
    ) -> Self {
        let property = &record.property;
        Self {
            lang: lang.into(),
            site: SiteMeta::for_property(property, generated),
            seo: Seo::for_property(property),
            structured_data: structured_data(property),
            features,
            images: Vec::new(),
            videos: Vec::new(),
            record,
        }
    }

    pub fn property(&self) -> &Property {
        &self.record.property
    }

    pub fn formatted_price(&self) -> Option<String> {
        self.property().price.map(format_price)
    }

    pub fn formatted_area(&self) -> Option<String> {
        self.property().surface_area.map(format_area)
    }

    /// The context as one JSON object, for page files.
    ///
    /// `property` is the stored record plus `formatted_price`,
    /// `formatted_area` and `location`.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let mut property = serde_json::to_value(&self.record)?;
        if let Value::Object(fields) = &mut property {
            fields.insert("formatted_price".into(), json!(self.formatted_price()));
            fields.insert("formatted_area".into(), json!(self.formatted_area()));
            fields.insert("location".into(), json!(self.property().location()));
        }
        Ok(json!({
            "lang": self.lang,
            "property": property,
            "site": self.site,
            "features": self.features,
            "seo": self.seo,
            "structured_data": self.structured_data,
            "images": self.images,
            "videos": self.videos,
        }))
    }
}

//! Listing filters and ordering.
//!
//! Shared by [`RecordStore::list_properties`](crate::store::RecordStore::list_properties)
//! and [`PropertyService::filtered_list`](crate::service::PropertyService::filtered_list).
//! Filtering happens in memory over the full record set.
//!
//! ## Sort keys
//!
//! | Field | Comparison |
//! |---|---|
//! | `title`, `city`, `property_type`, `status` | case-insensitive text |
//! | `price`, `surface_area`, `rooms`, `bedrooms`, `bathrooms` | numeric, unparsable → 0 |
//! | `created_at`, `updated_at` | RFC 3339 date, unparsable → minimum date |
//! | anything else | lowercase string of the serialised field, missing → `""` |

use crate::types::{PropertyRecord, PropertySummary, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fields a listing exposes to predicates.
pub trait Listing: Serialize {
    fn title(&self) -> &str;
    fn city(&self) -> Option<&str>;
    fn property_type(&self) -> &str;
    fn status(&self) -> Status;
    fn price(&self) -> Option<f64>;
}

impl Listing for PropertyRecord {
    fn title(&self) -> &str {
        &self.property.title
    }
    fn city(&self) -> Option<&str> {
        self.property.city()
    }
    fn property_type(&self) -> &str {
        self.property.property_type.as_str()
    }
    fn status(&self) -> Status {
        self.property.status
    }
    fn price(&self) -> Option<f64> {
        self.property.price
    }
}

impl Listing for PropertySummary {
    fn title(&self) -> &str {
        &self.title
    }
    fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
    fn property_type(&self) -> &str {
        self.property_type.as_str()
    }
    fn status(&self) -> Status {
        self.status
    }
    fn price(&self) -> Option<f64> {
        self.price
    }
}

/// Conjunction of optional predicates. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilter {
    /// Case-insensitive substring of `"<title> <city>"`.
    pub search: Option<String>,
    /// Case-insensitive equality.
    pub property_type: Option<String>,
    pub status: Option<Status>,
    /// Case-insensitive substring.
    pub city: Option<String>,
    /// Inclusive bounds; a listing without a price counts as 0.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl PropertyFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, listing: &impl Listing) -> bool {
        if let Some(search) = non_blank(&self.search) {
            let haystack = format!(
                "{} {}",
                listing.title(),
                listing.city().unwrap_or_default()
            )
            .to_lowercase();
            if !haystack.contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(kind) = non_blank(&self.property_type)
            && !listing.property_type().eq_ignore_ascii_case(kind.trim())
        {
            return false;
        }
        if let Some(status) = self.status
            && listing.status() != status
        {
            return false;
        }
        if let Some(city) = non_blank(&self.city) {
            let listed = listing.city().unwrap_or_default().to_lowercase();
            if !listed.contains(&city.to_lowercase()) {
                return false;
            }
        }
        let price = listing.price().unwrap_or(0.0);
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("sort direction must be asc or desc, got {other:?}")),
        }
    }
}

/// Ordering by one named field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: "updated_at".to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{} {}", self.field, dir)
    }
}

const NUMERIC_FIELDS: &[&str] = &["price", "surface_area", "rooms", "bedrooms", "bathrooms"];
const DATE_FIELDS: &[&str] = &["created_at", "updated_at"];

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            // Keys of one field always share a variant
            _ => Ordering::Equal,
        }
    }
}

fn sort_key(listing: &impl Listing, field: &str) -> SortKey {
    let value = serde_json::to_value(listing)
        .ok()
        .and_then(|v| v.get(field).cloned())
        .unwrap_or(serde_json::Value::Null);

    if NUMERIC_FIELDS.contains(&field) {
        let number = match &value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        return SortKey::Number(number.unwrap_or(0.0));
    }
    if DATE_FIELDS.contains(&field) {
        let date = value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        return SortKey::Date(date.unwrap_or(DateTime::<Utc>::MIN_UTC));
    }
    let text = match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    SortKey::Text(text.to_lowercase())
}

/// Stable sort by the requested field. Ties keep their input order.
pub fn sort_listings<L: Listing>(listings: Vec<L>, sort: &Sort) -> Vec<L> {
    let mut keyed: Vec<(SortKey, L)> = listings
        .into_iter()
        .map(|listing| (sort_key(&listing, &sort.field), listing))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.compare(b);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    keyed.into_iter().map(|(_, listing)| listing).collect()
}

/// Filter then sort.
pub fn filter_and_sort<L: Listing>(listings: Vec<L>, filter: &PropertyFilter, sort: &Sort) -> Vec<L> {
    let kept: Vec<L> = listings.into_iter().filter(|l| filter.matches(l)).collect();
    sort_listings(kept, sort)
}

//! Display formatting shared by built-in pages and page-file filters.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Round to a whole number and group thousands with commas.
///
/// ```text
/// 500000.0  → 500,000
/// 1234.5    → 1,235
/// -98765.0  → -98,765
/// ```
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

pub fn format_price(price: f64) -> String {
    group_thousands(price)
}

/// Square metres: `120 m²`.
pub fn format_area(area: f64) -> String {
    format!("{} m²", group_thousands(area))
}

/// ISO-8601-ish date to `March 05, 2024`; anything unparsable comes back as-is.
pub fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date = DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"));
    match date {
        Ok(date) => date.format("%B %d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Lowercase, drop punctuation, join words with single hyphens.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lowered, "");
    SLUG_SEPARATORS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

/// Site-relative URL of a copied image.
pub fn image_url(filename: &str) -> String {
    format!("media/images/{}", filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_grouping() {
        assert_eq!(format_price(500_000.0), "500,000");
        assert_eq!(format_price(999.0), "999");
        assert_eq!(format_price(1_000.0), "1,000");
        assert_eq!(format_price(1_234_567.6), "1,234,568");
        assert_eq!(format_price(0.0), "0");
        assert_eq!(format_price(-98_765.0), "-98,765");
    }

    #[test]
    fn area_has_unit() {
        assert_eq!(format_area(120.0), "120 m²");
        assert_eq!(format_area(1500.4), "1,500 m²");
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_date("2024-03-05T10:00:00"), "March 05, 2024");
        assert_eq!(format_date("2024-03-05T10:00:00.123456"), "March 05, 2024");
        assert_eq!(format_date("2024-12-25T08:30:00Z"), "December 25, 2024");
        assert_eq!(format_date("2024-12-25T08:30:00+02:00"), "December 25, 2024");
        assert_eq!(format_date("2023-07-01"), "July 01, 2023");
    }

    #[test]
    fn date_falls_back_to_raw() {
        assert_eq!(format_date("next tuesday"), "next tuesday");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slugify("Villa A, Nice!"), "villa-a-nice");
        assert_eq!(slugify("  Sea -- View  "), "sea-view");
        assert_eq!(slugify("Château d'Eau"), "château-deau");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn image_urls_are_site_relative() {
        assert_eq!(image_url("pool.jpg"), "media/images/pool.jpg");
    }
}

//! CLI output formatting.
//!
//! # Entity Display
//!
//! Every listing leads with its positional index and title; identifiers,
//! paths and figures follow as indented context lines:
//!
//! ```text
//! 001 Villa A
//!     #12 · Villa · Nice · draft
//!     Price: 500,000 EUR · Area: 180 m² · Rooms: 6
//!     Media: 4 files (3 images)
//! ```
//!
//! ## Generate
//!
//! ```text
//! [ 10%] preparing: Preparing sites/villa-a
//! [ 20%] processing media: Processing pool.jpg
//!     index.html: rendered
//!     gallery.html: fallback (page file not found: ...)
//! [100%] done: Done
//!
//! Generated sites/villa-a with template modern (4 pages, 3 media files)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function returning `Vec<String>` and, where
//! the CLI prints it directly, a `print_*` wrapper. Format functions do no
//! I/O.

use crate::generate::{GenerateEvent, GeneratedSite};
use crate::media::ValidationReport;
use crate::render::filters::{format_area, format_price};
use crate::types::{PropertyRecord, PropertySummary, ProjectRecord, Statistics, Template};

// ============================================================================
// Shared helpers
// ============================================================================

/// 1-based positional index, 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn money(amount: f64, currency: &str) -> String {
    format!("{} {}", format_price(amount), currency)
}

/// Join the present parts with ` · `.
fn join_parts(parts: impl IntoIterator<Item = Option<String>>) -> String {
    parts.into_iter().flatten().collect::<Vec<_>>().join(" · ")
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Properties
// ============================================================================

/// The figures line shared by list and detail views.
fn figures_line(
    price: Option<f64>,
    currency: &str,
    area: Option<f64>,
    rooms: Option<u32>,
    bedrooms: Option<u32>,
) -> String {
    join_parts([
        price.map(|p| format!("Price: {}", money(p, currency))),
        area.map(|a| format!("Area: {}", format_area(a))),
        rooms.map(|r| format!("Rooms: {}", r)),
        bedrooms.map(|b| format!("Bedrooms: {}", b)),
    ])
}

pub fn format_property_list(summaries: &[PropertySummary]) -> Vec<String> {
    if summaries.is_empty() {
        return vec!["No properties".to_string()];
    }
    let mut lines = Vec::new();
    for (i, summary) in summaries.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), summary.title));
        lines.push(format!(
            "{}{}",
            indent(1),
            join_parts([
                Some(format!("#{}", summary.id)),
                Some(summary.property_type.to_string()),
                summary.city.clone(),
                Some(summary.status.to_string()),
            ])
        ));
        let figures = figures_line(
            summary.price,
            &summary.currency,
            summary.surface_area,
            summary.rooms,
            summary.bedrooms,
        );
        if !figures.is_empty() {
            lines.push(format!("{}{}", indent(1), figures));
        }
        if summary.media_count > 0 {
            lines.push(format!(
                "{}Media: {} files ({} images)",
                indent(1),
                summary.media_count,
                summary.image_count
            ));
        }
    }
    lines
}

pub fn print_property_list(summaries: &[PropertySummary]) {
    print_lines(format_property_list(summaries));
}

/// Full view of one property, media included.
pub fn format_property(record: &PropertyRecord) -> Vec<String> {
    let property = &record.property;
    let mut lines = vec![
        format!("#{} {}", record.id, property.title),
        format!(
            "{}{}",
            indent(1),
            join_parts([
                Some(property.property_type.to_string()),
                Some(property.status.to_string()),
                property.template_id.as_ref().map(|t| format!("template {}", t)),
            ])
        ),
    ];

    let figures = figures_line(
        property.price,
        &property.currency,
        property.surface_area,
        property.rooms,
        property.bedrooms,
    );
    if !figures.is_empty() {
        lines.push(format!("{}{}", indent(1), figures));
    }
    if let Some(bathrooms) = property.bathrooms {
        lines.push(format!("{}Bathrooms: {}", indent(1), bathrooms));
    }

    let address = join_parts([
        property.address.street.clone(),
        property.address.postal_code.clone(),
        property.address.city.clone(),
        property.address.country.clone(),
    ]);
    if !address.is_empty() {
        lines.push(format!("{}Address: {}", indent(1), address));
    }
    if let Some(coords) = property.coordinates {
        lines.push(format!(
            "{}Coordinates: {:.5}, {:.5}",
            indent(1),
            coords.latitude,
            coords.longitude
        ));
    }
    if let Some(description) = property.description.as_deref().map(str::trim)
        && !description.is_empty()
    {
        lines.push(format!("{}{}", indent(1), truncate(description, 72)));
    }
    if !property.features.is_empty() {
        lines.push(format!("{}Features: {}", indent(1), property.features.join(", ")));
    }
    if !property.amenities.is_empty() {
        lines.push(format!("{}Amenities: {}", indent(1), property.amenities.join(", ")));
    }

    if !property.media.is_empty() {
        lines.push(format!("{}Media", indent(1)));
        for (i, media) in property.media.iter().enumerate() {
            lines.push(format!(
                "{}{} {} ({})",
                indent(2),
                format_index(i + 1),
                media.filename(),
                media.kind.as_str()
            ));
            if !media.variants.is_empty() {
                let variants: Vec<&str> = media.variants.keys().map(String::as_str).collect();
                lines.push(format!("{}Variants: {}", indent(3), variants.join(", ")));
            }
        }
    }

    let dates = join_parts([
        record.created_at.map(|t| format!("Created: {}", t.format("%Y-%m-%d %H:%M"))),
        record.updated_at.map(|t| format!("Updated: {}", t.format("%Y-%m-%d %H:%M"))),
    ]);
    if !dates.is_empty() {
        lines.push(format!("{}{}", indent(1), dates));
    }
    lines
}

pub fn print_property(record: &PropertyRecord) {
    print_lines(format_property(record));
}

pub fn format_statistics(stats: &Statistics) -> Vec<String> {
    let mut lines = vec![
        format!("Properties: {}", stats.total_properties),
        format!("Total value: {}", format_price(stats.total_value)),
        format!("Average price: {}", format_price(stats.average_price)),
        format!("Media files: {}", stats.total_media_files),
    ];
    for (heading, counts) in [("By type", &stats.by_type), ("By status", &stats.by_status)] {
        if counts.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (key, count) in counts {
            lines.push(format!("{}{}: {}", indent(1), key, count));
        }
    }
    lines
}

pub fn print_statistics(stats: &Statistics) {
    print_lines(format_statistics(stats));
}

// ============================================================================
// Media validation
// ============================================================================

pub fn format_validation(report: &ValidationReport) -> Vec<String> {
    let verdict = if report.valid { "ok" } else { "invalid" };
    let mut lines = vec![format!("{}: {}", report.path.display(), verdict)];
    if let Some(info) = &report.info {
        let size_mb = info.size_bytes as f64 / (1024.0 * 1024.0);
        let mut detail = format!("{}{} · {:.1}MB", indent(1), info.kind.as_str(), size_mb);
        if let Some((w, h)) = info.dimensions {
            detail.push_str(&format!(" · {}x{}", w, h));
        }
        lines.push(detail);
    }
    for error in &report.errors {
        lines.push(format!("{}error: {}", indent(1), error));
    }
    for warning in &report.warnings {
        lines.push(format!("{}warning: {}", indent(1), warning));
    }
    lines
}

// ============================================================================
// Templates and projects
// ============================================================================

pub fn format_templates<'a>(templates: impl IntoIterator<Item = &'a Template>) -> Vec<String> {
    let mut lines = Vec::new();
    for template in templates {
        let source = if template.directory.is_some() { "directory" } else { "built-in" };
        lines.push(format!("{} ({}, {})", template.id, template.style.as_str(), source));
        lines.push(format!("{}{}", indent(1), template.name));
        if !template.description.is_empty() {
            lines.push(format!("{}{}", indent(1), template.description));
        }
        if let Some(dir) = &template.directory {
            lines.push(format!("{}Source: {}", indent(1), dir.display()));
        }
    }
    lines
}

pub fn format_projects(projects: &[ProjectRecord]) -> Vec<String> {
    if projects.is_empty() {
        return vec!["No projects".to_string()];
    }
    let mut lines = Vec::new();
    for (i, record) in projects.iter().enumerate() {
        let project = &record.project;
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            project.name,
            project.status.as_str()
        ));
        lines.push(format!(
            "{}Property: {} · Template: {}",
            indent(1),
            record
                .property_title
                .clone()
                .unwrap_or_else(|| format!("#{}", project.property_id)),
            record
                .template_name
                .clone()
                .unwrap_or_else(|| project.template_id.clone())
        ));
        lines.push(format!("{}Output: {}", indent(1), project.output_path.display()));
    }
    lines
}

// ============================================================================
// Site generation
// ============================================================================

/// One progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::Stage {
            stage,
            percent,
            message,
        } => vec![format!("[{:>3}%] {}: {}", percent, stage.label(), message)],
        GenerateEvent::Page { page, outcome } => {
            vec![format!("{}{}: {}", indent(1), page.file_name(), outcome)]
        }
    }
}

pub fn format_generated_site(site: &GeneratedSite) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Generated {} with template {} ({} pages, {} media files)",
            site.root.display(),
            site.template_id,
            site.pages.len(),
            site.media_copied
        ),
    ];
    let fallbacks: Vec<String> = site.fallback_pages().map(|p| p.file_name()).collect();
    if !fallbacks.is_empty() {
        lines.push(format!("{}Fallback pages: {}", indent(1), fallbacks.join(", ")));
    }
    lines
}

pub fn print_generated_site(site: &GeneratedSite) {
    print_lines(format_generated_site(site));
}

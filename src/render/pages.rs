//! Compiled-in pages for the built-in templates, and the fallback page.
//!
//! Uses [maud](https://maud.lambda.xyz/) so every interpolated value is
//! escaped. Pages link `css/style.css` and `js/script.js`, which the
//! generator writes next to them.

use super::context::{RenderContext, SiteImage};
use super::filters::{format_date, format_price};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fmt;

/// The four pages every generated site has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Index,
    Gallery,
    Contact,
    Details,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Index, Page::Gallery, Page::Contact, Page::Details];

    pub fn name(self) -> &'static str {
        match self {
            Page::Index => "index",
            Page::Gallery => "gallery",
            Page::Contact => "contact",
            Page::Details => "details",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.html", self.name())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// UI strings for one language.
struct Labels {
    home: &'static str,
    gallery: &'static str,
    contact: &'static str,
    details: &'static str,
    price_on_request: &'static str,
    description: &'static str,
    no_description: &'static str,
    features: &'static str,
    amenities: &'static str,
    property_type: &'static str,
    status: &'static str,
    price: &'static str,
    area: &'static str,
    rooms: &'static str,
    bedrooms: &'static str,
    bathrooms: &'static str,
    address: &'static str,
    listed: &'static str,
    reference: &'static str,
    floor_plan: &'static str,
    no_images: &'static str,
    videos: &'static str,
    ask_visit: &'static str,
    name: &'static str,
    email: &'static str,
    phone: &'static str,
    message: &'static str,
    send: &'static str,
    mortgage: &'static str,
    amount: &'static str,
    deposit: &'static str,
    rate: &'static str,
    years: &'static str,
    monthly: &'static str,
    calculate: &'static str,
    map: &'static str,
    virtual_tour: &'static str,
    virtual_tour_soon: &'static str,
    share: &'static str,
    generated_by: &'static str,
}

static EN: Labels = Labels {
    home: "Home",
    gallery: "Gallery",
    contact: "Contact",
    details: "Details",
    price_on_request: "Price on request",
    description: "Description",
    no_description: "No description available.",
    features: "Features",
    amenities: "Amenities",
    property_type: "Type",
    status: "Status",
    price: "Price",
    area: "Area",
    rooms: "Rooms",
    bedrooms: "Bedrooms",
    bathrooms: "Bathrooms",
    address: "Address",
    listed: "Listed",
    reference: "Reference",
    floor_plan: "Floor plan",
    no_images: "No photos yet.",
    videos: "Videos",
    ask_visit: "Arrange a visit",
    name: "Name",
    email: "Email",
    phone: "Phone",
    message: "Message",
    send: "Send",
    mortgage: "Mortgage calculator",
    amount: "Property price",
    deposit: "Deposit",
    rate: "Interest rate (%)",
    years: "Duration (years)",
    monthly: "Monthly payment",
    calculate: "Calculate",
    map: "Location",
    virtual_tour: "Virtual tour",
    virtual_tour_soon: "The virtual tour will be available soon.",
    share: "Share",
    generated_by: "Generated by",
};

static FR: Labels = Labels {
    home: "Accueil",
    gallery: "Galerie",
    contact: "Contact",
    details: "Détails",
    price_on_request: "Prix sur demande",
    description: "Description",
    no_description: "Aucune description disponible.",
    features: "Caractéristiques",
    amenities: "Équipements",
    property_type: "Type",
    status: "Statut",
    price: "Prix",
    area: "Surface",
    rooms: "Pièces",
    bedrooms: "Chambres",
    bathrooms: "Salles de bain",
    address: "Adresse",
    listed: "Publié le",
    reference: "Référence",
    floor_plan: "Plan",
    no_images: "Aucune photo pour le moment.",
    videos: "Vidéos",
    ask_visit: "Organiser une visite",
    name: "Nom",
    email: "E-mail",
    phone: "Téléphone",
    message: "Message",
    send: "Envoyer",
    mortgage: "Simulateur de prêt",
    amount: "Prix du bien",
    deposit: "Apport",
    rate: "Taux d'intérêt (%)",
    years: "Durée (années)",
    monthly: "Mensualité",
    calculate: "Calculer",
    map: "Localisation",
    virtual_tour: "Visite virtuelle",
    virtual_tour_soon: "La visite virtuelle sera bientôt disponible.",
    share: "Partager",
    generated_by: "Généré par",
};

fn labels(lang: &str) -> &'static Labels {
    match lang {
        "fr" => &FR,
        _ => &EN,
    }
}

fn nav_label(labels: &Labels, page: Page) -> &'static str {
    match page {
        Page::Index => labels.home,
        Page::Gallery => labels.gallery,
        Page::Contact => labels.contact,
        Page::Details => labels.details,
    }
}

/// `500,000 EUR`, or the "on request" label.
fn price_text(ctx: &RenderContext, labels: &Labels) -> String {
    match ctx.formatted_price() {
        Some(price) => format!("{} {}", price, ctx.property().currency),
        None => labels.price_on_request.to_string(),
    }
}

/// JSON-LD must not close its own script element.
fn json_ld(data: &str) -> PreEscaped<String> {
    PreEscaped(data.replace("</", "<\\/"))
}

// ============================================================================
// Layout
// ============================================================================

fn layout(ctx: &RenderContext, page: Page, content: Markup) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    let title = if page == Page::Index {
        property.title.clone()
    } else {
        format!("{} | {}", nav_label(labels, page), property.title)
    };
    let year = ctx.site.generated_date.get(..4).unwrap_or_default();

    html! {
        (DOCTYPE)
        html lang=(ctx.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(ctx.seo.description);
                meta name="keywords" content=(ctx.seo.keywords);
                meta name="generator" content={ (ctx.site.generator) " " (ctx.site.version) };
                meta property="og:title" content=(ctx.seo.og_title);
                meta property="og:description" content=(ctx.seo.og_description);
                meta property="og:type" content=(ctx.seo.og_type);
                @if let Some(image) = ctx.images.first() {
                    meta property="og:image" content=(image.display_url());
                }
                meta name="twitter:card" content=(ctx.seo.twitter_card);
                link rel="stylesheet" href="css/style.css";
                @if page == Page::Index {
                    script type="application/ld+json" { (json_ld(&ctx.structured_data)) }
                }
            }
            body class={ "page-" (page.name()) } {
                header {
                    div.container {
                        nav {
                            a.brand href="index.html" { (property.title) }
                            ul {
                                @for target in Page::ALL {
                                    li {
                                        a href=(target.file_name())
                                            aria-current=[(target == page).then_some("page")] {
                                            (nav_label(labels, target))
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                main { (content) }
                footer {
                    div.container {
                        @if ctx.features.social_sharing {
                            div.share {
                                span { (labels.share) }
                                a.share-link href="#" data-network="facebook" { "Facebook" }
                                a.share-link href="#" data-network="twitter" { "X" }
                                a.share-link href="#" data-network="email" { (labels.email) }
                            }
                        }
                        p {
                            "© " (year) " · " (labels.generated_by) " " (ctx.site.generator)
                        }
                    }
                }
                script src="js/script.js" {}
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn fact(label: &str, value: Option<String>) -> Markup {
    html! {
        @if let Some(value) = value {
            div {
                dt { (label) }
                dd { (value) }
            }
        }
    }
}

fn render_index(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    let location = property.location();

    let content = html! {
        section.hero {
            div.container {
                @if let Some(image) = ctx.images.first() {
                    img.hero-image src=(image.display_url()) alt=(property.title);
                }
                div.hero-content {
                    h1 { (property.title) }
                    p.price { (price_text(ctx, labels)) }
                    @if !location.is_empty() {
                        p.location { (location) }
                    }
                }
            }
        }
        section.block {
            div.container {
                dl.facts {
                    (fact(labels.property_type, Some(property.property_type.to_string())))
                    (fact(labels.area, ctx.formatted_area()))
                    (fact(labels.rooms, property.rooms.map(|n| n.to_string())))
                    (fact(labels.bedrooms, property.bedrooms.map(|n| n.to_string())))
                    (fact(labels.bathrooms, property.bathrooms.map(|n| n.to_string())))
                }
                h2 { (labels.description) }
                p.description {
                    (property.description.as_deref().unwrap_or(labels.no_description))
                }
                @if !property.features.is_empty() {
                    div.features {
                        h3 { (labels.features) }
                        ul {
                            @for feature in &property.features {
                                li { (feature) }
                            }
                        }
                    }
                }
                @if ctx.features.contact_form {
                    p { a.button href="contact.html" { (labels.ask_visit) } }
                }
            }
        }
    };
    layout(ctx, Page::Index, content)
}

fn gallery_item(image: &SiteImage, alt: &str) -> Markup {
    let preview = image.thumbnail.as_deref().unwrap_or(&image.url);
    html! {
        img data-src=(preview) data-full=(image.full_url()) alt=(alt) loading="lazy";
    }
}

fn render_gallery(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let title = &ctx.property().title;

    let content = html! {
        section.block {
            div.container {
                h1 { (labels.gallery) }
                @if ctx.features.image_gallery && !ctx.images.is_empty() {
                    div.gallery {
                        @for image in &ctx.images {
                            (gallery_item(image, title))
                        }
                    }
                } @else {
                    p { (labels.no_images) }
                }
                @if !ctx.videos.is_empty() {
                    div.videos {
                        h2 { (labels.videos) }
                        @for video in &ctx.videos {
                            video controls preload="metadata" src=(video.url) {}
                        }
                    }
                }
            }
        }
    };
    layout(ctx, Page::Gallery, content)
}

fn render_contact(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    let mortgage_price = property.price.filter(|_| ctx.features.mortgage_calculator);

    let content = html! {
        section.block {
            div.container {
                h1 { (labels.contact) }
                @if ctx.features.contact_form {
                    form.contact action="#" method="post" {
                        input type="hidden" name="property" value=(ctx.record.id);
                        label { (labels.name) input type="text" name="name" required; }
                        label { (labels.email) input type="email" name="email" required; }
                        label { (labels.phone) input type="tel" name="phone"; }
                        label {
                            (labels.message)
                            textarea name="message" rows="5" { (labels.ask_visit) ": " (property.title) }
                        }
                        button type="submit" { (labels.send) }
                    }
                }
            }
        }
        @if let Some(price) = mortgage_price {
            section.block {
                div.container {
                    h2 { (labels.mortgage) }
                    div.calculator {
                        label { (labels.amount) input type="number" name="amount" value=(price.round()); }
                        label { (labels.deposit) input type="number" name="deposit" value=((price * 0.2).round()); }
                        label { (labels.rate) input type="number" name="rate" step="0.05" value="3.5"; }
                        label { (labels.years) input type="number" name="years" value="20"; }
                        button type="button" { (labels.calculate) }
                        p { (labels.monthly) ": " output { "-" } " " (property.currency) }
                    }
                }
            }
        }
        @if ctx.features.map_integration {
            (render_map(ctx))
        }
    };
    layout(ctx, Page::Contact, content)
}

fn render_map(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    let address_lines: Vec<&str> = [
        property.address.street.as_deref(),
        property.address.postal_code.as_deref(),
        property.address.city.as_deref(),
        property.address.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect();

    if property.coordinates.is_none() && address_lines.is_empty() {
        return html! {};
    }

    html! {
        section.block {
            div.container {
                h2 { (labels.map) }
                @if !address_lines.is_empty() {
                    address { (address_lines.join(", ")) }
                }
                @if let Some(coords) = property.coordinates {
                    iframe.map width="100%" height="360" loading="lazy" title=(labels.map)
                        src=(format!(
                            "https://www.openstreetmap.org/export/embed.html?bbox={},{},{},{}&layer=mapnik&marker={},{}",
                            coords.longitude - 0.01,
                            coords.latitude - 0.01,
                            coords.longitude + 0.01,
                            coords.latitude + 0.01,
                            coords.latitude,
                            coords.longitude,
                        )) {}
                }
            }
        }
    }
}

fn render_details(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    let rows: Vec<(&str, Option<String>)> = vec![
        (labels.reference, Some(format!("#{}", ctx.record.id))),
        (labels.property_type, Some(property.property_type.to_string())),
        (labels.status, Some(property.status.to_string())),
        (
            labels.price,
            property
                .price
                .map(|p| format!("{} {}", format_price(p), property.currency)),
        ),
        (labels.area, ctx.formatted_area()),
        (labels.rooms, property.rooms.map(|n| n.to_string())),
        (labels.bedrooms, property.bedrooms.map(|n| n.to_string())),
        (labels.bathrooms, property.bathrooms.map(|n| n.to_string())),
        (labels.address, Some(property.location()).filter(|l| !l.is_empty())),
        (
            labels.listed,
            ctx.record.created_at.map(|at| format_date(&at.to_rfc3339())),
        ),
    ];

    let content = html! {
        section.block {
            div.container {
                h1 { (labels.details) }
                table.specs {
                    tbody {
                        @for (label, value) in &rows {
                            @if let Some(value) = value {
                                tr { th scope="row" { (label) } td { (value) } }
                            }
                        }
                    }
                }
                @if !property.amenities.is_empty() {
                    div.features {
                        h2 { (labels.amenities) }
                        ul {
                            @for amenity in &property.amenities {
                                li { (amenity) }
                            }
                        }
                    }
                }
                @if !property.floor_plan.is_empty() {
                    h2 { (labels.floor_plan) }
                    table.specs {
                        tbody {
                            @for (room, value) in &property.floor_plan {
                                tr {
                                    th scope="row" { (room) }
                                    td {
                                        @match value {
                                            serde_json::Value::String(s) => { (s) }
                                            other => { (other.to_string()) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                @if ctx.features.virtual_tour {
                    section id="virtual-tour" {
                        h2 { (labels.virtual_tour) }
                        p { (labels.virtual_tour_soon) }
                    }
                }
            }
        }
    };
    layout(ctx, Page::Details, content)
}

/// Built-in markup for one page.
pub fn builtin_page(page: Page, ctx: &RenderContext) -> Markup {
    match page {
        Page::Index => render_index(ctx),
        Page::Gallery => render_gallery(ctx),
        Page::Contact => render_contact(ctx),
        Page::Details => render_details(ctx),
    }
}

const FALLBACK_CSS: &str = "body { font-family: Arial, sans-serif; margin: 0; padding: 20px; } \
.container { max-width: 1200px; margin: 0 auto; } \
.property-info { background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0; }";

/// Self-contained page used when a page file is missing or fails to render.
pub fn fallback_page(ctx: &RenderContext) -> Markup {
    let labels = labels(&ctx.lang);
    let property = ctx.property();
    html! {
        (DOCTYPE)
        html lang=(ctx.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (property.title) }
                style { (PreEscaped(FALLBACK_CSS)) }
            }
            body {
                div.container {
                    h1 { (property.title) }
                    div.property-info {
                        p { (property.description.as_deref().unwrap_or(labels.no_description)) }
                    }
                }
            }
        }
    }
}

//! End-to-end listing workflow through the public library API.
//!
//! Uses the real image backend on small synthetic JPEGs, an on-disk SQLite
//! database and temporary directories for media and sites.

use homeshow::generate::{GenerateError, GenerateOptions, SiteGenerator};
use homeshow::imaging::{Quality, RustBackend};
use homeshow::query::{PropertyFilter, Sort};
use homeshow::render::PageOutcome;
use homeshow::service::{BUNDLE_FILE, PropertyService};
use homeshow::store::RecordStore;
use homeshow::templates::TemplateRegistry;
use homeshow::types::{MediaKind, Property, PropertyType, Status};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(path).unwrap();
}

async fn service(tmp: &TempDir) -> PropertyService<RustBackend> {
    let store = RecordStore::open(&tmp.path().join("data/database.db"))
        .await
        .unwrap();
    PropertyService::new(
        store,
        RustBackend::new(),
        tmp.path().join("data/projects"),
        Quality::default(),
    )
}

fn generator(tmp: &TempDir) -> SiteGenerator<RustBackend> {
    SiteGenerator::new(
        RustBackend::new(),
        TemplateRegistry::load(&tmp.path().join("templates")),
        tmp.path().join("sites"),
        tmp.path().join("data/projects"),
    )
}

fn villa() -> Property {
    let mut property = Property::new("Villa A");
    property.property_type = PropertyType::Villa;
    property.price = Some(500_000.0);
    property.surface_area = Some(180.0);
    property.address.city = Some("Nice".into());
    property.features = vec!["Pool".into(), "Sea view".into()];
    property
}

#[tokio::test]
async fn create_attach_and_generate() {
    let tmp = TempDir::new().unwrap();
    let service = service(&tmp).await;
    let photo = tmp.path().join("pool.jpg");
    write_jpeg(&photo, 1600, 1200);
    let missing = PathBuf::from("/nonexistent/garden.jpg");

    let (id, media_dir) = service
        .create_with_media(&villa(), &[photo.clone(), missing])
        .await
        .unwrap();

    let record = service.get(id).await.unwrap();
    assert_eq!(record.property.media.len(), 1);
    let pool = &record.property.media[0];
    assert_eq!(pool.kind, MediaKind::Image);
    assert!(media_dir.join("pool.jpg").is_file());
    assert!(media_dir.join("derived/pool.jpg_thumbnail.jpg").is_file());
    assert!(pool.variants.contains_key("medium"));

    let site = generator(&tmp)
        .generate(&record, "modern", "villa-a", &GenerateOptions::default(), None)
        .unwrap();

    assert!(site.pages.iter().all(|(_, outcome)| *outcome == PageOutcome::Rendered));
    let index = fs::read_to_string(site.root.join("index.html")).unwrap();
    assert!(index.contains("Villa A"));
    assert!(index.contains("500,000"));
    assert!(site.root.join("media/images/pool.jpg").is_file());
    assert!(site.root.join("media/thumbnails/pool.jpg_thumbnail.jpg").is_file());
    // 1600x1200 exceeds the small and medium caps but not the large one
    assert!(site.root.join("media/images/sized/pool.jpg_small.jpg").is_file());
    assert!(site.root.join("media/images/sized/pool.jpg_medium.jpg").is_file());
    assert!(!site.root.join("media/images/sized/pool.jpg_large.jpg").exists());
}

#[tokio::test]
async fn unknown_template_leaves_no_output() {
    let tmp = TempDir::new().unwrap();
    let service = service(&tmp).await;
    let id = service.create(&villa()).await.unwrap();
    let record = service.get(id).await.unwrap();

    let result = generator(&tmp).generate(
        &record,
        "nonexistent",
        "villa-a",
        &GenerateOptions::default(),
        None,
    );

    assert!(matches!(result, Err(GenerateError::UnknownTemplate(_))));
    assert!(!tmp.path().join("sites/villa-a").exists());
}

#[tokio::test]
async fn duplicate_export_import_delete() {
    let tmp = TempDir::new().unwrap();
    let service = service(&tmp).await;
    let photo = tmp.path().join("front.jpg");
    write_jpeg(&photo, 400, 300);
    let (id, _) = service.create_with_media(&villa(), &[photo]).await.unwrap();

    let mut listed = villa();
    listed.status = Status::Published;
    listed.media = service.get(id).await.unwrap().property.media;
    service.update(id, &listed).await.unwrap();

    // Duplicate
    let copy_id = service.duplicate(id, None).await.unwrap();
    let copy = service.get(copy_id).await.unwrap();
    assert_eq!(copy.property.title, "Villa A (Copy)");
    assert_eq!(copy.property.status, Status::Draft);
    assert!(service.media_dir(copy_id).join("front.jpg").is_file());
    let copied_source = copy.property.media[0].source_path(service.projects_dir());
    assert!(copied_source.starts_with(service.media_dir(copy_id)));

    // Export then import
    let bundle = tmp.path().join("bundle");
    service.export(id, &bundle).await.unwrap();
    assert!(bundle.join(BUNDLE_FILE).is_file());
    assert!(bundle.join("media/front.jpg").is_file());
    let imported_id = service.import(&bundle).await.unwrap();
    let imported = service.get(imported_id).await.unwrap();
    assert_eq!(imported.property.title, "Villa A");
    assert!(service.media_dir(imported_id).join("front.jpg").is_file());

    // Delete removes record and media
    assert!(service.delete_with_media(id).await.unwrap());
    assert!(!service.media_dir(id).exists());
    assert!(service.get(id).await.is_err());
    assert!(!service.delete_with_media(id).await.unwrap());

    let listed = service
        .filtered_list(&PropertyFilter::default(), &Sort::asc("title"))
        .await
        .unwrap();
    let titles: Vec<_> = listed.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Villa A", "Villa A (Copy)"]);

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.total_properties, 2);
    assert_eq!(stats.total_value, 1_000_000.0);
}

#[tokio::test]
async fn directory_template_with_partial_pages() {
    let tmp = TempDir::new().unwrap();
    let service = service(&tmp).await;
    let id = service.create(&villa()).await.unwrap();
    let record = service.get(id).await.unwrap();

    let dir = tmp.path().join("templates/coastal");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("template.json"), r#"{"name": "Coastal", "style": "minimal"}"#).unwrap();
    fs::write(
        dir.join("index.html"),
        "<h1>{{ property.title }}</h1><p>{{ property.price | format_price }} {{ property.currency }}</p>",
    )
    .unwrap();
    fs::write(dir.join("details.html"), "{{ property.title").unwrap();

    let generator = generator(&tmp);
    let template = generator.registry().get("coastal").unwrap().clone();
    service.store().upsert_template(&template).await.unwrap();

    let site = generator
        .generate(&record, "coastal", "coastal", &GenerateOptions::default(), None)
        .unwrap();

    assert_eq!(
        fs::read_to_string(site.root.join("index.html")).unwrap(),
        "<h1>Villa A</h1><p>500,000 EUR</p>"
    );
    let fallbacks: Vec<_> = site.fallback_pages().map(|p| p.file_name()).collect();
    assert_eq!(fallbacks, ["gallery.html", "contact.html", "details.html"]);
    let details = fs::read_to_string(site.root.join("details.html")).unwrap();
    assert!(details.contains("Villa A"));
    assert!(site.root.join("css/style.css").is_file());
    assert!(site.root.join("sitemap.xml").is_file());
}

//! Page rendering.
//!
//! Built-in templates render compiled-in maud pages. A template loaded from
//! a directory renders `<dir>/<page>.html` through the Jinja-style engine in
//! [`engine`]. Either way a page always comes out: when a page file is
//! missing or fails to render, the self-contained fallback page is written
//! instead and the outcome says so.

pub mod context;
pub mod engine;
pub mod filters;
pub mod pages;

pub use context::{Features, RenderContext, Seo, SiteImage, SiteMeta, SiteVideo};
pub use pages::Page;

use crate::types::Template;
use minijinja::Environment;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("page file not found: {0}")]
    MissingPage(PathBuf),
}

/// Which path produced a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Rendered,
    /// The fallback page was written; carries the reason.
    FellBackToDefault(String),
}

impl PageOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, PageOutcome::FellBackToDefault(_))
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageOutcome::Rendered => f.write_str("rendered"),
            PageOutcome::FellBackToDefault(reason) => write!(f, "fallback ({})", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page: Page,
    pub html: String,
    pub outcome: PageOutcome,
}

/// Page files of a directory template plus the context they render with.
struct DirectoryPages {
    dir: PathBuf,
    env: Environment<'static>,
    json: Value,
}

/// Renders the four pages of one site with one template.
pub struct PageRenderer<'a> {
    template: &'a Template,
    context: &'a RenderContext,
    /// Only built for directory templates.
    directory: Option<DirectoryPages>,
}

impl<'a> PageRenderer<'a> {
    pub fn new(template: &'a Template, context: &'a RenderContext) -> serde_json::Result<Self> {
        let directory = match &template.directory {
            Some(dir) => Some(DirectoryPages {
                dir: dir.clone(),
                env: engine::environment(Some(dir)),
                json: context.to_json()?,
            }),
            None => None,
        };
        Ok(Self {
            template,
            context,
            directory,
        })
    }

    fn render_file(&self, page: Page) -> Result<String, RenderError> {
        let Some(directory) = &self.directory else {
            return Ok(pages::builtin_page(page, self.context).into_string());
        };
        let name = page.file_name();
        let path = directory.dir.join(&name);
        if !path.is_file() {
            return Err(RenderError::MissingPage(path));
        }
        engine::render_file(&directory.env, &name, &directory.json)
    }

    /// Never fails: errors turn into the fallback page.
    pub fn render(&self, page: Page) -> RenderedPage {
        match self.render_file(page) {
            Ok(html) => RenderedPage {
                page,
                html,
                outcome: PageOutcome::Rendered,
            },
            Err(e) => {
                tracing::warn!(
                    template = %self.template.id,
                    page = %page,
                    error = %e,
                    "page fell back to default"
                );
                RenderedPage {
                    page,
                    html: pages::fallback_page(self.context).into_string(),
                    outcome: PageOutcome::FellBackToDefault(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRegistry;
    use crate::types::{Property, PropertyRecord};
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn context() -> RenderContext {
        let mut property = Property::new("Villa A");
        property.price = Some(500_000.0);
        let record = PropertyRecord {
            id: 1,
            created_at: None,
            updated_at: None,
            property,
        };
        RenderContext::new(record, "en", Features::default(), Utc::now())
    }

    fn directory_template(tmp: &TempDir) -> Template {
        let mut template = TemplateRegistry::builtin().get("modern").unwrap().clone();
        template.id = "custom".into();
        template.directory = Some(tmp.path().to_path_buf());
        template
    }

    #[test]
    fn builtin_template_renders_every_page() {
        let registry = TemplateRegistry::builtin();
        let ctx = context();
        let renderer = PageRenderer::new(registry.get("luxury").unwrap(), &ctx).unwrap();
        for page in Page::ALL {
            let rendered = renderer.render(page);
            assert_eq!(rendered.outcome, PageOutcome::Rendered, "{page}");
            assert!(rendered.html.contains("Villa A"));
        }
    }

    #[test]
    fn directory_template_page_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("index.html"),
            "<h1>{{ property.title }}</h1><p>{{ property.price | format_price }}</p>",
        )
        .unwrap();
        let template = directory_template(&tmp);
        let ctx = context();
        let renderer = PageRenderer::new(&template, &ctx).unwrap();

        let rendered = renderer.render(Page::Index);
        assert_eq!(rendered.outcome, PageOutcome::Rendered);
        assert_eq!(rendered.html, "<h1>Villa A</h1><p>500,000</p>");
    }

    #[test]
    fn missing_page_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        let template = directory_template(&tmp);
        let ctx = context();

        let rendered = PageRenderer::new(&template, &ctx).unwrap().render(Page::Gallery);
        assert!(rendered.outcome.is_fallback());
        assert!(rendered.html.contains("property-info"));
        match rendered.outcome {
            PageOutcome::FellBackToDefault(reason) => assert!(reason.contains("gallery.html")),
            PageOutcome::Rendered => unreachable!(),
        }
    }

    #[test]
    fn broken_page_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("contact.html"), "{{ agent.phone }}").unwrap();
        let template = directory_template(&tmp);
        let ctx = context();

        let rendered = PageRenderer::new(&template, &ctx).unwrap().render(Page::Contact);
        match rendered.outcome {
            PageOutcome::FellBackToDefault(reason) => assert!(reason.starts_with("template error")),
            PageOutcome::Rendered => unreachable!(),
        }
    }

    #[test]
    fn directory_gallery_loops_over_images() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("gallery.html"),
            "{% for image in images %}<a href=\"{{ image.url }}\">{{ image.filename }}</a>{% else %}empty{% endfor %}",
        )
        .unwrap();
        let template = directory_template(&tmp);
        let mut ctx = context();
        ctx.images.push(SiteImage {
            filename: "pool.jpg".into(),
            url: "media/images/pool.jpg".into(),
            thumbnail: None,
            sizes: Default::default(),
        });

        let rendered = PageRenderer::new(&template, &ctx).unwrap().render(Page::Gallery);
        assert_eq!(rendered.outcome, PageOutcome::Rendered);
        assert_eq!(rendered.html, "<a href=\"media/images/pool.jpg\">pool.jpg</a>");
    }
}

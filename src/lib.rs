//! # homeshow
//!
//! A real-estate listing manager. Property records live in SQLite, their
//! photos and videos in a per-property media directory, and any record can
//! be turned into a self-contained static marketing website.
//!
//! # Architecture
//!
//! ```text
//! record JSON ──► PropertyService ──► RecordStore (SQLite)
//!                      │
//!                      └──► media ──► projects/property_<id>/media/
//!
//! PropertyRecord + Template ──► SiteGenerator ──► sites/<name>/
//! ```
//!
//! The service owns the pairing between a record and its media directory:
//! creating, duplicating, importing and deleting a property touch both. The
//! generator reads a record and never writes back; the CLI records each run
//! as a project.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | SQLite persistence for properties, templates and projects |
//! | [`service`] | Property lifecycle: CRUD plus media, duplicate, import/export, statistics |
//! | [`media`] | Classification, validation and size derivatives for attached files |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, thumbnail |
//! | [`generate`] | Static site generation: media, pages, assets, robots/sitemap |
//! | [`render`] | Page rendering: compiled-in maud pages and directory templates |
//! | [`templates`] | Built-in template catalogue and on-disk template discovery |
//! | [`query`] | Search, filter and sort over property listings |
//! | [`backup`] | Timestamped database backups with retention |
//! | [`config`] | `settings.toml` loading, merging and validation |
//! | [`types`] | Records shared across modules |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Media Paths Are Structured
//!
//! A record stores each attachment as a kind plus either a file name owned
//! by the property or an external path. Absolute paths are resolved against
//! the configured projects directory when needed, so moving the data
//! directory or duplicating a property never leaves dangling paths.
//!
//! ## Pages Always Come Out
//!
//! A directory template may be missing a page or reference a value the
//! record does not have. The page is then replaced by a minimal fallback and
//! the run continues; only infrastructure failures abort a generation.
//!
//! ## Maud for Built-in Pages
//!
//! The built-in templates are compiled-in [Maud](https://maud.lambda.xyz/)
//! markup, so they are checked at build time and auto-escaped. Directory
//! templates are Jinja-style page files rendered with minijinja.

pub mod backup;
pub mod config;
pub mod fsutil;
pub mod generate;
pub mod imaging;
pub mod media;
pub mod output;
pub mod query;
pub mod render;
pub mod service;
pub mod store;
pub mod templates;
pub mod types;

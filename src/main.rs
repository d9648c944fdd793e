use chrono::Utc;
use clap::{Parser, Subcommand};
use homeshow::generate::{GenerateOptions, SiteGenerator};
use homeshow::imaging::{Quality, RustBackend};
use homeshow::query::{PropertyFilter, Sort, SortDirection};
use homeshow::render::Features;
use homeshow::render::filters::slugify;
use homeshow::service::PropertyService;
use homeshow::store::RecordStore;
use homeshow::types::{Project, ProjectStatus, Property, PropertyId, Status};
use homeshow::{backup, config, media, output};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "homeshow")]
#[command(about = "Real-estate listings and their marketing websites")]
#[command(long_about = "\
Real-estate listings and their marketing websites

Property records live in a SQLite database; attached photos and videos are
copied into a per-property media directory. Any property can be turned into
a static website from a built-in or directory template.

Data layout (paths configurable in settings.toml):

  data/
  ├── database.db
  └── projects/
      └── property_<id>/
          └── media/               # originals, derived/<file>_<size>.jpg
  templates/
  └── <id>/                        # directory template
      ├── template.json            # name, style, description
      ├── index.html               # {{ property.title }}, {{ property.price | format_price }}
      ├── gallery.html
      ├── contact.html
      ├── details.html
      └── css/ js/ images/ fonts/  # copied into the site
  sites/
  └── <name>/                      # generated website

Record files are JSON objects with the property fields, for example:

  {\"title\": \"Villa A\", \"property_type\": \"villa\", \"price\": 500000,
   \"city\": \"Nice\", \"features\": [\"Pool\"]}

Run 'homeshow gen-config' to print a documented settings.toml.")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = config::SETTINGS_FILE, global = true)]
    config: PathBuf,

    /// Log debug details
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Substring of title or city
    #[arg(long)]
    search: Option<String>,
    /// Property type, e.g. house, villa
    #[arg(long = "type")]
    property_type: Option<String>,
    #[arg(long)]
    status: Option<Status>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    /// Sort field (title, price, surface_area, created_at, updated_at, ...)
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

/// Features of the generated site.
#[derive(clap::Args)]
struct FeatureArgs {
    #[arg(long)]
    no_contact_form: bool,
    #[arg(long)]
    no_gallery: bool,
    #[arg(long)]
    virtual_tour: bool,
    #[arg(long)]
    no_mortgage_calculator: bool,
    #[arg(long)]
    no_map: bool,
    #[arg(long)]
    no_social_sharing: bool,
}

impl FeatureArgs {
    fn features(&self) -> Features {
        Features {
            contact_form: !self.no_contact_form,
            image_gallery: !self.no_gallery,
            virtual_tour: self.virtual_tour,
            mortgage_calculator: !self.no_mortgage_calculator,
            map_integration: !self.no_map,
            social_sharing: !self.no_social_sharing,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the data directories and database
    Init,
    /// Add a property from a JSON record file
    Add {
        record: PathBuf,
        /// Media files to attach
        #[arg(long, num_args = 1..)]
        media: Vec<PathBuf>,
    },
    /// Show one property
    Show { id: PropertyId },
    /// List properties
    List(ListArgs),
    /// Replace a property's fields from a JSON record file
    Update { id: PropertyId, record: PathBuf },
    /// Attach media files to a property
    Attach {
        id: PropertyId,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Detach a media file by name
    Detach { id: PropertyId, filename: String },
    /// Copy a property, media included, as a new draft
    Duplicate {
        id: PropertyId,
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a property and its media
    Delete { id: PropertyId },
    /// Export a property and its media into a directory
    Export { id: PropertyId, dest: PathBuf },
    /// Import a property previously exported
    Import { src: PathBuf },
    /// Portfolio statistics
    Stats,
    /// Check media files before attaching them
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List available website templates
    Templates,
    /// Generate a static website for a property
    Generate {
        id: PropertyId,
        /// Template id (defaults to the property's, then settings.toml's)
        #[arg(long)]
        template: Option<String>,
        /// Output directory name under the sites directory
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        features: FeatureArgs,
    },
    /// List recorded website generations
    Projects,
    /// Back up the database now
    Backup,
    /// Print a stock settings.toml with all options documented
    GenConfig,
}

impl Command {
    /// Commands that change stored data and so may trigger an automatic backup.
    fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Update { .. }
                | Command::Attach { .. }
                | Command::Detach { .. }
                | Command::Duplicate { .. }
                | Command::Delete { .. }
                | Command::Import { .. }
        )
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "homeshow=debug" } else { "homeshow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_record(path: &Path) -> CliResult<serde_json::Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Needs neither settings nor database
    match &cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_settings_toml());
            return Ok(());
        }
        Command::Validate { files } => {
            let backend = RustBackend::new();
            let mut all_valid = true;
            for file in files {
                let report = media::validate(&backend, file);
                all_valid &= report.valid;
                for line in output::format_validation(&report) {
                    println!("{}", line);
                }
            }
            if !all_valid {
                return Err("some files failed validation".into());
            }
            return Ok(());
        }
        _ => {}
    }

    let settings = config::load_settings(&cli.config)?;
    let store = RecordStore::open(&settings.database_path()).await?;
    let service = PropertyService::new(
        store.clone(),
        RustBackend::new(),
        &settings.paths.projects_dir,
        Quality::new(settings.images.quality),
    );

    let mutates = cli.command.mutates();
    match cli.command {
        Command::GenConfig | Command::Validate { .. } => {}
        Command::Init => {
            for dir in [
                &settings.paths.projects_dir,
                &settings.paths.templates_dir,
                &settings.paths.output_dir,
            ] {
                fs::create_dir_all(dir)?;
            }
            println!("Database: {}", settings.database_path().display());
            println!("Projects: {}", settings.paths.projects_dir.display());
            println!("Templates: {}", settings.paths.templates_dir.display());
            println!("Sites: {}", settings.paths.output_dir.display());
        }
        Command::Add { record, media } => {
            let value = read_record(&record)?;
            let mut property: Property = serde_json::from_value(value.clone())?;
            if value.get("currency").is_none() {
                property.currency = settings.default_currency.clone();
            }
            let (id, dir) = service.create_with_media(&property, &media).await?;
            println!("Created property #{}", id);
            println!("    Media: {}", dir.display());
        }
        Command::Show { id } => {
            output::print_property(&service.get(id).await?);
        }
        Command::List(args) => {
            let filter = PropertyFilter {
                search: args.search,
                property_type: args.property_type,
                status: args.status,
                city: args.city,
                min_price: args.min_price,
                max_price: args.max_price,
            };
            let sort = match args.sort {
                Some(field) => {
                    let direction = if args.desc { SortDirection::Desc } else { SortDirection::Asc };
                    Sort::new(field, direction)
                }
                None => Sort::default(),
            };
            output::print_property_list(&service.filtered_list(&filter, &sort).await?);
        }
        Command::Update { id, record } => {
            let value = read_record(&record)?;
            let mut property: Property = serde_json::from_value(value.clone())?;
            // A record without a media key keeps what is attached
            if value.get("media").is_none() {
                property.media = service.get(id).await?.property.media;
            }
            service.update(id, &property).await?;
            println!("Updated property #{}", id);
        }
        Command::Attach { id, files } => {
            let attached = service.add_media(id, &files).await?;
            println!("Attached {} of {} files to #{}", attached, files.len(), id);
        }
        Command::Detach { id, filename } => {
            if service.remove_media(id, &filename).await? {
                println!("Detached {} from #{}", filename, id);
            } else {
                println!("#{} has no media named {}", id, filename);
            }
        }
        Command::Duplicate { id, title } => {
            let copy = service.duplicate(id, title.as_deref()).await?;
            println!("Duplicated #{} as #{}", id, copy);
        }
        Command::Delete { id } => {
            if service.delete_with_media(id).await? {
                println!("Deleted property #{}", id);
            } else {
                println!("No property #{}", id);
            }
        }
        Command::Export { id, dest } => {
            let dir = service.export(id, &dest).await?;
            println!("Exported #{} to {}", id, dir.display());
        }
        Command::Import { src } => {
            let id = service.import(&src).await?;
            println!("Imported property #{}", id);
        }
        Command::Stats => {
            output::print_statistics(&service.statistics().await?);
        }
        Command::Templates => {
            let generator = SiteGenerator::from_settings(RustBackend::new(), &settings);
            for line in output::format_templates(generator.registry().iter()) {
                println!("{}", line);
            }
        }
        Command::Generate {
            id,
            template,
            name,
            features,
        } => {
            let record = service.get(id).await?;
            let template_id = template
                .or_else(|| record.property.template_id.clone())
                .unwrap_or_else(|| settings.website_template.clone());
            let output_name = name.unwrap_or_else(|| {
                let slug = slugify(&record.property.title);
                if slug.is_empty() { format!("property-{}", id) } else { slug }
            });
            let generator = SiteGenerator::from_settings(RustBackend::new(), &settings);
            let options = GenerateOptions {
                features: features.features(),
                ..GenerateOptions::default()
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_generate_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = generator.generate(&record, &template_id, &output_name, &options, Some(tx));
            printer.join().map_err(|_| "progress printer panicked")?;

            // Projects reference a stored template, so unknown ids are not recorded
            if let Some(template) = generator.registry().get(&template_id) {
                if template.directory.is_some() {
                    store.upsert_template(template).await?;
                }
                let project = Project {
                    name: output_name.clone(),
                    description: None,
                    property_id: id,
                    template_id: template_id.clone(),
                    output_path: generator.output_root(&output_name),
                    config: match serde_json::to_value(options.features)? {
                        serde_json::Value::Object(map) => map,
                        _ => serde_json::Map::new(),
                    },
                    status: if result.is_ok() {
                        ProjectStatus::Generated
                    } else {
                        ProjectStatus::Failed
                    },
                };
                store.create_project(&project).await?;
            }
            output::print_generated_site(&result?);
        }
        Command::Projects => {
            for line in output::format_projects(&store.list_projects().await?) {
                println!("{}", line);
            }
        }
        Command::Backup => {
            let path = backup::create_backup(&store, &settings.backup, Utc::now()).await?;
            println!("Backup written to {}", path.display());
        }
    }

    if mutates
        && settings.backup.auto_backup
        && backup::is_due(&settings.backup.directory, settings.backup.interval_hours, Utc::now())
    {
        backup::create_backup(&store, &settings.backup, Utc::now()).await?;
    }
    store.close().await;
    Ok(())
}

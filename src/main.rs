mod auth;
mod catalog;
mod editor;
mod error;
mod media;
mod model;
mod resolver;
mod routes;
mod settings;
mod slug;
mod store;
mod taxonomy;
mod view;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use auth::AdminGate;
use catalog::Catalog;
use editor::{Editor, FormField, FormState};
use error::CatalogError;
use media::{CloudinaryUploader, ImageFile};
use model::PlantRecord;
use routes::Route;
use settings::{Settings, StoreBackend};
use slug::qr_payload;
use store::{PostgrestStore, RecordStore, SqliteStore};

#[derive(Parser)]
#[command(name = "plant_catalog", about = "Botanical specimen catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local database schema
    Init,
    /// List all plants, ordered by name
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the plant behind a slug
    Show {
        slug: String,
        #[arg(long)]
        json: bool,
    },
    /// Open a site path or URL (e.g. "/", "/plant/tulsi", a scanned QR link)
    Open { target: String },
    /// Print the QR payload for a plant
    Qr { slug: String },
    /// Add a plant (admin)
    Add {
        #[command(flatten)]
        admin: AdminArgs,
        #[command(flatten)]
        plant: PlantArgs,
    },
    /// Edit a plant by id (admin); only the given fields change
    Edit {
        id: i64,
        #[command(flatten)]
        admin: AdminArgs,
        #[command(flatten)]
        plant: PlantArgs,
    },
    /// Delete a plant by id (admin)
    Delete {
        id: i64,
        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[derive(Args)]
struct AdminArgs {
    /// Admin password
    #[arg(long, env = "PLANTS_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct PlantArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    scientific_name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    kingdom: Option<String>,
    /// Comma-separated clades, broadest first
    #[arg(long)]
    clade: Option<String>,
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    family: Option<String>,
    #[arg(long)]
    genus: Option<String>,
    #[arg(long)]
    species: Option<String>,
    /// URL of an already hosted image
    #[arg(long, conflicts_with = "upload")]
    image: Option<String>,
    /// Local image to upload (png, jpeg, jpg or webp, at most 10 MB)
    #[arg(long)]
    upload: Option<PathBuf>,
}

impl PlantArgs {
    fn apply(&self, form: &mut FormState) {
        let edits = [
            (FormField::Name, &self.name),
            (FormField::ScientificName, &self.scientific_name),
            (FormField::Description, &self.description),
            (FormField::Kingdom, &self.kingdom),
            (FormField::Clade, &self.clade),
            (FormField::Order, &self.order),
            (FormField::Family, &self.family),
            (FormField::Genus, &self.genus),
            (FormField::Species, &self.species),
            (FormField::Image, &self.image),
        ];
        for (field, value) in edits {
            if let Some(v) = value {
                form.set(field, v);
            }
        }
    }

    async fn upload_image(&self, settings: &Settings, form: &mut FormState) -> anyhow::Result<()> {
        let Some(path) = &self.upload else {
            return Ok(());
        };
        let Some((cloud_name, preset)) = settings.cloudinary() else {
            bail!("Image uploads need cloudinary_cloud_name and cloudinary_upload_preset");
        };
        let uploader = CloudinaryUploader::new(
            &settings.cloudinary_api_base,
            cloud_name,
            preset,
            &settings.cloudinary_folder,
        );
        let image = ImageFile::read(path)?;
        let url = uploader.upload(&image).await?;
        form.set(FormField::Image, &url);
        Ok(())
    }
}

fn open_store(settings: &Settings) -> anyhow::Result<Box<dyn RecordStore>> {
    match settings.store {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&settings.db_path)
                .with_context(|| format!("Failed to open {:?}", settings.db_path))?;
            Ok(Box::new(store))
        }
        StoreBackend::Postgrest => {
            let (Some(url), Some(key)) = (&settings.postgrest_url, &settings.postgrest_key) else {
                bail!("store = postgrest needs postgrest_url and postgrest_key");
            };
            Ok(Box::new(PostgrestStore::new(url, key)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "Starting plant catalog");

    let mut catalog = Catalog::new(open_store(&settings)?);
    let gate = AdminGate::new(settings.admin_password.clone());

    match cli.command {
        Commands::Init => {
            match settings.store {
                StoreBackend::Sqlite => println!("Database ready at {:?}", settings.db_path),
                StoreBackend::Postgrest => println!("Remote store; nothing to initialise."),
            }
            Ok(())
        }
        Commands::List { json } => {
            catalog.refresh().await?;
            let plants = catalog.plants();
            if json {
                println!("{}", serde_json::to_string_pretty(plants)?);
            } else {
                print!("{}", view::render_listing(plants));
            }
            Ok(())
        }
        Commands::Show { slug, json } => show(&mut catalog, &slug, json).await,
        Commands::Open { target } => match Route::from_target(&settings.base_origin, &target) {
            Route::Listing => {
                catalog.refresh().await?;
                print!("{}", view::render_listing(catalog.plants()));
                Ok(())
            }
            Route::Plant(slug) => show(&mut catalog, &slug, false).await,
            Route::Unknown(path) => {
                info!(path = %path, "No such page");
                print!("{}", view::render_not_found());
                Ok(())
            }
        },
        Commands::Qr { slug } => {
            match catalog.find(&slug).await {
                Ok(plant) => println!("{}", qr_payload(&settings.base_origin, &plant.name)),
                Err(_) => print!("{}", view::render_not_found()),
            }
            Ok(())
        }
        Commands::Add { admin, plant } => {
            let cap = gate.sign_in(&admin.password)?;
            let mut editor = Editor::default();
            editor.start_add();
            plant.apply(&mut editor.form);
            plant.upload_image(&settings, &mut editor.form).await?;
            let saved = editor.submit(&mut catalog, &cap).await?;
            report_saved(&settings, &saved);
            Ok(())
        }
        Commands::Edit { id, admin, plant } => {
            let cap = gate.sign_in(&admin.password)?;
            catalog.refresh().await?;
            let Some(record) = catalog.plant(id).cloned() else {
                bail!("No plant with id {}", id);
            };
            let mut editor = Editor::default();
            editor.start_edit(&record);
            plant.apply(&mut editor.form);
            plant.upload_image(&settings, &mut editor.form).await?;
            let saved = editor.submit(&mut catalog, &cap).await?;
            report_saved(&settings, &saved);
            Ok(())
        }
        Commands::Delete { id, admin } => {
            let cap = gate.sign_in(&admin.password)?;
            catalog.delete(&cap, id).await?;
            println!("Deleted plant #{}", id);
            Ok(())
        }
    }
}

async fn show(catalog: &mut Catalog, slug: &str, json: bool) -> anyhow::Result<()> {
    match catalog.find(slug).await {
        Ok(plant) if json => println!("{}", serde_json::to_string_pretty(&plant)?),
        Ok(plant) => print!("{}", view::render_detail(&plant)),
        Err(CatalogError::NotFound(_)) => print!("{}", view::render_not_found()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn report_saved(settings: &Settings, plant: &PlantRecord) {
    println!("Saved plant #{}: {}", plant.id, plant.name);
    println!("Page: {}", qr_payload(&settings.base_origin, &plant.name));
}

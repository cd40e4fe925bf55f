//! Toucan CLI: command-line front end for the photo gallery.
//!
//! Reads configuration from the environment (see `.env`). Data commands need
//! a session token from `toucan login`, passed via `--session` or
//! TOUCAN_SESSION.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use toucan_cli::{
    describe_error, init_tracing, log_error, parse_photo_ids, print_json, read_intake_files,
};
use toucan_core::{AppError, Config, OpaqueId};
use toucan_db::{AlbumRepository, PhotoRepository, UserRepository};
use toucan_services::{
    create_bucket_storages, AuthService, Credentials, DeletionService, GalleryService,
    ReconcileService, UploadWorkflow,
};

#[derive(Parser)]
#[command(name = "toucan", about = "Toucan photo gallery CLI")]
struct Cli {
    /// Session token printed by `toucan login`
    #[arg(long, env = "TOUCAN_SESSION", global = true, hide_env_values = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        email: String,
        #[arg(long, env = "TOUCAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and print a session token
    Login {
        email: String,
        #[arg(long, env = "TOUCAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Album operations
    Albums {
        #[command(subcommand)]
        sub: AlbumCommands,
    },
    /// Show one album with its photos
    Album {
        /// Album ID
        id: String,
    },
    /// List every photo across your albums
    Photos,
    /// Compress and upload photos into an album
    Upload {
        /// Target album ID
        #[arg(long)]
        album: String,
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete photos by ID; IDs you do not own are skipped
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove photo rows whose upload never completed
    Sweep,
}

#[derive(Subcommand)]
enum AlbumCommands {
    /// List your albums
    List,
    /// Create a new album
    Create {
        name: String,
        /// Make the album publicly viewable
        #[arg(long)]
        public: bool,
    },
}

async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let pool = toucan_db::connect(config).await?;
    toucan_db::run_migrations(&pool).await?;

    let users = Arc::new(UserRepository::new(pool.clone()));
    let albums = Arc::new(AlbumRepository::new(pool.clone()));
    let photos = Arc::new(PhotoRepository::new(pool));
    let auth = AuthService::from_config(users, config);

    let command = match cli.command {
        Commands::Register { email, password } => {
            let user = auth.register(Credentials::new(email, password)).await?;
            return print_json(&user);
        }
        Commands::Login { email, password } => {
            let session = auth.login(Credentials::new(email, password)).await?;
            return print_json(&session);
        }
        other => other,
    };

    let user_id = auth.require_user(cli.session.as_deref())?;
    let storages = create_bucket_storages(config)
        .await
        .map_err(AppError::from)?;
    let gallery = GalleryService::new(albums.clone(), photos.clone(), storages.photos.clone());

    match command {
        Commands::Albums { sub } => match sub {
            AlbumCommands::List => print_json(&gallery.list_albums(user_id).await?)?,
            AlbumCommands::Create { name, public } => {
                print_json(&gallery.create_album(user_id, &name, public).await?)?
            }
        },
        Commands::Album { id } => {
            print_json(&gallery.album_view(user_id, &id).await?)?;
        }
        Commands::Photos => {
            print_json(&gallery.all_photos(user_id).await?)?;
        }
        Commands::Upload { album, files } => {
            let album_id = OpaqueId::parse(&album)?;
            let files = read_intake_files(&files).await?;
            let workflow = UploadWorkflow::from_config(config, albums, photos, storages);
            let report = workflow.upload(user_id, &album_id, files).await?;
            if report.failed_count() > 0 {
                tracing::warn!(
                    failed = report.failed_count(),
                    "Some files were not uploaded"
                );
            }
            print_json(&report)?;
        }
        Commands::Delete { ids } => {
            let ids = parse_photo_ids(&ids)?;
            let report = DeletionService::new(photos, storages)
                .delete_photos(user_id, &ids)
                .await?;
            print_json(&report)?;
        }
        Commands::Sweep => {
            let report = ReconcileService::from_config(config, photos, storages)
                .sweep(user_id)
                .await?;
            print_json(&report)?;
        }
        Commands::Register { .. } | Commands::Login { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Err(e) = run(cli, &config).await {
        if let Some(app_error) = e.downcast_ref::<AppError>() {
            log_error(app_error, config.is_production());
            eprintln!("error: {}", describe_error(app_error));
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}

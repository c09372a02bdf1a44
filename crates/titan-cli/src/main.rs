//! titan-media: admin client for the site's media bucket.
//!
//! Reads SUPABASE_URL / SUPABASE_ANON_KEY (or STORAGE_BACKEND=local|memory).
//! Without credentials listings come back empty and mutations fail.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use titan_cli::{format_media_table, init_tracing, print_json};
use titan_core::constants::{DEFAULT_FALLBACK_COUNT, DEFAULT_GALLERY_FOLDER, VIDEO_FOLDER_CANDIDATES};
use titan_core::StorageConfig;
use titan_media::{LatestVideoResolver, MediaAdmin, MediaGallery, UploadConfig, UploadController};
use titan_storage::create_gateway;

#[derive(Parser)]
#[command(name = "titan-media", about = "Media bucket admin CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// List files directly under a folder
    List {
        /// Folder name (empty for the bucket root)
        #[arg(default_value = "")]
        folder: String,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Upload a local file
    Upload {
        /// Path to the file to upload
        file: std::path::PathBuf,
        /// Destination folder
        #[arg(long, default_value = "general")]
        folder: String,
        /// Accepted types, e.g. "image/*,video/*"
        #[arg(long)]
        accept: Option<String>,
    },
    /// Delete an object by its full path
    Delete {
        /// Full object path, e.g. logos/acme.png
        path: String,
    },
    /// Print the public URL of an object
    Url {
        /// Full object path
        path: String,
    },
    /// Resolve the most recently created video
    LatestVideo {
        /// Folders to search, in priority order
        #[arg(long = "folder")]
        folders: Vec<String>,
    },
    /// Render the gallery entries for a folder
    Gallery {
        #[arg(long, default_value = DEFAULT_GALLERY_FOLDER)]
        folder: String,
        /// Placeholder count when the folder is empty
        #[arg(long, default_value_t = DEFAULT_FALLBACK_COUNT)]
        fallback_count: usize,
    },
    /// Show the admin folders and their contents
    Folders,
    /// Probe the bucket root and the given folders
    Diagnose {
        folders: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = StorageConfig::from_env().context("Failed to load storage configuration")?;
    let gateway = create_gateway(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::List { folder, format } => {
            let items = gateway
                .list(&folder)
                .await
                .with_context(|| format!("Failed to list folder '{}'", folder))?;
            match format {
                OutputFormat::Json => print_json(&items)?,
                OutputFormat::Table => print!("{}", format_media_table(&folder, &items)),
            }
        }
        Commands::Upload {
            file,
            folder,
            accept,
        } => {
            let mut upload_config = UploadConfig {
                folder,
                ..UploadConfig::default()
            };
            if let Some(accept) = accept {
                upload_config.accept = accept;
            }
            let mut controller = UploadController::new(gateway, upload_config);
            controller
                .select_path(&file)
                .await
                .with_context(|| format!("Failed to select {}", file.display()))?;
            let uploaded = controller.submit().await.context("Upload failed")?;
            print_json(&uploaded)?;
        }
        Commands::Delete { path } => {
            gateway
                .remove(&path)
                .await
                .with_context(|| format!("Failed to delete '{}'", path))?;
            print_json(&serde_json::json!({ "success": true, "message": format!("{} deleted", path) }))?;
        }
        Commands::Url { path } => {
            let url = gateway
                .public_url_for(&path)
                .context("Storage is not configured")?;
            print_json(&serde_json::json!({ "path": path, "public_url": url }))?;
        }
        Commands::LatestVideo { folders } => {
            let resolver = if folders.is_empty() {
                LatestVideoResolver::new(gateway)
            } else {
                LatestVideoResolver::with_folders(gateway, folders)
            };
            match resolver.resolve().await {
                Some(video) => print_json(&video)?,
                None => {
                    tracing::warn!(
                        folders = ?resolver.folders(),
                        "No video found in candidate folders"
                    );
                    print_json(&serde_json::Value::Null)?;
                }
            }
        }
        Commands::Gallery {
            folder,
            fallback_count,
        } => {
            let gallery = MediaGallery::new(gateway);
            gallery.load(&folder).await;
            if let Some(error) = gallery.state().error() {
                tracing::warn!(folder = %folder, error = %error, "Gallery load failed");
            }
            print_json(&gallery.display_entries(fallback_count))?;
        }
        Commands::Folders => {
            let mut admin = MediaAdmin::new(gateway);
            let mut report = Vec::new();
            for (id, name) in MediaAdmin::folders() {
                admin.select_folder(id).await;
                report.push(serde_json::json!({
                    "id": id,
                    "name": name,
                    "items": admin.items(),
                }));
            }
            print_json(&report)?;
        }
        Commands::Diagnose { folders } => {
            let folders: Vec<&str> = if folders.is_empty() {
                VIDEO_FOLDER_CANDIDATES.to_vec()
            } else {
                folders.iter().map(String::as_str).collect()
            };
            let probes = gateway.diagnose(&folders).await?;
            print_json(&probes)?;
        }
    }

    Ok(())
}

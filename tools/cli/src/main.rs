//! cloudfile CLI - Command line interface for cloud-file providers.
//!
//! This tool links an existing provider account, reports its quota and
//! uploads files, printing the shareable URL of each.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cloudfile_common::AccountKey;
use cloudfile_provider::{
    create_default_registry, ProviderContext, Request, RequestDispatcher, RequestObserver,
    StatusCode, UploadStatus,
};

#[derive(Parser)]
#[command(name = "cloudfile")]
#[command(about = "cloudfile - Upload and share files through a cloud-file provider")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Account key identifying the linked account.
    #[arg(short, long)]
    account: String,

    /// Provider type.
    #[arg(short, long, default_value = "dropbox")]
    provider: String,

    /// JSON file with provider configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API host base URL.
    #[arg(long)]
    server_url: Option<String>,

    /// Override the content (upload) host base URL.
    #[arg(long)]
    content_url: Option<String>,

    /// Override the authorization host base URL.
    #[arg(long)]
    auth_url: Option<String>,

    /// Override the logout page URL.
    #[arg(long)]
    logout_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link an existing account (OAuth handshake followed by logout).
    Setup,

    /// Show used and remaining space.
    Quota,

    /// Upload files and print their shareable URLs.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    let account = AccountKey::new(cli.account.as_str()).context("Invalid account key")?;

    let registry = create_default_registry();
    let provider = registry
        .resolve(&cli.provider, account, config)
        .with_context(|| format!("Failed to create {} provider", cli.provider))?;
    let dispatcher = RequestDispatcher::new(provider);

    match cli.command {
        Commands::Setup => cmd_setup(&dispatcher).await,
        Commands::Quota => cmd_quota(&dispatcher).await,
        Commands::Upload { files } => cmd_upload(&dispatcher, &files).await,
    }
}

/// Build the provider configuration from the config file and URL flags.
fn load_config(cli: &Cli) -> Result<Value> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&raw).context("Config file is not valid JSON")?
        }
        None => Value::Object(Map::new()),
    };

    let object = config
        .as_object_mut()
        .context("Config file must contain a JSON object")?;

    let overrides = [
        ("server_url", &cli.server_url),
        ("content_url", &cli.content_url),
        ("auth_url", &cli.auth_url),
        ("logout_url", &cli.logout_url),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            object.insert(key.to_string(), Value::String(value.clone()));
        }
    }

    Ok(config)
}

/// Logs request lifecycle to the console.
struct ConsoleObserver;

impl RequestObserver for ConsoleObserver {
    fn on_start_request(&self, request: &Request, context: &ProviderContext) {
        debug!(
            "{:?} request {} started on {} account {}",
            request.kind(),
            request.id(),
            context.provider_type(),
            context.account_key()
        );
    }

    fn on_stop_request(&self, request: &Request, _context: &ProviderContext, status: StatusCode) {
        let target = request
            .file()
            .map(|f| f.display().to_string())
            .unwrap_or_default();
        if status.is_success() {
            debug!("{:?} request {} {} finished", request.kind(), request.id(), target);
        } else {
            warn!("{:?} request {} failed: {}", request.kind(), target, status);
        }
    }
}

/// Link an existing account.
async fn cmd_setup(dispatcher: &RequestDispatcher) -> Result<()> {
    let context = dispatcher.provider().context().clone();
    info!("Linking {} account {}", context.provider_type(), context.account_key());

    let status = dispatcher
        .create_existing_account(Arc::new(ConsoleObserver))
        .await
        .context("Setup task failed")?;

    if !status.is_success() {
        anyhow::bail!("Account setup failed: {}", status);
    }

    println!("Account linked successfully!");
    println!("  Provider: {}", context.provider_type());
    println!("  Account: {}", context.account_key());

    Ok(())
}

/// Show account quota.
async fn cmd_quota(dispatcher: &RequestDispatcher) -> Result<()> {
    let quota = dispatcher
        .provider()
        .refresh_user_info(true)
        .await
        .context("Failed to refresh account info")?;

    println!("Quota:");
    println!("  Total: {}", format_size(quota.quota));
    println!(
        "  Used: {} ({} shared, {} normal)",
        format_size(quota.used()),
        format_size(quota.shared),
        format_size(quota.normal)
    );
    println!("  Remaining: {}", format_size(quota.remaining()));

    Ok(())
}

/// Upload files concurrently. Ctrl-C cancels the uploads still running.
async fn cmd_upload(dispatcher: &RequestDispatcher, files: &[PathBuf]) -> Result<()> {
    let observer: Arc<dyn RequestObserver> = Arc::new(ConsoleObserver);
    let handles: Vec<_> = files
        .iter()
        .map(|file| dispatcher.upload_file(file, Arc::clone(&observer)))
        .collect();

    info!("Uploading {} file(s)", handles.len());

    let all_done = futures::future::join_all(handles.iter().map(|h| h.wait()));
    tokio::pin!(all_done);

    let statuses = tokio::select! {
        statuses = &mut all_done => statuses,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, canceling uploads");
            for handle in &handles {
                handle.cancel();
            }
            all_done.await
        }
    };

    let mut failed = 0;
    for (file, status) in files.iter().zip(&statuses) {
        match status {
            UploadStatus::Success { url } => println!("{}  {}", display_name(file), url),
            UploadStatus::Canceled => {
                println!("{}  canceled", display_name(file));
                failed += 1;
            }
            UploadStatus::Failed { code, message } => {
                println!("{}  failed ({}): {}", display_name(file), code, message);
                failed += 1;
            }
            UploadStatus::Pending | UploadStatus::Uploading => {}
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} upload(s) did not complete", failed, files.len());
    }

    Ok(())
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string())
}

/// Format a byte count for display.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use auto_alt::config::file::config_file_path;
use auto_alt::{
    Account, BatchOutcome, BulkAltTextProcessor, Bundle, GenerateAltTextAction, ImageField,
    ItemStatus, MediaId, MediaRepo, NewMedia, OpenAiAltTextGenerator, Settings, TracingNotifier,
    UploadHook, db,
};

/// auto-alt - Automatic alt text for image media
#[derive(Parser)]
#[command(name = "auto-alt", version, about)]
struct Cli {
    /// Settings file (defaults to ~/.config/auto-alt/config.toml)
    #[arg(short, long, env = "AUTO_ALT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage stored media items
    Media {
        #[command(subcommand)]
        command: MediaCommand,
    },
    /// Generate alt text for selected media items
    Generate {
        /// Media ids, in processing order
        ids: Vec<MediaId>,
        /// Select every image item
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        /// With --all, only select images that have no alt text yet
        #[arg(long, requires = "all")]
        missing: bool,
        /// Acting account id
        #[arg(long, default_value = "admin")]
        account: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum MediaCommand {
    /// Store a media item (runs the upload hook)
    Add {
        /// Local file path or http(s) URL
        source: String,
        /// Label (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Bundle machine name
        #[arg(short, long, default_value = "image")]
        bundle: String,
        /// Owning account id
        #[arg(long, default_value = "admin")]
        owner: String,
        /// Alt text supplied by the uploader
        #[arg(long)]
        alt: Option<String>,
    },
    /// List media items
    List {
        /// Only list this bundle
        #[arg(short, long)]
        bundle: Option<String>,
    },
    /// Show one media item as JSON
    Show { id: MediaId },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print effective settings
    Show,
    /// Set a setting and save the settings file
    Set { key: String, value: String },
    /// Print the settings file path
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,auto_alt=info",
        1 => "info,auto_alt=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_path = cli
        .config
        .or_else(config_file_path)
        .ok_or_else(|| anyhow::anyhow!("cannot determine settings file location"))?;

    let settings = Settings::load_from(&settings_path)?;

    match cli.command {
        Command::Config { command } => run_config(command, settings, &settings_path),
        Command::Media { command } => run_media(command, &settings).await,
        Command::Generate {
            ids,
            all,
            missing,
            account,
            json,
        } => run_generate(&settings, ids, all, missing, &account, json).await,
    }
}

fn run_config(command: ConfigCommand, mut settings: Settings, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("api_key              = {}", settings.masked_api_key());
            println!("api_endpoint         = {}", settings.api_endpoint);
            println!("model                = {}", settings.model);
            println!("generate_on_upload   = {}", settings.generate_on_upload);
            println!("request_timeout_secs = {}", settings.request_timeout_secs);
            println!("max_retries          = {}", settings.max_retries);
            println!("max_tokens           = {}", settings.max_tokens);
            println!("database_path        = {}", settings.database_path.display());
            println!("prompt               = {}", settings.prompt);
        }
        ConfigCommand::Set { key, value } => {
            settings.set(&key, &value)?;
            settings.save(path)?;
            println!("Saved {key} to {}", path.display());
        }
        ConfigCommand::Path => println!("{}", path.display()),
    }
    Ok(())
}

async fn run_media(command: MediaCommand, settings: &Settings) -> anyhow::Result<()> {
    let repo = MediaRepo::new(db::init(&settings.database_path)?);

    match command {
        MediaCommand::Add {
            source,
            name,
            bundle,
            owner,
            alt,
        } => {
            let bundle = Bundle::parse(&bundle);
            let name = name.unwrap_or_else(|| file_label(&source));
            let image = (bundle == Bundle::Image).then(|| ImageField {
                target_id: uuid::Uuid::new_v4().to_string(),
                uri: source.clone(),
                alt,
            });

            let item = repo.create(NewMedia {
                bundle,
                name,
                owner_id: owner,
                image,
            })?;
            println!("Stored media {} ({})", item.id, item.bundle);

            if settings.generate_on_upload {
                let processor = Arc::new(build_processor(settings, &repo)?);
                let hook = UploadHook::new(true, processor);
                if let Some(outcome) = hook.on_insert(item).await {
                    print_outcome(&outcome);
                }
            }
        }
        MediaCommand::List { bundle } => {
            let bundle = bundle.as_deref().map(Bundle::parse);
            for item in repo.list(bundle.as_ref())? {
                println!(
                    "{:>6}  {:<10}  {:<30}  {}",
                    item.id,
                    item.bundle.as_str(),
                    item.name,
                    item.alt_text().unwrap_or("-")
                );
            }
        }
        MediaCommand::Show { id } => {
            let item = repo
                .get(id)?
                .ok_or_else(|| anyhow::anyhow!("media {id} not found"))?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
    }
    Ok(())
}

async fn run_generate(
    settings: &Settings,
    ids: Vec<MediaId>,
    all: bool,
    missing: bool,
    account: &str,
    json: bool,
) -> anyhow::Result<()> {
    let repo = MediaRepo::new(db::init(&settings.database_path)?);

    let ids = if all {
        repo.list(Some(&Bundle::Image))?
            .into_iter()
            .filter(|item| !missing || item.alt_text().is_none_or(|a| a.trim().is_empty()))
            .map(|item| item.id)
            .collect()
    } else {
        ids
    };

    let processor = Arc::new(build_processor(settings, &repo)?);
    let action = GenerateAltTextAction::new(repo, processor, Arc::new(TracingNotifier));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current item");
            on_signal.cancel();
        }
    });

    let outcome = action
        .execute_multiple(&Account::admin(account), &ids, &cancel)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn build_processor(settings: &Settings, repo: &MediaRepo) -> anyhow::Result<BulkAltTextProcessor> {
    let generator = OpenAiAltTextGenerator::from_settings(settings)?;
    Ok(BulkAltTextProcessor::new(
        Arc::new(repo.clone()),
        Arc::new(generator),
        Arc::new(TracingNotifier),
    ))
}

fn print_outcome(outcome: &BatchOutcome) {
    for item in &outcome.items {
        let id = item
            .item_id
            .map_or_else(|| "?".to_string(), |id| id.to_string());
        let status = match item.status {
            ItemStatus::Succeeded => "ok",
            ItemStatus::Skipped => "skip",
            ItemStatus::Failed => "FAIL",
        };
        println!("{id:>6}  {status:<4}  {}", item.detail);
    }
    println!("{}", outcome.summary());
}

/// File name portion of a path or URL
fn file_label(source: &str) -> String {
    source
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(source)
        .to_string()
}

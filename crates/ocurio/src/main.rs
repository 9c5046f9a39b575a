//! # Ocurio: The Window
//! The `ocurio` CLI searches the asset catalog, shows what is known about an
//! asset, downloads its archive with a progress bar and imports it into the
//! local library.

use anyhow::{bail, Result};
use async_std::future::timeout;
use clap::{Parser, Subcommand};
use colored::*;
use curio::{AssetAction, Curio};
use curio_core::{AcquisitionState, AssetType, ContentState, CurioConfig, CurioEvent, SearchQuery};
use futures::channel::mpsc::UnboundedReceiver;
use futures::StreamExt;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and stream matches as their thumbnails arrive
    Search {
        /// Asset type (model_mmd, model_xps, motion, pose, lighting, material, world)
        #[arg(long = "type", default_value = "model_mmd")]
        asset_type: AssetType,
        /// Case-insensitive text to look for in names, aliases and tags
        #[arg(long, default_value = "")]
        text: String,
        /// Required tag; repeat to require several
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Only list assets that are cached or extracted
        #[arg(long)]
        cached: bool,
        /// Seconds to wait for thumbnails
        #[arg(long, default_value = "10")]
        wait: u64,
    },
    /// Show the details and acquisition state of an asset
    Show {
        /// Asset id
        id: String,
    },
    /// Download the archive of an asset into the cache
    Download {
        /// Asset id
        id: String,
    },
    /// Import a cached archive into the library
    Import {
        /// Asset id
        id: String,
    },
}

#[async_std::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = CurioConfig::load()?;
    let (curio, mut events) = Curio::open(&config)?;

    let outcome = match cli.command {
        Commands::Search {
            asset_type,
            text,
            tags,
            cached,
            wait,
        } => {
            let query = tags
                .into_iter()
                .fold(SearchQuery::new(asset_type).text(text), |q, tag| q.tag(tag))
                .cached_only(cached);
            search(&curio, &mut events, &query, Duration::from_secs(wait)).await
        }
        Commands::Show { id } => show(&curio, &id),
        Commands::Download { id } => download(&curio, &mut events, &id).await,
        Commands::Import { id } => {
            let path = curio.import(&id).await?;
            println!("✅ Imported {} to {}", id.cyan(), path.display().to_string().green());
            Ok(())
        }
    };

    curio.shutdown();
    outcome
}

async fn search(
    curio: &Curio,
    events: &mut UnboundedReceiver<CurioEvent>,
    query: &SearchQuery,
    wait: Duration,
) -> Result<()> {
    let generation = curio.search(query);
    let result = curio.current_result();
    println!(
        "🔎 {} of {} results for {}",
        result.display_count.to_string().bold(),
        result.hit_count,
        query.asset_type.to_string().cyan()
    );

    // Cache hits land during `search`; their rows come from the result itself
    let mut shown = HashSet::new();
    for asset_id in result.asset_ids {
        if shown.insert(asset_id.clone()) {
            print_row(curio, &asset_id);
        }
    }

    let deadline = Instant::now() + wait;
    while curio.current_result().is_loading() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, events.next()).await {
            Ok(Some(CurioEvent::ResultAppended {
                generation: g,
                asset_id,
            })) if g == generation => {
                if shown.insert(asset_id.clone()) {
                    print_row(curio, &asset_id);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }

    let result = curio.current_result();
    for asset_id in &result.asset_ids {
        if shown.insert(asset_id.clone()) {
            print_row(curio, asset_id);
        }
    }
    if result.is_loading() {
        println!(
            "{}",
            format!(
                "⏳ {} thumbnails still loading",
                result.display_count - result.asset_ids.len()
            )
            .dimmed()
        );
    }
    Ok(())
}

fn print_row(curio: &Curio, asset_id: &str) {
    match curio.detail(asset_id) {
        Ok(detail) => println!(
            "{} {} {} {}",
            state_marker(detail.status.state),
            detail.asset.name.bold(),
            detail.asset.id.dimmed(),
            detail.asset.tags_text().blue()
        ),
        Err(e) => log::warn!("{}: {}", asset_id, e),
    }
}

fn state_marker(state: AcquisitionState) -> ColoredString {
    match state {
        AcquisitionState::Initialized => " ".normal(),
        AcquisitionState::Downloading => "…".yellow(),
        AcquisitionState::Cached => "○".cyan(),
        AcquisitionState::Extracted => "●".green(),
        AcquisitionState::Failed => "✗".red(),
        AcquisitionState::Unknown => "?".magenta(),
    }
}

fn show(curio: &Curio, id: &str) -> Result<()> {
    let detail = curio.detail(id)?;
    let asset = &detail.asset;

    println!("{} {}", asset.name.bold(), asset.id.dimmed());
    for (lang, alias) in &asset.aliases {
        println!("  {} {}", format!("[{}]", lang).dimmed(), alias);
    }
    println!("  type     {}", asset.asset_type.to_string().cyan());
    println!("  tags     {}", asset.tags_text().blue());
    println!(
        "  updated  {}",
        asset.updated_at.format("%Y-%m-%d %H:%M:%S %Z")
    );
    if !asset.note.is_empty() {
        println!("  note     {}", asset.note);
    }

    println!(
        "  state    {} {:?}",
        state_marker(detail.status.state),
        detail.status.state
    );
    if let Some(task) = &detail.status.task {
        let total = task
            .content_length
            .map(|len| HumanBytes(len).to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  progress {} / {}", HumanBytes(task.fetched_size), total);
    }
    if let Some(content) = &detail.status.content {
        if let Some(error) = &content.error {
            println!("  error    {}", error.red());
        } else if content.state == ContentState::Cached {
            println!(
                "  archive  {} ({})",
                HumanBytes(content.length),
                content.content_type.as_deref().unwrap_or("unknown type")
            );
        }
    }
    if let Some(location) = &detail.location {
        println!("  path     {}", location.display().to_string().green());
    }

    let label = if detail.action.is_enabled() {
        detail.action.label().bold()
    } else {
        format!("{} (unavailable)", detail.action.label()).dimmed()
    };
    println!("  action   {}", label);
    Ok(())
}

async fn download(
    curio: &Curio,
    events: &mut UnboundedReceiver<CurioEvent>,
    id: &str,
) -> Result<()> {
    let detail = curio.detail(id)?;
    if detail.action == AssetAction::Import {
        println!("✅ {} is already downloaded", detail.asset.name.cyan());
        return Ok(());
    }

    println!("📥 Downloading {}", detail.asset.name.cyan());
    curio.download(id)?;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )?
        .progress_chars("=> "),
    );

    let url = detail.asset.download_url.clone();
    let finished = loop {
        match timeout(POLL_INTERVAL, events.next()).await {
            Ok(Some(CurioEvent::DownloadFinished { asset_id, state })) if asset_id == id => {
                break Some(state)
            }
            Ok(Some(_)) => {}
            Ok(None) => break None,
            Err(_) => {
                if let Some(task) = curio.fetcher().try_get_task(&url) {
                    if let Some(total) = task.content_length {
                        bar.set_length(total);
                    }
                    bar.set_position(task.fetched_size);
                }
            }
        }
    };
    bar.finish_and_clear();

    match finished {
        Some(ContentState::Cached) => {
            let detail = curio.detail(id)?;
            let size = detail
                .status
                .content
                .as_ref()
                .map(|content| content.length)
                .unwrap_or_default();
            let path = detail
                .location
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("✅ Download complete: {} ({})", path.green(), HumanBytes(size));
            Ok(())
        }
        Some(_) => {
            let error = curio
                .fetcher()
                .try_get_content(&url)
                .and_then(|content| content.error)
                .unwrap_or_else(|| "unknown error".to_string());
            eprintln!("❌ Error: {}", error.red());
            bail!("download of {} failed", id)
        }
        None => bail!("event stream closed before {} finished", id),
    }
}

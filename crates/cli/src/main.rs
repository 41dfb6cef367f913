use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cinefest_client::api::BackendClient;
use cinefest_client::config::ClientConfig;
use cinefest_client::enrich::Pipeline;
use cinefest_client::membership::{MembershipSets, MembershipStore, Navigator, ToggleOutcome};
use cinefest_client::overlay::{DetailOverlay, ScrollLock};
use cinefest_client::pages::{CatalogPage, FestivalMapPage, FestivalStatus, FilmCard};
use cinefest_client::selection::{SelectionSync, Viewport, ViewportCommand};
use cinefest_client::session::{EnvSession, Session, SessionProvider};
use cinefest_client::sources::{CatalogQuery, FixedLocation, MetadataSource};
use cinefest_client::tmdb::TmdbClient;
use cinefest_shared::models::{Coordinate, EnrichedItem, ItemId, MembershipKind};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cinefest", about = "Browse the film catalog and nearby festivals")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "CINEFEST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the whole film catalog
    Films,
    /// Search films by free text
    Search { text: String },
    /// List festivals nearest to a position
    Festivals {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Index of the festival to select after loading
        #[arg(long)]
        select: Option<usize>,
    },
    /// Show the signed-in user's lists
    Lists,
    /// Add or remove a film from one of the user's lists
    Toggle { kind: MembershipKind, id: String },
}

// --- Terminal stand-ins for the UI collaborators ---

struct LoginHint;

impl Navigator for LoginHint {
    fn redirect_to_login(&self) {
        eprintln!("Sign in required: set CINEFEST_USER_ID and CINEFEST_TOKEN");
    }
}

struct LogViewport;

impl Viewport for LogViewport {
    fn center_on(&self, command: ViewportCommand) {
        info!(
            lat = command.center.lat,
            lon = command.center.lon,
            zoom = command.zoom,
            "Map centered"
        );
    }
}

struct NoScroll;

impl ScrollLock for NoScroll {
    fn set_suppressed(&self, _suppressed: bool) {}
}

// --- Output ---

fn format_cards(cards: &[FilmCard]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} films ===\n", cards.len()));
    for card in cards {
        let item = &card.entry.item;
        let mut flags = Vec::new();
        if card.entry.favorite {
            flags.push("favorite");
        }
        if card.entry.watched {
            flags.push("watched");
        }
        if card.entry.to_watch {
            flags.push("to-watch");
        }
        out.push_str(&format!("  [{}] {}", item.id(), item.title()));
        if !flags.is_empty() {
            out.push_str(&format!(" ({})", flags.join(", ")));
        }
        out.push('\n');
        if let Some(credits) = card.credits() {
            out.push_str(&format!("      {credits}\n"));
        }
        out.push_str(&format!("      poster: {}\n", card.poster));
    }
    out
}

fn format_festivals(items: &[EnrichedItem], selected: Option<usize>) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} festivals ===\n", items.len()));
    for (i, item) in items.iter().enumerate() {
        let marker = if Some(i) == selected { '>' } else { ' ' };
        out.push_str(&format!("{marker} {i:>3}. {}", item.title()));
        if let Some(at) = item.item.coordinate() {
            out.push_str(&format!(" @ {:.4}, {:.4}", at.lat, at.lon));
        }
        out.push('\n');
    }
    out
}

fn format_lists(sets: &MembershipSets) -> String {
    let mut out = String::new();
    for kind in MembershipKind::ALL {
        let mut ids: Vec<&ItemId> = sets.get(kind).iter().collect();
        ids.sort();
        out.push_str(&format!("=== {kind} ({}) ===\n", ids.len()));
        for id in ids {
            out.push_str(&format!("  {id}\n"));
        }
    }
    out
}

// --- Commands ---

fn metadata_source(config: &ClientConfig) -> Option<Arc<dyn MetadataSource>> {
    match &config.tmdb_api_key {
        Some(key) => Some(Arc::new(TmdbClient::new(&config.tmdb_url, key))),
        None => {
            warn!("No TMDB API key configured, posters disabled");
            None
        }
    }
}

async fn membership(backend: &BackendClient, session: Option<Session>) -> Arc<MembershipStore> {
    Arc::new(MembershipStore::connect(Arc::new(backend.clone()), Arc::new(LoginHint), session).await)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let session = EnvSession.current_session();
    info!(api_url = %config.api_url, signed_in = session.is_some(), "Starting");

    let backend = BackendClient::new(&config.api_url);

    match cli.command {
        Command::Films | Command::Search { .. } => {
            let pipeline = Pipeline::new(
                Arc::new(backend.clone()),
                metadata_source(&config),
                session.clone(),
            )
            .with_config(&config);
            let mut page = CatalogPage::new(
                pipeline,
                membership(&backend, session).await,
                DetailOverlay::new(Arc::new(NoScroll)),
                &config.tmdb_image_url,
            );
            match &cli.command {
                Command::Search { text } => page.search(text).await,
                _ => page.load(&CatalogQuery::All).await,
            }
            if let Some(e) = page.last_error() {
                anyhow::bail!("Catalog unavailable: {e}");
            }
            print!("{}", format_cards(&page.cards()));
        }
        Command::Festivals { lat, lon, select } => {
            let pipeline = Pipeline::new(Arc::new(backend), None, session).with_config(&config);
            let mut page = FestivalMapPage::new(
                pipeline,
                Arc::new(FixedLocation(Some(Coordinate::new(lat, lon)))),
                SelectionSync::new(Arc::new(LogViewport)),
            );
            match page.load().await {
                FestivalStatus::Ready => {}
                FestivalStatus::Failed(e) => anyhow::bail!("Festivals unavailable: {e}"),
                other => anyhow::bail!("Festivals not loaded: {other:?}"),
            }
            if let Some(index) = select {
                if page.on_list_activated(index).is_none() && page.selected_index() != Some(index) {
                    warn!(index, "Nothing to select at that index");
                }
            }
            print!("{}", format_festivals(page.items(), page.selected_index()));
            if let Some(lines) = page.selected_summary() {
                for line in lines {
                    println!("    {line}");
                }
            }
        }
        Command::Lists => {
            let store = membership(&backend, session).await;
            let lists = store.lists().inspect_err(|_| LoginHint.redirect_to_login())?;
            print!("{}", format_lists(&lists));
        }
        Command::Toggle { kind, id } => {
            let store = membership(&backend, session).await;
            let id = ItemId::new(id);
            match store.toggle(kind, &id).await {
                ToggleOutcome::Applied { member } => {
                    let verb = if member { "added to" } else { "removed from" };
                    println!("{id} {verb} {kind}");
                }
                ToggleOutcome::Reverted { reason, .. } => anyhow::bail!(reason),
                ToggleOutcome::LoginRequired => anyhow::bail!("Not signed in"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use playlist_reconcile::catalog::TrackSearch;
use playlist_reconcile::config::{Config, DEFAULT_CONFIG_PATH};
use playlist_reconcile::import::import_playlist;
use playlist_reconcile::local::SqliteLibrary;
use playlist_reconcile::progress::{format_duration, set_log_only};
use playlist_reconcile::reconcile::Reconciler;
use playlist_reconcile::safety::validate_output_dir;
use playlist_reconcile::sink::JsonMissingSink;
use playlist_reconcile::snapshot::{read_playlists, read_tracks, write_snapshots};
use playlist_reconcile::store::SqliteCatalog;

#[derive(Parser)]
#[command(name = "playlist-reconcile")]
#[command(about = "Reconcile playlists across music catalogs and a local library")]
struct Args {
    /// Config file, created with defaults if missing
    #[arg(long, env = "PLAYLIST_RECONCILE_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Debug logging (RUST_LOG still wins)
    #[arg(long, global = true)]
    debug: bool,

    /// Hide progress bars, log periodic progress lines instead
    #[arg(long, global = true)]
    log_only: bool,

    /// Override `data_dir` from the config file
    #[arg(long, env = "PLAYLIST_RECONCILE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Override `catalog_db` from the config file
    #[arg(long, env = "PLAYLIST_RECONCILE_CATALOG_DB", global = true)]
    catalog_db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a JSON track dump into the target catalog
    Index { tracks: PathBuf },

    /// Reconcile source playlist exports into the target catalog
    Reconcile {
        /// Write run statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Resolve target playlist snapshots against the local library into .m3u8 files
    ImportLocal {
        #[arg(long, env = "PLAYLIST_RECONCILE_LIBRARY_DB")]
        library_db: Option<PathBuf>,

        #[arg(long, env = "PLAYLIST_RECONCILE_PLAYLIST_DIR")]
        playlist_dir: Option<PathBuf>,
    },

    /// Print the ranked candidates for a query
    Search { query: String },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn load_config(args: &Args) -> Result<(Config, bool)> {
    let (mut config, created) = Config::load_or_create(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(db) = &args.catalog_db {
        config.catalog_db = db.clone();
    }
    config.debug |= args.debug;
    Ok((config, created))
}

fn run_index(config: &Config, tracks_path: &Path) -> Result<()> {
    let tracks = read_tracks(tracks_path)
        .with_context(|| format!("Failed to read track dump {}", tracks_path.display()))?;
    info!("Read {} tracks from {}", tracks.len(), tracks_path.display());

    let mut catalog = SqliteCatalog::open(&config.catalog_db)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_db.display()))?;
    let written = catalog.index_tracks(&tracks).context("Failed to index tracks")?;
    let total = catalog.track_count()?;

    println!("\n{:=<60}", "");
    println!("Indexing complete!");
    println!("  Written: {}", written);
    println!("  Catalog size: {} tracks", total);
    println!("{:=<60}", "");
    Ok(())
}

fn run_reconcile(config: &Config, stats_path: Option<&Path>) -> Result<()> {
    let source_dir = config.source_dir();
    validate_output_dir(&config.missing_dir(), &[source_dir.as_path()])?;
    validate_output_dir(&config.snapshot_dir(), &[source_dir.as_path()])?;

    let sources = read_playlists(&source_dir)
        .with_context(|| format!("Failed to read playlists from {}", source_dir.display()))?;
    if sources.is_empty() {
        bail!("No source playlists found in {}", source_dir.display());
    }
    info!("Found {} source playlists to process", sources.len());

    let catalog = SqliteCatalog::open(&config.catalog_db)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_db.display()))?;
    let sink = JsonMissingSink::new(config.missing_dir());

    let mut reconciler = Reconciler::new(&catalog, &catalog, &sink);
    let report = reconciler.reconcile_all(&sources)?;

    let targets: Vec<_> = report.completed.iter().map(|c| &c.target).collect();
    let (_, snapshot_failures) = write_snapshots(&catalog, &config.snapshot_dir(), &targets);

    let stats = reconciler.into_stats();
    stats.log_summary();
    if let Some(path) = stats_path {
        stats.write_to_file(path)?;
        info!("Wrote stats to {}", path.display());
    }

    if report.has_failures() {
        for failure in &report.failed {
            error!("'{}': {}", failure.source_title, failure.error);
        }
        bail!("{} of {} playlists failed", report.failed.len(), sources.len());
    }
    if snapshot_failures > 0 {
        bail!("{} of {} snapshots could not be written", snapshot_failures, report.completed.len());
    }
    Ok(())
}

fn run_import_local(config: &Config, library_db: Option<&Path>, playlist_dir: Option<&Path>) -> Result<()> {
    let library_db = library_db.unwrap_or(config.library_db.as_path());
    let playlist_dir = playlist_dir.unwrap_or(config.playlist_dir.as_path());
    let snapshot_dir = config.snapshot_dir();
    validate_output_dir(playlist_dir, &[snapshot_dir.as_path()])?;
    validate_output_dir(&config.local_missing_dir(), &[snapshot_dir.as_path()])?;

    info!("Opening library database {}", library_db.display());
    let library = SqliteLibrary::open(library_db)
        .with_context(|| format!("Failed to open library {}", library_db.display()))?;
    let playlists = read_playlists(&snapshot_dir)
        .with_context(|| format!("Failed to read snapshots from {}", snapshot_dir.display()))?;
    info!("Found {} playlists to import", playlists.len());

    let sink = JsonMissingSink::new(config.local_missing_dir());
    let mut failed = 0usize;
    let (mut found, mut missing, mut sink_failures) = (0usize, 0usize, 0usize);
    for playlist in &playlists {
        match import_playlist(&library, &sink, playlist, playlist_dir) {
            Ok(report) => {
                found += report.found;
                missing += report.missing;
                sink_failures += usize::from(report.sink_failed);
            }
            Err(e) => {
                error!("Failed to import playlist '{}': {}", playlist.title, e);
                failed += 1;
            }
        }
    }

    info!("Local import: {} tracks found, {} missing", found, missing);
    if sink_failures > 0 {
        error!("{} missing-track reports could not be written", sink_failures);
    }
    if failed > 0 {
        bail!("{} of {} playlists failed to import", failed, playlists.len());
    }
    Ok(())
}

fn run_search(config: &Config, query: &str) -> Result<()> {
    let catalog = SqliteCatalog::open(&config.catalog_db)
        .with_context(|| format!("Failed to open catalog {}", config.catalog_db.display()))?;
    let results = catalog.search(query)?;

    println!("\nSearch results for '{}':", query);
    println!("{:-<80}", "");
    for candidate in results.candidates() {
        let track = candidate.track;
        println!(
            "[{}] {} ({}) isrc={} id={}",
            candidate.rank,
            track,
            track.album.as_deref().unwrap_or("Unknown"),
            if track.isrc().is_empty() { "-" } else { track.isrc() },
            track.external_id
        );
    }
    if results.is_empty() {
        println!("No results found.");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let (config, created) = load_config(&args)?;
    init_logging(config.debug);
    if created {
        info!("Created default config at {}", args.config.display());
    }
    if config.debug {
        info!("debug mode enabled");
    }
    config.ensure_dirs().context("Failed to create working directories")?;

    let start = Instant::now();
    match &args.command {
        Command::Index { tracks } => run_index(&config, tracks)?,
        Command::Reconcile { stats } => run_reconcile(&config, stats.as_deref())?,
        Command::ImportLocal {
            library_db,
            playlist_dir,
        } => run_import_local(&config, library_db.as_deref(), playlist_dir.as_deref())?,
        Command::Search { query } => run_search(&config, query)?,
    }
    info!("Done in {}", format_duration(start.elapsed()));
    Ok(())
}

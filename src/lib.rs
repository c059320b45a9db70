pub mod config;
pub mod model;
pub mod search;
pub mod storage;
pub mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use config::PaletteConfig;
use search::categorize::categorize;
use search::dispatch::gate;
use storage::sqlite::{ImportFile, SqliteSearchStore};

static LONG_VERSION: Lazy<String> = Lazy::new(|| {
    match (
        option_env!("VERGEN_BUILD_TIMESTAMP"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
    ) {
        (Some(ts), Some(target)) => {
            format!("{} (built {ts} for {target})", env!("CARGO_PKG_VERSION"))
        }
        _ => env!("CARGO_PKG_VERSION").to_string(),
    }
});

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    long_version = LONG_VERSION.as_str(),
    about = "Incremental search palette over portfolios, assets, documents and articles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch interactive TUI
    Tui {
        /// Render once and exit (headless-friendly)
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Override data dir (database, palette.toml, folio.log)
        #[arg(long, env = "FOLIO_DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Signed-in identity whose entities are searched
        #[arg(long)]
        identity: Option<String>,
    },
    /// Run one lookup and print grouped results
    Search {
        term: String,

        #[arg(long)]
        identity: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        #[arg(long, env = "FOLIO_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
    /// Load entities from a JSON file into the search store
    Import {
        file: PathBuf,

        #[arg(long, env = "FOLIO_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tui {
            once,
            data_dir,
            identity,
        } => {
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            // Logs go to a file so they never scribble over the alternate screen.
            let _guard = init_file_logging(&data_dir);
            let cfg = load_config(&data_dir, identity)?;
            ui::tui::run_tui(&data_dir, cfg, once)
        }
        Commands::Search {
            term,
            identity,
            json,
            data_dir,
        } => {
            init_stderr_logging();
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            let cfg = load_config(&data_dir, identity)?;
            run_search(&data_dir, &cfg, &term, json)
        }
        Commands::Import { file, data_dir } => {
            init_stderr_logging();
            let data_dir = data_dir.unwrap_or_else(default_data_dir);
            let cfg = load_config(&data_dir, None)?;
            run_import(&data_dir, &cfg, &file)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "folio", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

fn load_config(data_dir: &Path, identity: Option<String>) -> Result<PaletteConfig> {
    let mut cfg = PaletteConfig::load(data_dir)?;
    if identity.is_some() {
        cfg.identity = identity;
    }
    Ok(cfg)
}

fn run_search(data_dir: &Path, cfg: &PaletteConfig, term: &str, json: bool) -> Result<()> {
    let identity = cfg
        .session_identity()
        .context("no identity configured (pass --identity or set FOLIO_IDENTITY)")?;
    let store = SqliteSearchStore::open(&db_path_for(data_dir), cfg.per_category_limit)?;

    let raw = match gate(term, Some(&identity), cfg.min_query_len) {
        Some(key) => store.search_entries(&key.term, &key.identity)?,
        None => Default::default(),
    };
    let results = categorize(&raw);

    if json {
        let groups: Vec<_> = results
            .groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "category": g.category,
                    "label": g.label(),
                    "items": g.items,
                })
            })
            .collect();
        let out = serde_json::json!({
            "query": term,
            "identity": identity,
            "total": results.len(),
            "groups": groups,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for \"{term}\"");
        return Ok(());
    }
    for group in &results.groups {
        println!("{} {}", group.icon(), group.label());
        for item in &group.items {
            let marker = if item.external { " ↗" } else { "" };
            if item.subtitle.is_empty() {
                println!("  {}  {}{marker}", item.title, item.href);
            } else {
                println!("  {} ({})  {}{marker}", item.title, item.subtitle, item.href);
            }
        }
    }
    Ok(())
}

fn run_import(data_dir: &Path, cfg: &PaletteConfig, file: &Path) -> Result<()> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("reading import file {}", file.display()))?;
    let parsed: ImportFile = serde_json::from_str(&body)
        .with_context(|| format!("parsing import file {}", file.display()))?;
    let bundles = parsed.into_bundles();
    let mut store = SqliteSearchStore::open(&db_path_for(data_dir), cfg.per_category_limit)?;
    let written = store.import(&bundles)?;
    println!(
        "Imported {written} entries ({} total in {})",
        store.count()?,
        db_path_for(data_dir).display()
    );
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn init_file_logging(data_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(data_dir).ok()?;
    let appender = tracing_appender::rolling::never(data_dir, "folio.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

pub fn db_path_for(data_dir: &Path) -> PathBuf {
    data_dir.join("folio.db")
}

pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "folio", "folio")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".folio"))
}

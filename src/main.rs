mod corpus;
mod db;
mod dump;
mod parser;
mod settings;
mod sink;
mod walker;

use std::borrow::Cow;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use settings::Settings;

#[derive(Parser)]
#[command(name = "wiki_passages", about = "Extract titled plain-text passages from a MediaWiki XML dump")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a dump (.xml or .xml.bz2) and collect passages
    Parse {
        /// Path to the MediaWiki XML dump
        xml_file: PathBuf,
        /// Write passages here (.json, .jsonl or .sqlite)
        #[arg(short, long)]
        output_file: Option<PathBuf>,
        /// Max pages to read (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Normalizer passes per article, for nested markup
        #[arg(long)]
        max_passes: Option<usize>,
        /// Pages normalized in parallel per batch
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Print the plain text of one markup file (stdin if omitted)
    Normalize {
        file: Option<PathBuf>,
        /// Re-run the rules up to this many times (default: single pass)
        #[arg(long)]
        max_passes: Option<usize>,
    },
    /// Print the passages of one markup file as JSON (stdin if omitted)
    Segment {
        file: Option<PathBuf>,
        /// Article title attached to every passage
        #[arg(short, long, default_value = "")]
        title: String,
        #[arg(long, default_value = "1")]
        max_passes: usize,
    },
    /// Show passage statistics for a SQLite output
    Stats {
        db_file: PathBuf,
        /// Also list the passages of this article
        #[arg(short, long)]
        article: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            xml_file,
            output_file,
            limit,
            max_passes,
            chunk_size,
        } => {
            let settings = Settings::from_env()
                .context("Invalid WIKI_* settings")?
                .with_overrides(limit, max_passes, chunk_size);
            info!(?settings, "Parsing {}", xml_file.display());

            let records = dump::DumpReader::open(&xml_file)
                .with_context(|| format!("Failed to open dump {}", xml_file.display()))?;
            let (corpus, stats) = walker::walk(records, &settings)?;
            println!(
                "Read {} pages ({} without text, {} without passages): {} passages from {} articles.",
                stats.records,
                stats.skipped,
                stats.empty,
                stats.passages,
                corpus.article_count(),
            );

            if corpus.is_empty() {
                warn!("No passages extracted from {}", xml_file.display());
            }

            if let Some(path) = output_file {
                let written = sink::write_corpus(&path, &corpus)?;
                println!("Saved {} passages to {}", written, path.display());
            }
            Ok(())
        }
        Commands::Normalize { file, max_passes } => {
            let raw = read_input(file.as_deref())?;
            let text = match max_passes {
                Some(n) => parser::markup::normalize_with_passes(&raw, n),
                None => parser::markup::normalize(&raw),
            };
            println!("{}", text);
            Ok(())
        }
        Commands::Segment {
            file,
            title,
            max_passes,
        } => {
            let raw = read_input(file.as_deref())?;
            let text = parser::markup::normalize_with_passes(&raw, max_passes);
            let passages = parser::passages::segment_titled(&text, &title);
            println!("{}", serde_json::to_string_pretty(&passages)?);
            Ok(())
        }
        Commands::Stats { db_file, article } => {
            let conn = db::connect_existing(&db_file)?;
            let s = db::get_stats(&conn)?;
            println!("Articles: {}", s.articles);
            println!("Passages: {}", s.passages);
            println!("Titled:   {}", s.titled);
            println!("Untitled: {}", s.untitled);

            if let Some(article) = article {
                let rows = db::fetch_passages(&conn, &article)?;
                println!("\n--- {} ({} passages) ---", article, rows.len());
                for (title, text) in rows {
                    println!("[{}] {}", title.as_deref().unwrap_or("-"), truncate(&text, 100));
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

/// First `max` chars of `s`, with an ellipsis when anything was cut.
fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &s[..end]).into(),
        None => s.into(),
    }
}

fn format_duration(d: Duration) -> String {
    match d.as_secs() {
        secs if secs < 60 => format!("{:.1}s", d.as_secs_f64()),
        secs => format!("{}m {:02}s", secs / 60, secs % 60),
    }
}

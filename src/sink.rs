use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::corpus::Corpus;
use crate::db;

/// Output format, picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonLines,
    Sqlite,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl" | "ndjson") => OutputFormat::JsonLines,
            Some("sqlite" | "db") => OutputFormat::Sqlite,
            _ => OutputFormat::Json,
        }
    }
}

/// Persist the whole corpus to `path`. Returns the number of passages written.
pub fn write_corpus(path: &Path, corpus: &Corpus) -> Result<usize> {
    let format = OutputFormat::from_path(path);
    let written = match format {
        OutputFormat::Json => write_json(path, corpus)?,
        OutputFormat::JsonLines => write_json_lines(path, corpus)?,
        OutputFormat::Sqlite => {
            let conn = db::connect(path)
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            db::init_schema(&conn)?;
            db::save_passages(&conn, corpus.passages())?
        }
    };
    info!("Wrote {} passages to {} ({:?})", written, path.display(), format);
    Ok(written)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Pretty JSON array, four-space indent.
fn write_json(path: &Path, corpus: &Corpus) -> Result<usize> {
    let mut out = create(path)?;
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    corpus.passages().serialize(&mut ser)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(corpus.len())
}

fn write_json_lines(path: &Path, corpus: &Corpus) -> Result<usize> {
    let mut out = create(path)?;
    for passage in corpus.passages() {
        serde_json::to_writer(&mut out, passage)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(corpus.len())
}

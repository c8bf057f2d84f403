use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};

use crate::corpus::Passage;

pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Open a database that must already exist.
pub fn connect_existing(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .with_context(|| format!("No database at {}", path.display()))?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS passages (
            id            INTEGER PRIMARY KEY,
            article_title TEXT NOT NULL,
            passage_title TEXT,
            passage_text  TEXT NOT NULL CHECK(length(trim(passage_text)) > 0),
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_passages_article ON passages(article_title);
        ",
    )?;
    Ok(())
}

// ── Passages ──

/// Replace the stored passages with `passages` in one transaction; row ids
/// follow corpus order.
pub fn save_passages(conn: &Connection, passages: &[Passage]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM passages", [])?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO passages (article_title, passage_title, passage_text)
             VALUES (?1, ?2, ?3)",
        )?;
        for p in passages {
            count += stmt.execute(rusqlite::params![
                &*p.article_title,
                p.passage_title,
                p.passage_text,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_passages(conn: &Connection, article_title: &str) -> Result<Vec<(Option<String>, String)>> {
    let mut stmt = conn.prepare(
        "SELECT passage_title, passage_text FROM passages
         WHERE article_title = ?1
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([article_title], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub articles: usize,
    pub passages: usize,
    pub titled: usize,
    pub untitled: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let articles: usize =
        conn.query_row("SELECT COUNT(DISTINCT article_title) FROM passages", [], |r| r.get(0))?;
    let passages: usize = conn.query_row("SELECT COUNT(*) FROM passages", [], |r| r.get(0))?;
    let titled: usize = conn.query_row(
        "SELECT COUNT(*) FROM passages WHERE passage_title IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        articles,
        passages,
        titled,
        untitled: passages - titled,
    })
}

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::corpus::{Corpus, Passage};
use crate::dump::{DumpError, RawRecord};
use crate::parser;
use crate::settings::Settings;

/// Counters for one walk over a dump.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Pages read from the source, skipped ones included.
    pub records: usize,
    /// Pages with an absent or empty body.
    pub skipped: usize,
    /// Pages with a body that produced no passages (redirects, markup only).
    pub empty: usize,
    pub passages: usize,
}

/// Normalize and segment every record, flattening the passages into a
/// [`Corpus`] in record order. Stops after `settings.limit` records.
///
/// Records are read sequentially and processed in parallel batches of
/// `settings.chunk_size`; a read error aborts the walk.
pub fn walk<I>(records: I, settings: &Settings) -> Result<(Corpus, WalkStats), DumpError>
where
    I: Iterator<Item = Result<RawRecord, DumpError>>,
{
    let pb = progress_bar(settings.limit);
    let mut corpus = Corpus::new();
    let mut stats = WalkStats::default();
    let mut chunk: Vec<RawRecord> = Vec::with_capacity(settings.chunk_size);

    for record in records.take(settings.limit.unwrap_or(usize::MAX)) {
        chunk.push(record?);
        stats.records += 1;
        if stats.records % settings.progress_every == 0 {
            info!("Processed {} pages", stats.records);
        }

        if chunk.len() >= settings.chunk_size {
            process_chunk(&chunk, settings.max_passes, &mut corpus, &mut stats);
            pb.inc(chunk.len() as u64);
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        process_chunk(&chunk, settings.max_passes, &mut corpus, &mut stats);
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    info!(
        "Walked {} pages ({} skipped, {} without passages), {} passages",
        stats.records, stats.skipped, stats.empty, stats.passages
    );
    Ok((corpus, stats))
}

fn process_chunk(chunk: &[RawRecord], max_passes: usize, corpus: &mut Corpus, stats: &mut WalkStats) {
    let results: Vec<Vec<Passage>> = chunk
        .par_iter()
        .map(|record| parser::process_record(record, max_passes))
        .collect();

    for (record, passages) in chunk.iter().zip(results) {
        if record.body.as_deref().map_or(true, str::is_empty) {
            debug!("Skipping '{}': no body", record.title);
            stats.skipped += 1;
            continue;
        }
        if passages.is_empty() {
            debug!("No passages in '{}'", record.title);
            stats.empty += 1;
        }
        stats.passages += passages.len();
        corpus.extend(passages);
    }
}

fn progress_bar(limit: Option<usize>) -> ProgressBar {
    match limit {
        Some(n) => {
            let pb = ProgressBar::new(n as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} pages ({per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::DumpReader;

    fn sample_records() -> Vec<Result<RawRecord, DumpError>> {
        let xml = std::fs::read_to_string("tests/fixtures/sample_dump.xml").unwrap();
        DumpReader::new(std::io::Cursor::new(xml)).collect()
    }

    fn settings(limit: Option<usize>, chunk_size: usize) -> Settings {
        Settings::default().with_overrides(limit, None, Some(chunk_size))
    }

    #[test]
    fn sample_dump_end_to_end() {
        let (corpus, stats) = walk(sample_records().into_iter(), &Settings::default()).unwrap();
        assert_eq!(
            stats,
            WalkStats {
                records: 5,
                skipped: 1,
                empty: 1,
                passages: 8,
            }
        );

        let articles: Vec<&str> = corpus.passages().iter().map(|p| &*p.article_title).collect();
        assert_eq!(
            articles,
            ["Moon", "Moon", "Moon", "Moon", "Moon", "Sun", "Tom & Jerry", "Tom & Jerry"]
        );
        assert_eq!(corpus.article_count(), 3);

        let sun = &corpus.passages()[5];
        assert_eq!(sun.passage_title, None);
        assert_eq!(sun.passage_text, "The Sun is a star.");

        let characters = corpus.passages().last().unwrap();
        assert_eq!(characters.passage_title.as_deref(), Some("Characters"));
        assert_eq!(characters.passage_text, "Tom chases Jerry.");
    }

    #[test]
    fn limit_counts_skipped_pages() {
        let (corpus, stats) = walk(sample_records().into_iter(), &settings(Some(3), 500)).unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.skipped, 1);
        assert!(corpus.passages().iter().all(|p| &*p.article_title == "Moon"));
    }

    #[test]
    fn chunking_preserves_order() {
        let (whole, _) = walk(sample_records().into_iter(), &settings(None, 500)).unwrap();
        let (chunked, _) = walk(sample_records().into_iter(), &settings(None, 2)).unwrap();
        assert_eq!(whole.passages(), chunked.passages());
    }

    #[test]
    fn read_error_aborts() {
        let records = vec![
            Ok(RawRecord { title: "A".into(), body: Some("text".into()) }),
            Err(DumpError::Io(std::io::Error::other("boom"))),
        ];
        assert!(walk(records.into_iter(), &Settings::default()).is_err());
    }

    #[test]
    fn generated_pages_in_order() {
        let records: Vec<_> = (0..1200)
            .map(|i| {
                Ok(RawRecord {
                    title: format!("Page {i}"),
                    body: Some(format!("==Heading==\nBody {i}.")),
                })
            })
            .collect();
        let (corpus, stats) = walk(records.into_iter(), &settings(None, 64)).unwrap();
        assert_eq!(stats.passages, 1200);
        for (i, p) in corpus.passages().iter().enumerate() {
            assert_eq!(p.passage_text, format!("Body {i}."));
        }
    }
}

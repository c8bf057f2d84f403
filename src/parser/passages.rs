use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::corpus::Passage;

static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"==(.*)==").unwrap());

/// Split normalized text into passages at blank-line boundaries.
///
/// A block's first `==...==` header becomes its title; every header line is
/// stripped from the body. Blocks whose body is empty after trimming are
/// dropped, so no emitted passage has whitespace-only text.
pub fn segment(normalized: &str, article_title: &Arc<str>) -> Vec<Passage> {
    BLOCK_BREAK_RE
        .split(normalized)
        .filter_map(|block| split_header(block, article_title))
        .collect()
}

/// Same as [`segment`] for callers holding a plain title.
pub fn segment_titled(normalized: &str, article_title: &str) -> Vec<Passage> {
    segment(normalized, &Arc::from(article_title))
}

fn split_header(block: &str, article_title: &Arc<str>) -> Option<Passage> {
    // Only the first header names the passage, but all of them leave the body.
    let passage_title = HEADER_RE
        .captures(block)
        .map(|caps| caps[1].trim().to_string());
    let body = HEADER_RE.replace_all(block, "");
    let passage_text = body.trim();
    if passage_text.is_empty() {
        return None;
    }

    Some(Passage {
        article_title: Arc::clone(article_title),
        passage_title,
        passage_text: passage_text.to_string(),
    })
}

// ── Tests ──

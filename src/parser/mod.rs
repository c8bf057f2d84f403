pub mod markup;
pub mod passages;

use std::sync::Arc;

use crate::corpus::Passage;
use crate::dump::RawRecord;

/// Two-pass pipeline: markup → plain text → passages.
///
/// An absent or empty body yields no passages.
pub fn process_record(record: &RawRecord, max_passes: usize) -> Vec<Passage> {
    let Some(body) = record.body.as_deref() else {
        return Vec::new();
    };
    let text = markup::normalize_with_passes(body, max_passes);
    if text.is_empty() {
        return Vec::new();
    }
    let title: Arc<str> = Arc::from(record.title.as_str());
    passages::segment(&text, &title)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, body: Option<&str>) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            body: body.map(str::to_string),
        }
    }

    #[test]
    fn infobox_comment_and_emphasis() {
        let body = "{{infobox|x}}\n\n==A==\nSome '''bold''' text.\n\n<!--c-->";
        let passages = process_record(&record("Art", Some(body)), 1);
        assert_eq!(passages.len(), 1);
        assert_eq!(&*passages[0].article_title, "Art");
        assert_eq!(passages[0].passage_title.as_deref(), Some("A"));
        assert_eq!(passages[0].passage_text, "Some bold text.");
    }

    #[test]
    fn absent_body_yields_nothing() {
        assert!(process_record(&record("Art", None), 1).is_empty());
        assert!(process_record(&record("Art", Some("")), 1).is_empty());
    }

    #[test]
    fn redirect_page_yields_nothing() {
        assert!(process_record(&record("Old", Some("#REDIRECT [[New]]")), 1).is_empty());
    }

    #[test]
    fn article_fixture() {
        let body = std::fs::read_to_string("tests/fixtures/moon.wiki").unwrap();
        let passages = process_record(&record("Moon", Some(&body)), 1);
        let titles: Vec<Option<&str>> = passages.iter().map(|p| p.passage_title.as_deref()).collect();
        assert_eq!(
            titles,
            [None, None, Some("Name and etymology"), Some("Formation"), Some("Orbit")]
        );
        for p in &passages {
            assert!(!p.passage_text.contains("{{"), "template leaked: {}", p.passage_text);
            assert!(!p.passage_text.contains("[["), "link leaked: {}", p.passage_text);
            assert!(!p.passage_text.contains("<ref"), "ref leaked: {}", p.passage_text);
            assert!(!p.passage_text.contains("'''"), "emphasis leaked: {}", p.passage_text);
        }
        assert!(passages[0].passage_text.starts_with("The Moon is Earth's only natural satellite."));
    }
}

use std::sync::Arc;

use serde::Serialize;

/// One titled or untitled block of plain text from an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Passage {
    pub article_title: Arc<str>,
    pub passage_title: Option<String>,
    pub passage_text: String,
}

/// Append-only, ordered collection of passages: record order, then passage
/// order within each record.
#[derive(Debug, Default)]
pub struct Corpus {
    passages: Vec<Passage>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, passages: impl IntoIterator<Item = Passage>) {
        self.passages.extend(passages);
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Number of distinct articles, counted as runs of equal titles.
    pub fn article_count(&self) -> usize {
        self.passages
            .windows(2)
            .filter(|w| w[0].article_title != w[1].article_title)
            .count()
            + usize::from(!self.passages.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(article: &str, text: &str) -> Passage {
        Passage {
            article_title: Arc::from(article),
            passage_title: None,
            passage_text: text.to_string(),
        }
    }

    #[test]
    fn extend_keeps_order() {
        let mut corpus = Corpus::new();
        corpus.extend([passage("A", "1"), passage("A", "2")]);
        corpus.extend([passage("B", "3")]);
        let texts: Vec<&str> = corpus.passages().iter().map(|p| p.passage_text.as_str()).collect();
        assert_eq!(texts, ["1", "2", "3"]);
        assert_eq!(corpus.article_count(), 2);
    }

    #[test]
    fn empty_corpus() {
        let corpus = Corpus::new();
        assert!(corpus.is_empty());
        assert_eq!(corpus.article_count(), 0);
    }

    #[test]
    fn serializes_three_fields() {
        let json = serde_json::to_value(passage("Art", "Body")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "article_title": "Art",
                "passage_title": null,
                "passage_text": "Body",
            })
        );
    }
}

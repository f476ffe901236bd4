use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Marks keyword occurrences inside the best-matching fragment of a text.
pub struct Highlighter {
    tokenizer: Arc<dyn Tokenizer>,
    pre_tag: String,
    post_tag: String,
    fragment_size: usize,
}

impl Default for Highlighter {
    fn default() -> Self {
        Highlighter {
            tokenizer: Arc::new(StandardTokenizer::default()),
            pre_tag: "<b>".to_string(),
            post_tag: "</b>".to_string(),
            fragment_size: 1000,
        }
    }
}

impl Highlighter {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Highlighter {
            tokenizer,
            ..Highlighter::default()
        }
    }

    pub fn tags(mut self, pre: &str, post: &str) -> Self {
        self.pre_tag = pre.to_string();
        self.post_tag = post.to_string();
        self
    }

    /// Byte budget of the returned fragment, aligned to char boundaries.
    pub fn fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = size;
        self
    }

    /// The fragment of `content` around the first keyword hit, with every
    /// keyword occurrence inside it wrapped in the configured tags. Content
    /// without a hit yields an unmarked truncated fragment.
    pub fn best_fragment(&self, keyword: &str, content: &str) -> String {
        let terms: HashSet<String> = self
            .tokenizer
            .split_words(keyword)
            .into_iter()
            .collect();
        let spans = self.tokenizer.tokenize(content);
        let matches: Vec<_> = spans
            .into_iter()
            .filter(|span| terms.contains(&span.text))
            .collect();

        let Some(first) = matches.first() else {
            let end = floor_char_boundary(content, self.fragment_size.min(content.len()));
            return content[..end].to_string();
        };

        // window around the first hit
        let start = floor_char_boundary(content, first.start.saturating_sub(self.fragment_size / 4));
        let end = floor_char_boundary(content, (start + self.fragment_size).min(content.len()));

        let mut out = String::with_capacity(end - start + 32);
        let mut cursor = start;
        for span in matches
            .iter()
            .filter(|s| s.start >= start && s.end <= end)
        {
            out.push_str(&content[cursor..span.start]);
            out.push_str(&self.pre_tag);
            out.push_str(&content[span.start..span.end]);
            out.push_str(&self.post_tag);
            cursor = span.end;
        }
        out.push_str(&content[cursor..end]);
        out
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_every_hit_in_the_fragment() {
        let highlighter = Highlighter::default();
        let marked = highlighter.best_fragment("rust", "Rust is fast. I like rust.");
        assert_eq!(marked, "<b>Rust</b> is fast. I like <b>rust</b>.");
    }

    #[test]
    fn no_hit_returns_truncated_unmarked_content() {
        let highlighter = Highlighter::default().fragment_size(10);
        let marked = highlighter.best_fragment("absent", "plain text without the word");
        assert_eq!(marked, "plain text");
        assert!(!marked.contains("<b>"));
    }

    #[test]
    fn fragment_respects_char_boundaries() {
        let highlighter = Highlighter::default().fragment_size(8);
        // multi-byte text must not be split inside a character
        let marked = highlighter.best_fragment("missing", "搜索引擎全文检索");
        assert!(marked.len() <= 8);
        assert!(std::str::from_utf8(marked.as_bytes()).is_ok());
    }

    #[test]
    fn custom_tags_are_used() {
        let highlighter = Highlighter::default().tags("[", "]");
        let marked = highlighter.best_fragment("term", "a term here");
        assert_eq!(marked, "a [term] here");
    }
}

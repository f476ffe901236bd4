use std::sync::Arc;

use tantivy::tokenizer::{
    TextAnalyzer, Token, TokenStream, Tokenizer as TantivyTokenizer,
};
use unicode_segmentation::UnicodeSegmentation;

/// One token with its byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Pluggable text-splitting strategy, used at index time and query time.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<TokenSpan>;

    /// Token texts only.
    fn split_words(&self, text: &str) -> Vec<String> {
        self.tokenize(text)
            .into_iter()
            .map(|span| span.text)
            .collect()
    }
}

/// Default tokenizer: Unicode word segmentation, lowercased.
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<TokenSpan> {
        text.unicode_word_indices()
            .filter(|(_, word)| word.len() <= self.max_token_length)
            .map(|(start, word)| TokenSpan {
                text: if self.lowercase {
                    word.to_lowercase()
                } else {
                    word.to_string()
                },
                start,
                end: start + word.len(),
            })
            .collect()
    }
}

/// Adapter exposing any [`Tokenizer`] to the index engine.
#[derive(Clone)]
pub struct AnalyzerBridge {
    inner: Arc<dyn Tokenizer>,
}

impl AnalyzerBridge {
    pub fn new(inner: Arc<dyn Tokenizer>) -> Self {
        AnalyzerBridge { inner }
    }

    pub fn into_analyzer(self) -> TextAnalyzer {
        TextAnalyzer::from(self)
    }
}

impl TantivyTokenizer for AnalyzerBridge {
    type TokenStream<'a> = SpanTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let tokens = self
            .inner
            .tokenize(text)
            .into_iter()
            .enumerate()
            .map(|(position, span)| Token {
                offset_from: span.start,
                offset_to: span.end,
                position,
                text: span.text,
                position_length: 1,
            })
            .collect();
        SpanTokenStream { tokens, index: 0 }
    }
}

/// Pre-tokenized stream handed to the engine.
pub struct SpanTokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream for SpanTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.index - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases_words() {
        let tokenizer = StandardTokenizer::default();
        let words = tokenizer.split_words("Hello, Search World!");
        assert_eq!(words, vec!["hello", "search", "world"]);
    }

    #[test]
    fn spans_reference_source_offsets() {
        let tokenizer = StandardTokenizer::default();
        let text = "abc def";
        let spans = tokenizer.tokenize(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].start..spans[0].end], "abc");
        assert_eq!(&text[spans[1].start..spans[1].end], "def");
    }

    #[test]
    fn handles_cjk_text() {
        let tokenizer = StandardTokenizer::default();
        let words = tokenizer.split_words("搜索引擎 test");
        assert!(words.contains(&"test".to_string()));
        assert!(words.iter().any(|w| w.contains('搜')));
    }

    #[test]
    fn bridge_emits_positions_and_offsets() {
        use tantivy::tokenizer::TokenStream as _;

        let mut bridge = AnalyzerBridge::new(Arc::new(StandardTokenizer::default()));
        let mut stream = bridge.token_stream("one two");
        assert!(stream.advance());
        assert_eq!(stream.token().text, "one");
        assert_eq!(stream.token().position, 0);
        assert!(stream.advance());
        assert_eq!(stream.token().text, "two");
        assert_eq!(stream.token().offset_from, 4);
        assert!(!stream.advance());
    }
}

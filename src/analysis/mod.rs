pub mod highlight;
pub mod tokenizer;

pub use highlight::Highlighter;
pub use tokenizer::{AnalyzerBridge, StandardTokenizer, TokenSpan, Tokenizer};

//! draftrag-text
//!
//! Keyword retrieval: a tantivy analyzer for tokenization and a
//! term-frequency weighted overlap scorer over chunk snapshots.

pub mod lexical;
pub mod tokenize;

pub use lexical::{overlap_score, LexicalRetriever};
pub use tokenize::Tokenizer;

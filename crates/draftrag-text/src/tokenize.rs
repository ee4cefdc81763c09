use std::collections::HashMap;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

use draftrag_core::config::LexicalConfig;

pub const ENGLISH_STOP_WORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
	"its", "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not", "this",
	"these", "they", "them", "their", "there", "then", "than", "so", "if", "when", "where", "why",
	"how", "what", "which", "who", "whom", "whose", "can", "could", "should", "would", "may",
	"might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

/// Lower-cases, splits on non-alphanumeric boundaries and drops tokens
/// shorter than `min_chars` characters.
#[derive(Clone)]
pub struct Tokenizer {
	analyzer: TextAnalyzer,
	min_chars: usize,
}

impl Tokenizer {
	pub fn new(config: &LexicalConfig) -> Self {
		let analyzer = if config.stop_words {
			TextAnalyzer::builder(SimpleTokenizer::default())
				.filter(LowerCaser)
				.filter(StopWordFilter::remove(ENGLISH_STOP_WORDS.iter().map(|s| s.to_string())))
				.build()
		} else {
			TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
		};
		Self { analyzer, min_chars: config.min_token_chars }
	}

	pub fn tokens(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut out = Vec::new();
		while stream.advance() {
			let token = &stream.token().text;
			if token.chars().count() >= self.min_chars { out.push(token.clone()); }
		}
		out
	}

	/// Occurrence count per token.
	pub fn term_counts(&self, text: &str) -> HashMap<String, usize> {
		let mut counts = HashMap::new();
		for token in self.tokens(text) { *counts.entry(token).or_insert(0) += 1; }
		counts
	}
}

impl Default for Tokenizer {
	fn default() -> Self { Self::new(&LexicalConfig::default()) }
}

use std::collections::{BTreeSet, HashMap};

use draftrag_core::config::LexicalConfig;
use draftrag_core::traits::LexicalScorer;
use draftrag_core::types::{Chunk, Scope, ScoredCandidate};

use crate::tokenize::Tokenizer;

/// Term-overlap scorer. Each distinct query term found in a chunk adds
/// `1 + ln(occurrences)`; chunks sharing no term are left out.
#[derive(Clone, Default)]
pub struct LexicalRetriever {
	tokenizer: Tokenizer,
}

impl LexicalRetriever {
	pub fn new(config: &LexicalConfig) -> Self {
		Self { tokenizer: Tokenizer::new(config) }
	}

	pub fn query_terms(&self, query: &str) -> BTreeSet<String> {
		self.tokenizer.tokens(query).into_iter().collect()
	}
}

pub fn overlap_score(terms: &BTreeSet<String>, counts: &HashMap<String, usize>) -> Option<f64> {
	let mut score = 0.0;
	let mut matched = false;
	for term in terms {
		if let Some(&n) = counts.get(term) {
			if n > 0 {
				#[allow(clippy::cast_precision_loss)]
				let occurrences = n as f64;
				score += 1.0 + occurrences.ln();
				matched = true;
			}
		}
	}
	matched.then_some(score)
}

impl LexicalScorer for LexicalRetriever {
	fn name(&self) -> &str { "lexical" }

	fn score(&self, chunks: &[Chunk], scope: &Scope, query: &str) -> Vec<ScoredCandidate> {
		let terms = self.query_terms(query);
		if terms.is_empty() {
			tracing::debug!("query has no usable terms; lexical side is empty");
			return Vec::new();
		}
		chunks
			.iter()
			.filter(|chunk| scope.admits(chunk))
			.filter_map(|chunk| {
				let counts = self.tokenizer.term_counts(&chunk.text);
				overlap_score(&terms, &counts).map(|score| ScoredCandidate::lexical(chunk.id.clone(), score))
			})
			.collect()
	}
}

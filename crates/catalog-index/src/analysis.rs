use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

pub const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
];

/// Lowercasing analyzer that drops [`STOP_WORDS`], used for `text` fields.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build()
}

pub fn analyze(analyzer: &TextAnalyzer, text: &str) -> Vec<String> {
	let mut analyzer = analyzer.clone();
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() { terms.push(stream.token().text.clone()); }
	terms
}

/// Analyzed terms with repeats removed, first occurrence kept.
pub fn distinct_terms(analyzer: &TextAnalyzer, text: &str) -> Vec<String> {
	let mut terms = analyze(analyzer, text);
	let mut seen = std::collections::HashSet::new();
	terms.retain(|t| seen.insert(t.clone()));
	terms
}

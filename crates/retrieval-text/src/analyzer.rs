use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

/// Splits on every non-alphanumeric char and lowercases. No stop words.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.build()
}

pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() { tokens.push(stream.token().text.clone()); }
	tokens
}

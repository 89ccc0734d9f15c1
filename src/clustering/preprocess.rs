//! Text normalization ahead of vectorization.

use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("static regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Lowercase, drop URLs and punctuation, and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_LIKE.replace_all(&lowered, "");
    let words_only = NON_WORD.replace_all(&no_urls, "");
    WHITESPACE.replace_all(&words_only, " ").trim().to_string()
}

/// The corpus document for one article: lowercased title, then cleaned body.
pub fn corpus_document(article: &Article) -> String {
    format!("{} {}", article.title.to_lowercase(), clean_text(&article.content))
}

pub fn build_corpus(articles: &[Article]) -> Vec<String> {
    articles.iter().map(corpus_document).collect()
}

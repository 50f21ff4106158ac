use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Common English stopwords dropped before keyword extraction.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
    "of", "with", "by", "from", "as", "is", "was", "are", "been", "be",
    "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "must", "can", "it", "its", "this", "that",
];

pub const DEFAULT_KEYWORD_COUNT: usize = 5;

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"http\S+|www\S+|https\S+").expect("url pattern is valid"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+").expect("email pattern is valid"))
}

fn non_alpha_regex() -> &'static Regex {
    static NON_ALPHA: OnceLock<Regex> = OnceLock::new();
    NON_ALPHA.get_or_init(|| Regex::new(r"[^a-zA-Z\s]").expect("letter pattern is valid"))
}

/// Lowercases and strips URLs, e-mail addresses and anything that is not a
/// letter, then collapses whitespace.
///
/// Dropping punctuation can glue a new URL-like run together ("htt-ps" becomes
/// "https"), so the pass repeats until the text stops changing. That keeps
/// `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let without_urls = url_regex().replace_all(&lowered, "");
    let without_emails = email_regex().replace_all(&without_urls, "");
    let letters = non_alpha_regex().replace_all(&without_emails, "");

    letters.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(text: &str) -> Vec<String> {
    clean_text(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .filter(|token| !STOPWORDS.contains(&token.as_str()))
        .collect()
}

/// Tokenize and drop stopwords.
pub fn preprocess(text: &str) -> Vec<String> {
    remove_stopwords(tokenize(text))
}

/// Top `limit` words by frequency. Equal counts keep the order in which the
/// words first appeared.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let tokens = preprocess(text);
    if tokens.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for token in tokens {
        match positions.get(&token) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(token.clone(), counts.len());
                counts.push((token, 1));
            }
        }
    }

    // sort_by is stable, so first-occurrence order survives for ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(word, _)| word).collect()
}

//! Page analytics collected during a crawl
//!
//! Tracks unique pages, the longest page, word frequencies and unique pages per
//! subdomain. Workers feed it through [`PageObserver`]; the final numbers are
//! taken as a [`Report`] snapshot.

use crate::config::ReportConfig;
use crate::output::report::{LongestPage, Report, WordCount};
use crate::output::PageObserver;
use crate::url::{is_within, NormalizedUrl};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// English stop words left out of the word frequencies
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's", "me",
    "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
    "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then", "there",
    "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd",
    "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't", "would",
    "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours", "yourself",
    "yourselves",
];

/// Markup leftovers that dominate counts without meaning anything
const JUNK_WORDS: &[&str] = &[
    "html", "update", "automatic", "markdown", "rmd", "git", "file", "files", "store", "ds",
    "href", "https", "http", "www", "nbsp", "amp", "quot", "lt", "gt",
];

const MIN_WORD_LEN: usize = 2;
const MAX_WORD_LEN: usize = 30;

#[derive(Debug, Default)]
struct Tallies {
    unique_pages: HashSet<String>,
    word_counts: HashMap<String, u64>,
    longest: Option<(String, usize)>,
    subdomain_pages: HashMap<String, HashSet<String>>,
}

/// Thread-safe analytics observer
#[derive(Debug)]
pub struct PageAnalytics {
    tallies: Mutex<Tallies>,
    subdomain_root: String,
    top_words: usize,
    min_page_tokens: usize,
    per_page_word_cap: u64,
}

impl PageAnalytics {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            tallies: Mutex::new(Tallies::default()),
            subdomain_root: config.subdomain_root.to_lowercase(),
            top_words: config.top_words,
            min_page_tokens: config.min_page_tokens,
            per_page_word_cap: config.per_page_word_cap,
        }
    }

    /// Records one page
    ///
    /// Pages with fewer than the configured number of tokens are ignored.
    pub fn record(&self, url: &NormalizedUrl, text: &str) {
        let tokens = tokenize(text);
        if tokens.len() < self.min_page_tokens {
            tracing::trace!("Skipping low-content page {} ({} tokens)", url, tokens.len());
            return;
        }

        let mut page_counts: HashMap<&str, u64> = HashMap::new();
        for token in tokens.iter().filter(|t| is_countable(t)) {
            *page_counts.entry(token.as_str()).or_insert(0) += 1;
        }

        let page = url.as_str().to_string();
        let mut tallies = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);

        tallies.unique_pages.insert(page.clone());

        if is_within(url.domain(), &self.subdomain_root) {
            tallies
                .subdomain_pages
                .entry(url.domain().to_string())
                .or_default()
                .insert(page.clone());
        }

        if tallies
            .longest
            .as_ref()
            .map_or(true, |(_, count)| tokens.len() > *count)
        {
            tallies.longest = Some((page, tokens.len()));
        }

        for (word, count) in page_counts {
            *tallies.word_counts.entry(word.to_string()).or_insert(0) +=
                count.min(self.per_page_word_cap);
        }
    }

    /// Number of pages recorded so far
    pub fn unique_pages(&self) -> usize {
        self.tallies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unique_pages
            .len()
    }

    /// Takes a consistent snapshot of the current numbers
    pub fn report(&self) -> Report {
        let tallies = self.tallies.lock().unwrap_or_else(PoisonError::into_inner);

        let mut words: Vec<(&String, &u64)> = tallies.word_counts.iter().collect();
        // Highest count first, ties alphabetical so reports are stable
        words.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let top_words = words
            .into_iter()
            .take(self.top_words)
            .map(|(word, count)| WordCount {
                word: word.clone(),
                count: *count,
            })
            .collect();

        let longest_page = tallies
            .longest
            .as_ref()
            .map(|(url, count)| LongestPage {
                url: url.clone(),
                word_count: *count,
            })
            .unwrap_or_default();

        let subdomains: BTreeMap<String, usize> = tallies
            .subdomain_pages
            .iter()
            .map(|(host, pages)| (host.clone(), pages.len()))
            .collect();

        Report {
            unique_pages_count: tallies.unique_pages.len(),
            longest_page,
            top_words,
            subdomains,
        }
    }
}

impl PageObserver for PageAnalytics {
    fn on_page_processed(&self, url: &NormalizedUrl, text: &str) {
        self.record(url, text);
    }
}

/// Splits text into lowercase runs of ASCII letters and digits
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

fn is_countable(token: &str) -> bool {
    (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&token.len())
        && !STOP_WORDS.contains(&token)
        && !JUNK_WORDS.contains(&token)
}

//! Final crawl report
//!
//! The report is written twice at the end of a crawl: as JSON for scripts and
//! as plain text for people.

use crate::output::OutputResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LongestPage {
    pub url: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Analytics snapshot of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub unique_pages_count: usize,
    pub longest_page: LongestPage,

    /// Most frequent words, highest count first
    pub top_words: Vec<WordCount>,

    /// Unique pages per subdomain, alphabetical
    pub subdomains: BTreeMap<String, usize>,
}

impl Report {
    /// Renders the plain-text form of the report
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "Unique pages: {}", self.unique_pages_count);
        let _ = writeln!(out, "Longest page: {}", self.longest_page.url);
        let _ = writeln!(
            out,
            "Longest page word count: {}\n",
            self.longest_page.word_count
        );

        let _ = writeln!(out, "Top {} words (stop words removed):", self.top_words.len());
        for entry in &self.top_words {
            let _ = writeln!(out, "{}\t{}", entry.word, entry.count);
        }

        let _ = writeln!(
            out,
            "\nSubdomains ({} total, alphabetical) with unique page counts:",
            self.subdomains.len()
        );
        for (subdomain, count) in &self.subdomains {
            let _ = writeln!(out, "{}, {}", subdomain, count);
        }
        out
    }

    /// Writes the JSON and text reports, creating parent directories
    ///
    /// # Arguments
    ///
    /// * `json_path` - Destination of the JSON report
    /// * `text_path` - Destination of the plain-text report
    pub fn write(&self, json_path: &Path, text_path: &Path) -> OutputResult<()> {
        for path in [json_path, text_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(json_path, serde_json::to_string_pretty(self)?)?;
        fs::write(text_path, self.to_text())?;

        tracing::info!(
            "Report written to {} and {}",
            json_path.display(),
            text_path.display()
        );
        Ok(())
    }
}

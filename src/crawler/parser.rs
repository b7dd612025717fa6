//! HTML parser for extracting links and page text
//!
//! This module handles parsing fetched pages to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - The visible text of the main content, for analytics

use crate::crawler::fetcher::Response;
use crate::url::NormalizedUrl;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Elements whose contents are never page text
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "form", "meta", "link", "header", "footer",
    "nav", "aside",
];

/// Containers that usually hold the main content, most specific first
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "#content",
    "#main",
    ".content",
    ".entry-content",
    ".post-content",
    ".page-content",
    ".site-content",
];

/// Class or id values that mark navigation and other boilerplate
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(menu|nav|footer|header|sidebar|breadcrumb|cookie|popup)").unwrap()
});

/// Errors raised while extracting from a response
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Response is not HTML: {0}")]
    NotHtml(String),

    #[error("Response body is empty")]
    EmptyBody,
}

/// Links and text taken from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub links: Vec<String>,
    pub text: String,
}

/// Extraction collaborator used by workers
pub trait Extractor: Send + Sync {
    /// Returns absolute hyperlinks found on the page, fragments removed
    fn extract_links(
        &self,
        url: &NormalizedUrl,
        response: &Response,
    ) -> Result<Vec<String>, ExtractError>;

    /// Returns the visible text of the page with whitespace collapsed
    fn extract_text(&self, response: &Response) -> Result<String, ExtractError>;

    /// Returns both links and text; implementations that parse should do so once
    fn extract_page(
        &self,
        url: &NormalizedUrl,
        response: &Response,
    ) -> Result<ExtractedPage, ExtractError> {
        Ok(ExtractedPage {
            links: self.extract_links(url, response)?,
            text: self.extract_text(response)?,
        })
    }
}

/// Default extractor backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse(response: &Response) -> Result<Html, ExtractError> {
        if !response.is_html() {
            return Err(ExtractError::NotHtml(response.content_type()));
        }
        if response.content.is_empty() {
            return Err(ExtractError::EmptyBody);
        }
        Ok(Html::parse_document(&response.text()))
    }
}

impl Extractor for HtmlExtractor {
    fn extract_links(
        &self,
        _url: &NormalizedUrl,
        response: &Response,
    ) -> Result<Vec<String>, ExtractError> {
        let document = Self::parse(response)?;
        // Relative links resolve against where the redirects ended up
        Ok(extract_links(&document, &response.final_url))
    }

    fn extract_text(&self, response: &Response) -> Result<String, ExtractError> {
        let document = Self::parse(response)?;
        Ok(extract_text(&document))
    }

    fn extract_page(
        &self,
        _url: &NormalizedUrl,
        response: &Response,
    ) -> Result<ExtractedPage, ExtractError> {
        let document = Self::parse(response)?;
        Ok(ExtractedPage {
            links: extract_links(&document, &response.final_url),
            text: extract_text(&document),
        })
    }
}

/// Parses HTML and returns the links it contains
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Example
///
/// ```
/// use polite_frontier::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://www.ics.uci.edu/").unwrap();
/// assert_eq!(parse_links(html, &base_url), vec!["https://www.ics.uci.edu/page"]);
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Vec<String> {
    extract_links(&Html::parse_document(html), base_url)
}

/// Parses HTML and returns the visible text of its main content
pub fn parse_text(html: &str) -> String {
    extract_text(&Html::parse_document(html))
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL without its fragment
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Extracts the main content text, skipping boilerplate elements
fn extract_text(document: &Html) -> String {
    let root = main_container(document);
    let mut chunks = Vec::new();
    collect_text(root, &mut chunks);
    chunks
        .iter()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main_container(document: &Html) -> ElementRef<'_> {
    MAIN_SELECTORS
        .iter()
        .chain(["body"].iter())
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push(&**text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_boilerplate(&child) {
                collect_text(child, out);
            }
        }
    }
}

fn is_boilerplate(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if EXCLUDED_TAGS.contains(&value.name()) {
        return true;
    }
    value.id().is_some_and(|id| BOILERPLATE.is_match(id))
        || value
            .attr("class")
            .is_some_and(|class| BOILERPLATE.is_match(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize_url;
    use std::collections::HashMap;

    fn base_url() -> Url {
        Url::parse("https://www.ics.uci.edu/dir/page").unwrap()
    }

    fn html_response(body: &str) -> Response {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        Response {
            status: 200,
            final_url: base_url(),
            headers,
            content: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        assert_eq!(parse_links(html, &base_url()), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<html><body><a href="/other">A</a><a href="sibling">B</a></body></html>"#;
        assert_eq!(
            parse_links(html, &base_url()),
            vec![
                "https://www.ics.uci.edu/other",
                "https://www.ics.uci.edu/dir/sibling"
            ]
        );
    }

    #[test]
    fn test_fragment_removed() {
        let html = r#"<html><body><a href="/page#section-2">Link</a></body></html>"#;
        assert_eq!(parse_links(html, &base_url()), vec!["https://www.ics.uci.edu/page"]);
    }

    #[test]
    fn test_skip_non_navigational_links() {
        let html = r##"
            <html><body>
                <a href="javascript:void(0)">JS</a>
                <a href="JavaScript:alert(1)">JS</a>
                <a href="mailto:test@uci.edu">Email</a>
                <a href="tel:+1234567890">Call</a>
                <a href="data:text/html,<h1>x</h1>">Data</a>
                <a href="#section">Jump</a>
                <a href="ftp://files.ics.uci.edu/">FTP</a>
                <a href="/file.pdf" download>Download</a>
                <a href="   ">Blank</a>
            </body></html>
        "##;
        assert!(parse_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://www.ics.uci.edu/canonical" /></head><body></body></html>"#;
        assert!(parse_links(html, &base_url()).contains(&"https://www.ics.uci.edu/canonical".to_string()));
    }

    #[test]
    fn test_text_prefers_main_container() {
        let html = r#"
            <html><body>
                <div class="site-menu">Home About Contact</div>
                <main>
                    <h1>Research   Groups</h1>
                    <p>Machine learning and <b>vision</b>.</p>
                    <script>var x = 1;</script>
                    <nav>Previous Next</nav>
                </main>
                <footer>Copyright</footer>
            </body></html>
        "#;
        assert_eq!(parse_text(html), "Research Groups Machine learning and vision .");
    }

    #[test]
    fn test_text_skips_boilerplate_class_and_id() {
        let html = r#"
            <html><body>
                <div id="breadcrumb">Home / People</div>
                <div class="cookie-popup">We use cookies</div>
                <p>Faculty directory</p>
            </body></html>
        "#;
        assert_eq!(parse_text(html), "Faculty directory");
    }

    #[test]
    fn test_extractor_rejects_non_html() {
        let mut response = html_response("%PDF-1.4");
        response
            .headers
            .insert("content-type".to_string(), "application/pdf".to_string());
        let url = normalize_url("https://www.ics.uci.edu/dir/page").unwrap();

        let extractor = HtmlExtractor::new();
        assert!(matches!(
            extractor.extract_links(&url, &response),
            Err(ExtractError::NotHtml(_))
        ));
        assert!(extractor.extract_text(&response).is_err());
    }

    #[test]
    fn test_extractor_uses_final_url() {
        let mut response = html_response(r#"<a href="next">Next</a>"#);
        response.final_url = Url::parse("https://www.ics.uci.edu/moved/here").unwrap();
        let url = normalize_url("https://www.ics.uci.edu/dir/page").unwrap();

        let links = HtmlExtractor::new().extract_links(&url, &response).unwrap();
        assert_eq!(links, vec!["https://www.ics.uci.edu/moved/next"]);
    }

    #[test]
    fn test_extract_page_returns_links_and_text() {
        let response = html_response(
            r#"<html><body><nav><a href="/home">Home</a></nav>
               <main><p>Lab   news</p><a href="item#top">Item</a></main></body></html>"#,
        );
        let url = normalize_url("https://www.ics.uci.edu/dir/page").unwrap();

        let page = HtmlExtractor::new().extract_page(&url, &response).unwrap();
        assert_eq!(
            page.links,
            vec!["https://www.ics.uci.edu/home", "https://www.ics.uci.edu/dir/item"]
        );
        assert_eq!(page.text, "Lab news Item");
    }

    #[test]
    fn test_extract_page_rejects_empty_body() {
        let response = html_response("");
        let url = normalize_url("https://www.ics.uci.edu/dir/page").unwrap();

        assert!(matches!(
            HtmlExtractor::new().extract_page(&url, &response),
            Err(ExtractError::EmptyBody)
        ));
    }
}

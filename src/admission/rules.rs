//! The individual admission stages
//!
//! Each stage inspects a parsed [`Candidate`] and either lets it through or
//! names the reason it was rejected. Stages never perform I/O.

use crate::admission::{AdmissionFilter, Rejection};
use crate::url::matches_domain;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::{form_urlencoded, Url};

/// A path segment that is itself a month or a day (`2023-05`, `2023-05-17`)
static DATE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}(-\d{2})?$").unwrap());

/// A year and month anywhere in the path (`2023-05`, `2023/05`)
static DATE_IN_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}[-/]\d{2}").unwrap());

/// A stage of the filter
pub(crate) type Stage = fn(&AdmissionFilter, &Candidate<'_>) -> Result<(), Rejection>;

/// Stages in evaluation order; the first failure wins
pub(crate) const STAGES: &[Stage] = &[
    check_domain,
    check_query,
    check_path,
    check_extension,
    check_structure,
];

/// A query key rule: an exact key or a key prefix
///
/// Patterns containing an uppercase letter match case-sensitively, so `C`
/// catches Apache's `?C=N` sort links without touching `?c=ml`.
#[derive(Debug, Clone)]
pub(crate) struct KeyRule {
    pattern: String,
    prefix: bool,
    case_sensitive: bool,
}

impl KeyRule {
    pub(crate) fn parse(pattern: &str) -> Self {
        let case_sensitive = pattern.chars().any(|c| c.is_uppercase());
        let (pattern, prefix) = match pattern.strip_suffix('*') {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };
        Self {
            pattern: if case_sensitive {
                pattern.to_string()
            } else {
                pattern.to_lowercase()
            },
            prefix,
            case_sensitive,
        }
    }

    fn matches(&self, key: &str) -> bool {
        let lowered;
        let key = if self.case_sensitive {
            key
        } else {
            lowered = key.to_lowercase();
            &lowered
        };

        if self.prefix {
            key.starts_with(self.pattern.as_str())
        } else {
            key == self.pattern
        }
    }
}

/// A URL broken into the parts the stages look at
pub(crate) struct Candidate<'a> {
    raw: &'a str,
    host: String,
    /// Path as written, used for the segment checks
    path: String,
    path_lower: String,
    /// Decoded query pairs, keys as written and values lowercase
    query_pairs: Vec<(String, String)>,
    query_lower: String,
}

impl<'a> Candidate<'a> {
    /// Parses a candidate, rejecting anything that is not an http(s) URL with a host
    pub(crate) fn parse(raw: &'a str) -> Result<Self, Rejection> {
        let url = Url::parse(raw.trim()).map_err(|e| Rejection::Unparsable(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Rejection::Scheme(url.scheme().to_string()));
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_lowercase(),
            _ => return Err(Rejection::MissingHost),
        };

        let query = url.query().unwrap_or_default();
        let query_pairs = query
            .split(';')
            .flat_map(|chunk| form_urlencoded::parse(chunk.as_bytes()))
            .map(|(k, v)| (k.into_owned(), v.to_lowercase()))
            .collect();

        Ok(Self {
            raw,
            host,
            path: url.path().to_string(),
            path_lower: url.path().to_lowercase(),
            query_pairs,
            query_lower: query.to_lowercase(),
        })
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

fn check_domain(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> Result<(), Rejection> {
    if !filter
        .allowed_domains
        .iter()
        .any(|pattern| matches_domain(pattern, &candidate.host))
    {
        return Err(Rejection::DomainNotAllowed(candidate.host.clone()));
    }

    if let Some(pattern) = filter
        .denied_domains
        .iter()
        .find(|pattern| matches_domain(pattern, &candidate.host))
    {
        return Err(Rejection::DomainDenied(pattern.clone()));
    }

    Ok(())
}

fn check_query(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> Result<(), Rejection> {
    if candidate.query_lower.is_empty() {
        return Ok(());
    }

    for (key, value) in &candidate.query_pairs {
        if filter.trap_keys.iter().any(|rule| rule.matches(key)) {
            return Err(Rejection::QueryTrap(key.clone()));
        }
        let key = key.to_lowercase();
        if filter
            .trap_pairs
            .iter()
            .any(|(trap_key, trap_value)| *trap_key == key && trap_value == value)
        {
            return Err(Rejection::QueryTrap(format!("{}={}", key, value)));
        }
    }

    if let Some(needle) = filter
        .trap_substrings
        .iter()
        .find(|needle| candidate.query_lower.contains(needle.as_str()))
    {
        return Err(Rejection::QueryTrap(needle.clone()));
    }

    Ok(())
}

fn check_path(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> Result<(), Rejection> {
    if let Some(segment) = candidate
        .path_lower
        .split('/')
        .find(|segment| filter.denied_segments.contains(*segment))
    {
        return Err(Rejection::PathDenied(segment.to_string()));
    }

    if let Some(needle) = filter
        .denied_substrings
        .iter()
        .find(|needle| candidate.path_lower.contains(needle.as_str()))
    {
        return Err(Rejection::PathDenied(needle.clone()));
    }

    if let Some(pattern) = filter
        .denied_patterns
        .iter()
        .find(|pattern| pattern.is_match(&candidate.path_lower))
    {
        return Err(Rejection::PathDenied(pattern.as_str().to_string()));
    }

    Ok(())
}

fn check_extension(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> Result<(), Rejection> {
    let last = candidate
        .path_lower
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default();

    match last.rsplit_once('.') {
        Some((_, ext)) if filter.denied_extensions.contains(ext) => {
            Err(Rejection::Extension(ext.to_string()))
        }
        _ => Ok(()),
    }
}

fn check_structure(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> Result<(), Rejection> {
    if is_calendar(filter, candidate) {
        return Err(Rejection::Calendar);
    }

    let mut seen = HashSet::new();
    let mut depth = 0;
    for segment in candidate.segments() {
        if !seen.insert(segment) {
            return Err(Rejection::RepeatedSegment(segment.to_string()));
        }
        depth += 1;
    }

    let length = candidate.raw.chars().count();
    if length > filter.max_url_length {
        return Err(Rejection::TooLong(length));
    }

    if depth > filter.max_path_depth {
        return Err(Rejection::TooDeep(depth));
    }

    if let Some(pattern) = filter
        .auth_patterns
        .iter()
        .find(|pattern| candidate.path_lower.contains(pattern.as_str()))
    {
        return Err(Rejection::AuthPage(pattern.clone()));
    }

    Ok(())
}

/// Calendars are unbounded: a date segment, or a calendar word next to a date
fn is_calendar(filter: &AdmissionFilter, candidate: &Candidate<'_>) -> bool {
    if candidate
        .segments()
        .any(|segment| DATE_SEGMENT.is_match(segment))
    {
        return true;
    }

    filter
        .calendar_keywords
        .iter()
        .any(|keyword| candidate.path_lower.contains(keyword.as_str()))
        && DATE_IN_PATH.is_match(&candidate.path)
}

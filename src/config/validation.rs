use crate::config::types::{
    AdmissionConfig, Config, CrawlerConfig, ReportConfig, StorageConfig, UserAgentConfig,
    MAX_POLITENESS_DELAY,
};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_admission_config(&config.admission)?;
    validate_report_config(&config.report)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.threads < 1 || config.threads > 256 {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and 256, got {}",
            config.threads
        )));
    }

    if !(0.0..=MAX_POLITENESS_DELAY).contains(&config.politeness_delay) {
        return Err(ConfigError::Validation(format!(
            "politeness_delay must be between 0 and {} seconds, got {}",
            MAX_POLITENESS_DELAY, config.politeness_delay
        )));
    }

    if config.poll_interval_ms < 1 || config.poll_interval_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 1 and 10000, got {}",
            config.poll_interval_ms
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request_timeout must be at least 1 second".to_string(),
        ));
    }

    if config.seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    for seed in &config.seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.save_file.is_empty() {
        return Err(ConfigError::Validation(
            "save_file cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates admission rules: domain patterns, regexes and limits
fn validate_admission_config(config: &AdmissionConfig) -> Result<(), ConfigError> {
    if config.allowed_domains.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_domains must name at least one domain".to_string(),
        ));
    }

    for pattern in &config.allowed_domains {
        validate_domain_pattern(pattern, false)?;
    }

    for pattern in &config.denied_domains {
        validate_domain_pattern(pattern, true)?;
    }

    for pattern in &config.denied_path_patterns {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid path pattern '{}': {}", pattern, e))
        })?;
    }

    for pair in &config.trap_query_pairs {
        if !pair.contains('=') {
            return Err(ConfigError::InvalidPattern(format!(
                "Trap query pair '{}' must have the form key=value",
                pair
            )));
        }
    }

    if config
        .denied_extensions
        .iter()
        .any(|ext| ext.trim_start_matches('.').is_empty())
    {
        return Err(ConfigError::InvalidPattern(
            "denied_extensions cannot contain empty entries".to_string(),
        ));
    }

    if config.max_url_length < 16 {
        return Err(ConfigError::Validation(format!(
            "max_url_length must be at least 16, got {}",
            config.max_url_length
        )));
    }

    if config.max_path_depth < 1 {
        return Err(ConfigError::Validation(
            "max_path_depth must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_report_config(config: &ReportConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() || config.text_path.is_empty() {
        return Err(ConfigError::Validation(
            "report paths cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates a domain pattern (`*.x`, `.x`, `x`, or a bare label when allowed)
fn validate_domain_pattern(pattern: &str, allow_label: bool) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern
        .strip_prefix("*.")
        .or_else(|| pattern.strip_prefix('.'))
        .unwrap_or(pattern);

    validate_domain_string(domain, allow_label && domain.len() == pattern.len())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str, allow_label: bool) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !allow_label && !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid email format: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.crawler.seeds = vec!["https://www.ics.uci.edu".to_string()];
        config
    }

    #[test]
    fn test_default_config_with_seed_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com", false).is_ok());
        assert!(validate_domain_pattern("*.example.com", false).is_ok());
        assert!(validate_domain_pattern(".ics.uci.edu", false).is_ok());
        assert!(validate_domain_pattern("gitlab", true).is_ok());

        assert!(validate_domain_pattern("", false).is_err());
        assert!(validate_domain_pattern("*.", false).is_err());
        assert!(validate_domain_pattern("example", false).is_err());
        assert!(validate_domain_pattern("*.gitlab", true).is_err());
        assert!(validate_domain_pattern("example.com.", false).is_err());
        assert!(validate_domain_pattern("exa mple.com", false).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_rejects_missing_seeds() {
        let mut config = valid_config();
        config.crawler.seeds.clear();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_non_http_seed() {
        let mut config = valid_config();
        config.crawler.seeds = vec!["ftp://files.ics.uci.edu/".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_rejects_bad_politeness() {
        let mut config = valid_config();
        config.crawler.politeness_delay = -1.0;
        assert!(validate(&config).is_err());

        config.crawler.politeness_delay = f64::NAN;
        assert!(validate(&config).is_err());

        config.crawler.politeness_delay = f64::INFINITY;
        assert!(validate(&config).is_err());

        config.crawler.politeness_delay = 1e20;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.politeness_delay = MAX_POLITENESS_DELAY;
        assert!(validate(&config).is_ok());

        config.crawler.politeness_delay = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_regex() {
        let mut config = valid_config();
        config.admission.denied_path_patterns = vec!["(unclosed".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_query_pair() {
        let mut config = valid_config();
        config.admission.trap_query_pairs = vec!["do".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_rejects_empty_allow_list() {
        let mut config = valid_config();
        config.admission.allowed_domains.clear();
        assert!(validate(&config).is_err());
    }
}

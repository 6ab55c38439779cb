use crate::config::types::Config;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates a parsed configuration
///
/// Rejects values the crawler cannot run with. A malformed community URL
/// template is deliberately NOT rejected here: that community is skipped at
/// discovery time so one bad entry never blocks the rest of the run.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.crawler.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-attempts must be at least 1".to_string(),
        ));
    }

    if config.crawler.save_every == 0 {
        return Err(ConfigError::Validation(
            "crawler.save-every must be at least 1".to_string(),
        ));
    }

    if config.crawler.retry_delay_min_ms > config.crawler.retry_delay_max_ms {
        return Err(ConfigError::Validation(
            "crawler.retry-delay-min-ms must not exceed retry-delay-max-ms".to_string(),
        ));
    }

    if config.crawler.request_delay_min_ms > config.crawler.request_delay_max_ms {
        return Err(ConfigError::Validation(
            "crawler.request-delay-min-ms must not exceed request-delay-max-ms".to_string(),
        ));
    }

    if Url::parse(&config.site.base_url).is_err() {
        return Err(ConfigError::Validation(format!(
            "site.base-url is not a valid URL: {}",
            config.site.base_url
        )));
    }

    if config.output.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output.data-dir must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for community in &config.communities {
        if community.name.is_empty() {
            return Err(ConfigError::Validation(
                "community name must not be empty".to_string(),
            ));
        }
        if !seen.insert(community.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate community name: {}",
                community.name
            )));
        }
        if community.total_pages == 0 {
            return Err(ConfigError::Validation(format!(
                "community {} must have total-pages of at least 1",
                community.name
            )));
        }
    }

    Ok(())
}

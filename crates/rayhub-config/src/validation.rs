// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::RayhubConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &RayhubConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    let urls = [
        ("gateway.public_base_url", &config.gateway.public_base_url),
        ("telegram.api_url", &config.telegram.api_url),
        (
            "webhooks.project_initiated_url",
            &config.webhooks.project_initiated_url,
        ),
        ("webhooks.proposal_ses_url", &config.webhooks.proposal_ses_url),
        ("webhooks.proposal_uze_url", &config.webhooks.proposal_uze_url),
    ];
    for (key, value) in urls {
        if let Some(url) = value
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must be an http(s) URL"),
            });
        }
    }

    if config.webhooks.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "webhooks.timeout_secs must be at least 1".to_string(),
        });
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "telegram.bot_token must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RayhubConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = RayhubConfig::default();
        config.service.log_level = "loud".into();
        config.storage.database_path = "  ".into();
        config.webhooks.timeout_secs = 0;
        config.webhooks.proposal_ses_url = Some("ftp://example.com".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_bad_host() {
        let mut config = RayhubConfig::default();
        config.gateway.host = "bad host!".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("gateway.host"));
    }

    #[test]
    fn rejects_blank_bot_token() {
        let mut config = RayhubConfig::default();
        config.telegram.bot_token = Some(" ".into());
        assert!(validate_config(&config).is_err());
    }
}

// SPDX-FileCopyrightText: 2026 Rayhub Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./rayhub.toml` > `~/.config/rayhub/rayhub.toml` > `/etc/rayhub/rayhub.toml`
//! with environment variable overrides via `RAYHUB_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RayhubConfig;

/// Config sections, in the order their env prefixes are tried.
const SECTIONS: &[&str] = &["service", "storage", "gateway", "telegram", "webhooks", "crm"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rayhub/rayhub.toml` (system-wide)
/// 3. `~/.config/rayhub/rayhub.toml` (user XDG config)
/// 4. `./rayhub.toml` (local directory)
/// 5. `RAYHUB_*` environment variables
pub fn load_config() -> Result<RayhubConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RayhubConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RayhubConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RayhubConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RayhubConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RayhubConfig::default()))
        .merge(Toml::file("/etc/rayhub/rayhub.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("rayhub/rayhub.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("rayhub.toml"))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `telegram_bot_token` maps to `telegram.bot_token`.
pub fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain
/// underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("RAYHUB_").map(|key| env_key_to_path(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(env_key_to_path("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(
            env_key_to_path("webhooks_proposal_ses_url"),
            "webhooks.proposal_ses_url"
        );
        assert_eq!(env_key_to_path("crm_sales_team_id"), "crm.sales_team_id");
        assert_eq!(env_key_to_path("storage_database_path"), "storage.database_path");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(env_key_to_path("unrelated"), "unrelated");
    }
}

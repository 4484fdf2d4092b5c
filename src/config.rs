// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration document model: one YAML file (or a directory of them) is
//! parsed into a [`RawConfig`] per file, then folded into a single validated
//! [`Config`].
//!
//! Later files never override earlier ones — providers, sources,
//! `exclude_domains` and `static_rewrites` are additive; `settings` fields
//! are filled in by the first file that sets them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::adapters::proxy::{ProxyInstance, Zone};
use crate::constants::{
    CONFIG_FILE_EXTENSION, CONFIG_TEMPLATE_SUFFIX, DEFAULT_POLL_INTERVAL_SECS,
    PROVIDER_TYPE_ADGUARD, SOURCE_TYPE_TRAEFIK,
};
use crate::errors::ConfigError;

/// `settings.sync_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Once,
    Watch,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawSettings {
    sync_mode: Option<SyncMode>,
    poll_interval: Option<u64>,
    log_level: Option<String>,
    default_zone: Option<Zone>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDnsProvider {
    name: String,
    provider: String,
    url: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSource {
    name: String,
    #[serde(rename = "type")]
    source_type: String,
    url: String,
    target_ip: String,
    #[serde(default = "default_true")]
    verify_tls: bool,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    router_filter: String,
    #[serde(default)]
    middleware_filter: String,
}

fn default_true() -> bool {
    true
}

/// One config file's contents, as parsed directly from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    providers: Vec<RawDnsProvider>,
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default)]
    settings: RawSettings,
    #[serde(default)]
    exclude_domains: Vec<String>,
    #[serde(default)]
    static_rewrites: BTreeMap<String, String>,
}

/// A validated, merged DNS provider entry.
#[derive(Debug, Clone)]
pub struct DnsProviderConfig {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// The fully merged and validated configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct Config {
    pub providers: Vec<DnsProviderConfig>,
    pub sources: Vec<ProxyInstance>,
    pub sync_mode: SyncMode,
    pub poll_interval_secs: u64,
    pub log_level: Option<String>,
    pub default_zone: Zone,
    pub exclude_domains: Vec<String>,
    pub static_rewrites: BTreeMap<String, String>,
}

impl Config {
    /// Load and merge every config file found at `path` (a single file, or
    /// a directory scanned per [`find_config_files`]).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let files = if path.is_dir() {
            find_config_files(path)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(ConfigError::PathNotFound {
                path: path.display().to_string(),
            });
        };

        let mut merged = RawConfig::default();
        for file in &files {
            let text = std::fs::read_to_string(file).map_err(|e| ConfigError::Parse {
                path: file.display().to_string(),
                reason: e.to_string(),
            })?;
            let raw: RawConfig = serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
                path: file.display().to_string(),
                reason: e.to_string(),
            })?;
            merged.providers.extend(raw.providers);
            merged.sources.extend(raw.sources);
            merged.exclude_domains.extend(raw.exclude_domains);
            for (domain, answer) in raw.static_rewrites {
                merged.static_rewrites.entry(domain).or_insert(answer);
            }
            if merged.settings.sync_mode.is_none() {
                merged.settings.sync_mode = raw.settings.sync_mode;
            }
            if merged.settings.poll_interval.is_none() {
                merged.settings.poll_interval = raw.settings.poll_interval;
            }
            if merged.settings.log_level.is_none() {
                merged.settings.log_level = raw.settings.log_level;
            }
            if merged.settings.default_zone.is_none() {
                merged.settings.default_zone = raw.settings.default_zone;
            }
        }

        Self::from_raw(merged)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut providers = Vec::with_capacity(raw.providers.len());
        for p in raw.providers {
            if p.provider != PROVIDER_TYPE_ADGUARD {
                return Err(ConfigError::UnknownProviderType {
                    kind: "DNS provider",
                    type_tag: p.provider,
                });
            }
            providers.push(DnsProviderConfig {
                name: p.name,
                url: p.url,
                username: p.username,
                password: p.password,
            });
        }

        let default_zone = raw.settings.default_zone.unwrap_or(Zone::Internal);

        let mut sources = Vec::with_capacity(raw.sources.len());
        for s in raw.sources {
            if s.source_type != SOURCE_TYPE_TRAEFIK {
                return Err(ConfigError::UnknownProviderType {
                    kind: "proxy source",
                    type_tag: s.source_type,
                });
            }
            sources.push(ProxyInstance {
                name: s.name,
                url: s.url,
                target_ip: s.target_ip,
                username: s.username,
                password: s.password,
                verify_tls: s.verify_tls,
                router_filter: s.router_filter,
                middleware_filter: s.middleware_filter,
                default_zone: Some(default_zone),
            });
        }

        if providers.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "no DNS provider configured".to_string(),
            });
        }
        if sources.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "no proxy source configured".to_string(),
            });
        }

        Ok(Self {
            providers,
            sources,
            sync_mode: raw.settings.sync_mode.unwrap_or(SyncMode::Watch),
            poll_interval_secs: raw.settings.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            log_level: raw.settings.log_level,
            default_zone,
            exclude_domains: raw.exclude_domains,
            static_rewrites: raw.static_rewrites,
        })
    }
}

/// Scan a directory for `*.yaml` files, excluding `*.yaml.template`, sorted
/// alphabetically so merge order is deterministic.
pub fn find_config_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Parse {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(CONFIG_FILE_EXTENSION)
                && !path
                    .to_string_lossy()
                    .ends_with(CONFIG_TEMPLATE_SUFFIX)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

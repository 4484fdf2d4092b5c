// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! AdGuard Home DNS provider: rewrites managed through its `/control/rewrite/*`
//! HTTP API.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsync::adapters::dns::adguard::AdGuardDnsProvider;
//! use dnsync::adapters::dns::DnsProvider;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = AdGuardDnsProvider::new(
//!     "core".to_string(),
//!     "http://adguard.local".to_string(),
//!     Some("admin".to_string()),
//!     Some("secret".to_string()),
//! )?;
//! let alive = provider.test_connection().await;
//! # let _ = alive;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{DnsProvider, DnsRecord};
use crate::constants::HTTP_TIMEOUT;
use crate::errors::DnsError;
use crate::retry::with_default_backoff;

#[derive(Debug, Serialize)]
struct RewriteEntry<'a> {
    domain: &'a str,
    answer: &'a str,
}

#[derive(Debug, Deserialize)]
struct RawRewrite {
    #[serde(default)]
    domain: Option<serde_json::Value>,
    #[serde(default)]
    answer: Option<serde_json::Value>,
}

/// AdGuard Home DNS provider.
pub struct AdGuardDnsProvider {
    name: String,
    url: String,
    username: Option<String>,
    password: Option<String>,
    client: Client,
}

impl AdGuardDnsProvider {
    /// Build a provider for the AdGuard instance at `url`.
    ///
    /// Trailing slashes on `url` are stripped so endpoint construction below
    /// never produces a doubled `//control/...` path.
    pub fn new(
        name: String,
        url: String,
        username: Option<String>,
        password: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            name,
            url: url.trim_end_matches('/').to_string(),
            username,
            password,
            client,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.username, &self.password) {
            (Some(u), p) => builder.basic_auth(u, p.as_deref()),
            _ => builder,
        }
    }

    fn classify(&self, err: &reqwest::Error) -> DnsError {
        if let Some(status) = err.status() {
            if crate::retry::is_retryable_http_status(status) {
                DnsError::Transient {
                    provider: self.name.clone(),
                    reason: format!("HTTP {status}"),
                }
            } else {
                DnsError::Permanent {
                    provider: self.name.clone(),
                    reason: format!("HTTP {status}"),
                }
            }
        } else {
            DnsError::Transient {
                provider: self.name.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DnsProvider for AdGuardDnsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn test_connection(&self) -> bool {
        let result = with_default_backoff("adguard test_connection", || async {
            let resp = self
                .request(self.client.get(format!("{}/control/status", self.url)))
                .send()
                .await
                .map_err(|e| self.classify(&e))?;
            resp.error_for_status().map_err(|e| self.classify(&e))?;
            Ok::<(), DnsError>(())
        })
        .await;
        result.is_ok()
    }

    async fn list(&self) -> Result<Vec<DnsRecord>, DnsError> {
        let raw: Vec<RawRewrite> = with_default_backoff("adguard list", || async {
            let resp = self
                .request(self.client.get(format!("{}/control/rewrite/list", self.url)))
                .send()
                .await
                .map_err(|e| self.classify(&e))?;
            let resp = resp.error_for_status().map_err(|e| self.classify(&e))?;
            resp.json::<Vec<RawRewrite>>()
                .await
                .map_err(|e| DnsError::Permanent {
                    provider: self.name.clone(),
                    reason: format!("malformed rewrite list: {e}"),
                })
        })
        .await?;

        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            match (entry.domain, entry.answer) {
                (Some(serde_json::Value::String(d)), Some(serde_json::Value::String(a)))
                    if !d.is_empty() && !a.is_empty() =>
                {
                    records.push(DnsRecord::new(d, a));
                }
                other => {
                    warn!(provider = %self.name, entry = ?other, "dropping malformed rewrite entry");
                }
            }
        }
        Ok(records)
    }

    async fn add(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        with_default_backoff("adguard add", || async {
            let resp = self
                .request(self.client.post(format!("{}/control/rewrite/add", self.url)))
                .json(&RewriteEntry { domain, answer })
                .send()
                .await
                .map_err(|e| self.classify(&e))?;
            // AdGuard rejects a duplicate add with 409 Conflict; the adapter
            // contract is idempotent from the caller's point of view, so a
            // duplicate rejection still leaves the record present.
            match resp.error_for_status() {
                Ok(_) => Ok(()),
                Err(e) if e.status() == Some(reqwest::StatusCode::CONFLICT) => Ok(()),
                Err(e) => Err(self.classify(&e)),
            }
        })
        .await
    }

    async fn delete(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        with_default_backoff("adguard delete", || async {
            let resp = self
                .request(self.client.post(format!("{}/control/rewrite/delete", self.url)))
                .json(&RewriteEntry { domain, answer })
                .send()
                .await
                .map_err(|e| self.classify(&e))?;
            // AdGuard returns 404 for an already-absent rewrite; the adapter
            // contract treats that as success (at-least-once delete).
            match resp.error_for_status() {
                Ok(_) => Ok(()),
                Err(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND) => Ok(()),
                Err(e) => Err(self.classify(&e)),
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "adguard_tests.rs"]
mod adguard_tests;

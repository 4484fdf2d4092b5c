// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Traefik proxy provider: discovers routes from the `/api/http/routers`
//! endpoint of Traefik's API/dashboard.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;

use super::{ProxyInstance, ProxyProvider, ProxyRoute, Zone};
use crate::constants::HTTP_TIMEOUT;
use crate::errors::ProxyError;
use crate::patterns::glob_matches;
use crate::retry::with_default_backoff;

static HOST_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Host\(\s*[`"']([^`"']+)[`"']\s*\)"#).expect("static regex is valid"));

#[derive(Debug, Deserialize)]
struct RawRouter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rule: Option<String>,
    #[serde(default)]
    middlewares: Vec<String>,
}

/// Traefik proxy provider, polling each configured instance's router API.
///
/// Two clients are kept rather than one per instance: `verify_tls` is the
/// only thing that varies per-instance at the transport layer, so every
/// instance shares whichever of the two matches its setting.
pub struct TraefikProxyProvider {
    instances: Vec<ProxyInstance>,
    verifying_client: Client,
    insecure_client: Client,
}

impl TraefikProxyProvider {
    #[must_use]
    pub fn new(instances: Vec<ProxyInstance>) -> anyhow::Result<Self> {
        Ok(Self {
            instances,
            verifying_client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            insecure_client: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .danger_accept_invalid_certs(true)
                .build()?,
        })
    }

    fn client_for(&self, instance: &ProxyInstance) -> &Client {
        if instance.verify_tls {
            &self.verifying_client
        } else {
            &self.insecure_client
        }
    }

    fn request(&self, instance: &ProxyInstance, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&instance.username, &instance.password) {
            (Some(u), p) => builder.basic_auth(u, p.as_deref()),
            _ => builder,
        }
    }

    /// Every `Host(...)` match inside a router rule, deduplicated, in
    /// first-seen order.
    fn extract_hostnames(rule: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut hostnames = Vec::new();
        for c in HOST_RULE.captures_iter(rule) {
            let hostname = c[1].to_string();
            if seen.insert(hostname.clone()) {
                hostnames.push(hostname);
            }
        }
        hostnames
    }

    fn base_name(name: &str) -> &str {
        name.split('@').next().unwrap_or(name)
    }

    fn detect_zone(name: &str, default_zone: Zone) -> Zone {
        let base = Self::base_name(name).to_ascii_lowercase();
        if base.ends_with("-internal") {
            Zone::Internal
        } else if base.ends_with("-external") {
            Zone::External
        } else {
            default_zone
        }
    }

    fn middleware_matches(middlewares: &[String], filter: &str) -> bool {
        if filter.is_empty() {
            return true;
        }
        middlewares
            .iter()
            .any(|m| Self::base_name(m).eq_ignore_ascii_case(filter))
    }

    fn classify(instance: &ProxyInstance, err: &reqwest::Error) -> ProxyError {
        if let Some(status) = err.status() {
            if crate::retry::is_retryable_http_status(status) {
                ProxyError::Transient {
                    instance: instance.name.clone(),
                    reason: format!("HTTP {status}"),
                }
            } else {
                ProxyError::Permanent {
                    instance: instance.name.clone(),
                    reason: format!("HTTP {status}"),
                }
            }
        } else {
            ProxyError::Transient {
                instance: instance.name.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ProxyProvider for TraefikProxyProvider {
    fn name(&self) -> &str {
        "traefik"
    }

    fn list_instances(&self) -> Vec<ProxyInstance> {
        self.instances.clone()
    }

    async fn list_routes(&self, instance: &ProxyInstance) -> Result<Vec<ProxyRoute>, ProxyError> {
        let url = format!("{}/api/http/routers", instance.url.trim_end_matches('/'));
        let body: Value = with_default_backoff("traefik list_routes", || async {
            let resp = self
                .request(instance, self.client_for(instance).get(&url))
                .send()
                .await
                .map_err(|e| Self::classify(instance, &e))?;
            let resp = resp
                .error_for_status()
                .map_err(|e| Self::classify(instance, &e))?;
            resp.json::<Value>()
                .await
                .map_err(|e| ProxyError::Permanent {
                    instance: instance.name.clone(),
                    reason: format!("malformed router list: {e}"),
                })
        })
        .await?;

        // Traefik returns a JSON array; anything else yields zero routes
        // rather than an error, matching how the discovery step treats an
        // instance with nothing configured.
        let Value::Array(entries) = body else {
            warn!(instance = %instance.name, "router API returned a non-array body");
            return Ok(Vec::new());
        };

        let default_zone = instance.default_zone.unwrap_or(Zone::Internal);
        let mut routes = Vec::new();
        for entry in entries {
            let router: RawRouter = match serde_json::from_value(entry) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let Some(name) = router.name else { continue };
            let Some(rule) = router.rule else { continue };

            if !glob_matches(&instance.router_filter, &name) {
                continue;
            }
            if !Self::middleware_matches(&router.middlewares, &instance.middleware_filter) {
                continue;
            }

            let zone = Self::detect_zone(&name, default_zone);
            for hostname in Self::extract_hostnames(&rule) {
                routes.push(ProxyRoute {
                    hostname: hostname.to_lowercase(),
                    instance_name: instance.name.clone(),
                    target_ip: instance.target_ip.clone(),
                    zone,
                    router_name: name.clone(),
                });
            }
        }
        Ok(routes)
    }
}

#[cfg(test)]
#[path = "traefik_tests.rs"]
mod traefik_tests;

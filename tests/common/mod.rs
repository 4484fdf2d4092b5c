// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory DNS/proxy fakes shared by the end-to-end reconciliation
//! scenarios in `tests/`. These mirror `reconcile::test_support`'s fakes
//! but live here since integration tests can't reach a `#[cfg(test)]`
//! module inside the library crate.
//!
//! Both fakes hold their state behind `Arc<Mutex<_>>` and are cheaply
//! `Clone`, so a test can keep one handle for inspection while handing
//! another (pointing at the same shared state) to `AppContext`, which
//! owns the trait objects outright.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dnsync::adapters::dns::{DnsProvider, DnsRecord};
use dnsync::adapters::proxy::{ProxyInstance, ProxyProvider, ProxyRoute, Zone};
use dnsync::config::{Config, DnsProviderConfig, SyncMode};
use dnsync::errors::{DnsError, ProxyError};

#[derive(Clone)]
pub struct FakeDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    calls: Arc<Mutex<Vec<String>>>,
    fail_list: Arc<Mutex<bool>>,
}

impl FakeDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(Mutex::new(false)),
        }
    }

    pub fn record_snapshot(&self) -> Vec<DnsRecord> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort();
        records
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn no_calls(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl DnsProvider for FakeDnsProvider {
    fn name(&self) -> &str {
        "fake-adguard"
    }

    async fn test_connection(&self) -> bool {
        true
    }

    async fn list(&self) -> Result<Vec<DnsRecord>, DnsError> {
        if *self.fail_list.lock().unwrap() {
            return Err(DnsError::Transient {
                provider: "fake-adguard".to_string(),
                reason: "forced failure".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn add(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        self.calls.lock().unwrap().push(format!("add {domain} {answer}"));
        let mut records = self.records.lock().unwrap();
        let record = DnsRecord::new(domain, answer);
        if !records.contains(&record) {
            records.push(record);
        }
        Ok(())
    }

    async fn delete(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        self.calls.lock().unwrap().push(format!("delete {domain} {answer}"));
        let domain = domain.to_lowercase();
        self.records
            .lock()
            .unwrap()
            .retain(|r| !(r.domain == domain && r.answer == answer));
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeProxyProvider {
    instances: Vec<ProxyInstance>,
    routes: Arc<Mutex<BTreeMap<String, Result<Vec<ProxyRoute>, ProxyError>>>>,
}

impl FakeProxyProvider {
    pub fn new(instances: Vec<ProxyInstance>) -> Self {
        Self {
            instances,
            routes: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn set_routes(&self, instance: &str, routes: Vec<ProxyRoute>) {
        self.routes.lock().unwrap().insert(instance.to_string(), Ok(routes));
    }

    pub fn set_failure(&self, instance: &str) {
        self.routes.lock().unwrap().insert(
            instance.to_string(),
            Err(ProxyError::Transient {
                instance: instance.to_string(),
                reason: "connection refused".to_string(),
            }),
        );
    }

    pub fn boxed(&self) -> Box<dyn ProxyProvider> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl ProxyProvider for FakeProxyProvider {
    fn name(&self) -> &str {
        "fake-traefik"
    }

    fn list_instances(&self) -> Vec<ProxyInstance> {
        self.instances.clone()
    }

    async fn list_routes(&self, instance: &ProxyInstance) -> Result<Vec<ProxyRoute>, ProxyError> {
        match self.routes.lock().unwrap().get(&instance.name) {
            Some(Ok(routes)) => Ok(routes.clone()),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(Vec::new()),
        }
    }
}

pub fn instance(name: &str, target_ip: &str) -> ProxyInstance {
    ProxyInstance {
        name: name.to_string(),
        url: format!("http://{name}:8080"),
        target_ip: target_ip.to_string(),
        username: None,
        password: None,
        verify_tls: true,
        router_filter: String::new(),
        middleware_filter: String::new(),
        default_zone: Some(Zone::Internal),
    }
}

pub fn route(hostname: &str, instance_name: &str, target_ip: &str, zone: Zone) -> ProxyRoute {
    ProxyRoute {
        hostname: hostname.to_string(),
        instance_name: instance_name.to_string(),
        target_ip: target_ip.to_string(),
        zone,
        router_name: format!("{hostname}-router@docker"),
    }
}

pub fn config(
    sources: Vec<ProxyInstance>,
    static_rewrites: BTreeMap<String, String>,
    exclude_domains: Vec<String>,
) -> Config {
    Config {
        providers: vec![DnsProviderConfig {
            name: "core-dns".to_string(),
            url: "http://adguard.local".to_string(),
            username: None,
            password: None,
        }],
        sources,
        sync_mode: SyncMode::Once,
        poll_interval_secs: 60,
        log_level: None,
        default_zone: Zone::Internal,
        exclude_domains,
        static_rewrites,
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes for the DNS and proxy adapters, shared by every
//! `reconcile::*` submodule's unit tests so each step can be exercised
//! without HTTP.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::dns::{DnsProvider, DnsRecord};
use crate::adapters::proxy::{ProxyInstance, ProxyProvider, ProxyRoute, Zone};
use crate::config::{Config, DnsProviderConfig, SyncMode};
use crate::errors::{DnsError, ProxyError};

pub struct FakeDnsProvider {
    pub records: Mutex<Vec<DnsRecord>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_list: bool,
}

impl FakeDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            fail_list: false,
        }
    }

    pub fn failing_list() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            fail_list: true,
        }
    }
}

#[async_trait]
impl DnsProvider for FakeDnsProvider {
    fn name(&self) -> &str {
        "fake-dns"
    }

    async fn test_connection(&self) -> bool {
        true
    }

    async fn list(&self) -> Result<Vec<DnsRecord>, DnsError> {
        if self.fail_list {
            return Err(DnsError::Transient {
                provider: "fake-dns".to_string(),
                reason: "forced failure".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn add(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("add {domain} {answer}"));
        self.records.lock().unwrap().push(DnsRecord::new(domain, answer));
        Ok(())
    }

    async fn delete(&self, domain: &str, answer: &str) -> Result<(), DnsError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete {domain} {answer}"));
        let domain = domain.to_lowercase();
        self.records
            .lock()
            .unwrap()
            .retain(|r| !(r.domain == domain && r.answer == answer));
        Ok(())
    }
}

pub struct FakeProxyProvider {
    pub instances: Vec<ProxyInstance>,
    pub routes: Mutex<BTreeMap<String, Result<Vec<ProxyRoute>, ProxyError>>>,
}

impl FakeProxyProvider {
    pub fn new(instances: Vec<ProxyInstance>) -> Self {
        Self {
            instances,
            routes: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn set_routes(&self, instance: &str, routes: Vec<ProxyRoute>) {
        self.routes
            .lock()
            .unwrap()
            .insert(instance.to_string(), Ok(routes));
    }

    pub fn set_failure(&self, instance: &str, err: ProxyError) {
        self.routes.lock().unwrap().insert(instance.to_string(), Err(err));
    }
}

#[async_trait]
impl ProxyProvider for FakeProxyProvider {
    fn name(&self) -> &str {
        "fake-proxy"
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

/// Lets a test keep an `Arc` handle to a fake provider (to mutate its
/// canned responses) while also handing a boxed trait object to the
/// `AppContext` under test.
#[async_trait]
impl<T: ProxyProvider + ?Sized> ProxyProvider for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_instances(&self) -> Vec<ProxyInstance> {
        (**self).list_instances()
    }

    async fn list_routes(&self, instance: &ProxyInstance) -> Result<Vec<ProxyRoute>, ProxyError> {
        (**self).list_routes(instance).await
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
        sources: vec![],
        sync_mode: SyncMode::Watch,
        poll_interval_secs: 60,
        log_level: None,
        default_zone: Zone::Internal,
        exclude_domains,
        static_rewrites,
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instance(url: String, router_filter: &str, middleware_filter: &str) -> ProxyInstance {
    ProxyInstance {
        name: "test".to_string(),
        url,
        target_ip: "10.0.0.1".to_string(),
        username: None,
        password: None,
        verify_tls: true,
        router_filter: router_filter.to_string(),
        middleware_filter: middleware_filter.to_string(),
        default_zone: None,
    }
}

fn provider() -> TraefikProxyProvider {
    TraefikProxyProvider::new(vec![]).unwrap()
}

async fn mock_routers(server: &MockServer, routers: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/http/routers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(routers))
        .mount(server)
        .await;
}

#[test]
fn extract_hostnames_handles_all_quote_styles() {
    assert_eq!(
        TraefikProxyProvider::extract_hostnames("Host(`example.com`)"),
        vec!["example.com"]
    );
    assert_eq!(
        TraefikProxyProvider::extract_hostnames(r#"Host("example.com")"#),
        vec!["example.com"]
    );
    assert_eq!(
        TraefikProxyProvider::extract_hostnames("Host('example.com')"),
        vec!["example.com"]
    );
}

#[test]
fn extract_hostnames_finds_multiple_hosts_in_one_rule() {
    let mut hosts =
        TraefikProxyProvider::extract_hostnames("Host(`app1.example.com`) || Host(`app2.example.com`)");
    hosts.sort();
    assert_eq!(hosts, vec!["app1.example.com", "app2.example.com"]);
}

#[test]
fn extract_hostnames_empty_rule_yields_nothing() {
    assert!(TraefikProxyProvider::extract_hostnames("").is_empty());
}

#[test]
fn extract_hostnames_dedupes_within_a_single_rule() {
    assert_eq!(
        TraefikProxyProvider::extract_hostnames("Host(`a.example.com`) || Host(`a.example.com`)"),
        vec!["a.example.com"]
    );
}

#[tokio::test]
async fn list_instances_returns_what_it_was_constructed_with() {
    let instances = vec![instance("http://traefik:8080".to_string(), "", "")];
    let provider = TraefikProxyProvider::new(instances.clone()).unwrap();
    assert_eq!(provider.list_instances().len(), instances.len());
}

#[tokio::test]
async fn list_routes_extracts_hostname_from_host_rule() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([{"name": "app@docker", "rule": "Host(`app.example.com`)"}]),
    )
    .await;

    let provider = provider();
    let instance = instance(server.uri(), "", "");
    let routes = provider.list_routes(&instance).await.unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].hostname, "app.example.com");
    assert_eq!(routes[0].instance_name, "test");
    assert_eq!(routes[0].target_ip, "10.0.0.1");
    assert_eq!(routes[0].router_name, "app@docker");
}

#[tokio::test]
async fn router_filter_wildcard_both_sides_matches_substring() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {"name": "app-internal@docker", "rule": "Host(`app.internal.example.com`)"},
            {"name": "api-internal@docker", "rule": "Host(`api.internal.example.com`)"},
            {"name": "public@docker", "rule": "Host(`public.example.com`)"},
        ]),
    )
    .await;

    let provider = provider();
    let instance = instance(server.uri(), "*-internal*", "");
    let routes = provider.list_routes(&instance).await.unwrap();

    let mut hostnames: Vec<_> = routes.iter().map(|r| r.hostname.clone()).collect();
    hostnames.sort();
    assert_eq!(
        hostnames,
        vec!["api.internal.example.com", "app.internal.example.com"]
    );
}

#[tokio::test]
async fn empty_router_filter_matches_all() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {"name": "app-internal@docker", "rule": "Host(`app.internal.example.com`)"},
            {"name": "public@docker", "rule": "Host(`public.example.com`)"},
        ]),
    )
    .await;

    let provider = provider();
    let instance = instance(server.uri(), "", "");
    let routes = provider.list_routes(&instance).await.unwrap();
    assert_eq!(routes.len(), 2);
}

#[tokio::test]
async fn middleware_filter_excludes_routers_without_middleware() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {
                "name": "app-with-auth@docker",
                "rule": "Host(`app.example.com`)",
                "middlewares": ["auth@docker", "ratelimit@docker"],
            },
            {
                "name": "public@docker",
                "rule": "Host(`public.example.com`)",
                "middlewares": ["ratelimit@docker"],
            },
            {
                "name": "noauth@docker",
                "rule": "Host(`noauth.example.com`)",
            },
        ]),
    )
    .await;

    let provider = provider();
    let instance = instance(server.uri(), "", "auth");
    let routes = provider.list_routes(&instance).await.unwrap();

    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].hostname, "app.example.com");
}

#[tokio::test]
async fn zone_detected_from_router_name_suffix() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {"name": "myapp-internal@docker", "rule": "Host(`myapp.local.example.com`)"},
        ]),
    )
    .await;

    let provider = provider();
    let mut instance = instance(server.uri(), "", "");
    instance.default_zone = Some(Zone::External);
    let routes = provider.list_routes(&instance).await.unwrap();

    assert_eq!(routes[0].zone, Zone::Internal);
}

#[tokio::test]
async fn zone_suffix_match_is_case_insensitive() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {"name": "myapp-Internal@docker", "rule": "Host(`myapp.local.example.com`)"},
        ]),
    )
    .await;

    let provider = provider();
    let mut instance = instance(server.uri(), "", "");
    instance.default_zone = Some(Zone::External);
    let routes = provider.list_routes(&instance).await.unwrap();

    assert_eq!(routes[0].zone, Zone::Internal);
}

#[tokio::test]
async fn zone_falls_back_to_default_when_no_suffix() {
    let server = MockServer::start().await;
    mock_routers(
        &server,
        serde_json::json!([
            {"name": "myapp@docker", "rule": "Host(`myapp.example.com`)"},
        ]),
    )
    .await;

    let provider = provider();
    let mut instance = instance(server.uri(), "", "");
    instance.default_zone = Some(Zone::External);
    let routes = provider.list_routes(&instance).await.unwrap();

    assert_eq!(routes[0].zone, Zone::External);
}

#[tokio::test]
async fn non_array_body_yields_no_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/http/routers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "nope"})))
        .mount(&server)
        .await;

    let provider = provider();
    let instance = instance(server.uri(), "", "");
    let routes = provider.list_routes(&instance).await.unwrap();
    assert!(routes.is_empty());
}

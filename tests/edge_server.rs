//! End-to-end tests: client → edge server → mock backend + render upstream.

use std::net::SocketAddr;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use folio_edge::config::EdgeConfig;
use folio_edge::http::EdgeServer;
use folio_edge::lifecycle::Shutdown;

mod common;

struct Harness {
    proxy_addr: SocketAddr,
    backend: common::ResolveBackend,
    shutdown: Shutdown,
    config_tx: mpsc::UnboundedSender<EdgeConfig>,
    config: EdgeConfig,
}

async fn start_edge(entries: &[(&str, &str)]) -> Harness {
    let backend = common::start_resolve_backend(entries).await;
    let render_addr = common::start_render_backend().await;

    let mut config = EdgeConfig::default();
    config.resolver.api_base_url = backend.url();
    config.upstream.address = render_addr.to_string();
    config.resolver.timeout_secs = 2;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = EdgeServer::new(config.clone()).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    Harness {
        proxy_addr,
        backend,
        shutdown,
        config_tx,
        config,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

async fn get(harness: &Harness, host: &str, path: &str) -> (u16, Value) {
    let res = client()
        .get(format!("http://{}{}", harness.proxy_addr, path))
        .header("host", host)
        .send()
        .await
        .expect("Edge unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_custom_domain_rewritten_and_forwarded() {
    let harness = start_edge(&[("edkest.com", "ed")]).await;

    let (status, echo) = get(&harness, "edkest.com", "/designs/7?view=grid").await;

    assert_eq!(status, 200);
    assert_eq!(echo["path"], "/ed/designs/7");
    assert_eq!(echo["query"], "view=grid");
    assert_eq!(echo["custom_domain"], "true");
    assert_eq!(echo["host"], "edkest.com");
    assert_eq!(echo["forwarded_host"], "edkest.com");
    assert!(echo["request_id"].is_string());

    // Root collapses to the tenant home.
    let (_, echo) = get(&harness, "edkest.com", "/").await;
    assert_eq!(echo["path"], "/ed");

    // Served from cache the second time round.
    assert_eq!(harness.backend.hits(), 1);
    assert_eq!(harness.backend.last_cache_control().as_deref(), Some("max-age=300"));

    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_platform_domain_passes_through() {
    let harness = start_edge(&[("edkest.com", "ed")]).await;

    let (status, echo) = get(&harness, "folio.skin", "/ed/cv").await;

    assert_eq!(status, 200);
    assert_eq!(echo["path"], "/ed/cv");
    assert!(echo["custom_domain"].is_null());
    assert_eq!(harness.backend.hits(), 0);

    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_unmapped_and_broken_domains_pass_through() {
    let harness = start_edge(&[]).await;

    for host in ["nobody.example", "malformed.example", "nameless.example"] {
        let (status, echo) = get(&harness, host, "/").await;
        assert_eq!(status, 200, "{host}");
        assert_eq!(echo["path"], "/", "{host}");
        assert!(echo["custom_domain"].is_null(), "{host}");
    }

    // Failures are never cached.
    get(&harness, "nobody.example", "/").await;
    assert_eq!(harness.backend.hits(), 4);

    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_client_cannot_spoof_custom_domain_marker() {
    let harness = start_edge(&[]).await;

    let res = client()
        .get(format!("http://{}/alice", harness.proxy_addr))
        .header("host", "folio.skin")
        .header("x-custom-domain", "true")
        .send()
        .await
        .unwrap();
    let echo: Value = res.json().await.unwrap();

    assert!(echo["custom_domain"].is_null());
    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_static_paths_skip_resolution() {
    let harness = start_edge(&[("edkest.com", "ed")]).await;

    for path in ["/api/projects", "/uploads/cv.pdf", "/_next/static/app.js", "/robots.txt"] {
        let (_, echo) = get(&harness, "edkest.com", path).await;
        assert_eq!(echo["path"], path);
    }
    assert_eq!(harness.backend.hits(), 0);

    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_changes_platform_domain() {
    let harness = start_edge(&[("edkest.com", "ed")]).await;

    let mut reloaded = harness.config.clone();
    reloaded.platform.domain = "edkest.com".into();
    harness.config_tx.send(reloaded).unwrap();

    // The reload task applies updates asynchronously.
    let mut path = Value::Null;
    for _ in 0..50 {
        let (_, echo) = get(&harness, "edkest.com", "/cv").await;
        path = echo["path"].clone();
        if path == "/cv" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(path, "/cv");

    harness.shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_down_is_bad_gateway() {
    let backend = common::start_resolve_backend(&[]).await;

    // Reserve a port, then free it so nothing is listening there.
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

    let mut config = EdgeConfig::default();
    config.resolver.api_base_url = backend.url();
    config.upstream.address = dead.to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let (_tx, updates) = mpsc::unbounded_channel();
    let server = EdgeServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, updates, server_shutdown).await;
    });

    let res = client()
        .get(format!("http://{}/", proxy_addr))
        .header("host", "folio.skin")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);

    shutdown.trigger();
}

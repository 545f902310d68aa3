//! Liveness probe and health-check loop tests.

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use url::Url;

use rudder::health::HealthChecker;
use rudder::lifecycle::Shutdown;
use rudder::pool::{Backend, ServerPool};
use rudder::proxy::ProxyHandle;

fn probe_client() -> Client<HttpConnector, Body> {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

fn add_backend(
    pool: &ServerPool,
    client: &Client<HttpConnector, Body>,
    addr: SocketAddr,
) -> Arc<Backend> {
    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    let proxy = ProxyHandle::new(url.clone(), client.clone()).unwrap();
    let backend = Arc::new(Backend::new(url, proxy));
    pool.add_backend(backend.clone());
    backend
}

#[tokio::test]
async fn probes_classify_backends_by_status_and_reachability() {
    let ok_addr = common::start_mock_backend("ok").await;
    let erroring_addr = common::start_programmable_backend(|| async { (500, "oops".into()) }).await;
    let refused_addr = common::unused_addr().await;
    let slow_addr = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        (200, "late".into())
    })
    .await;

    let client = probe_client();
    let pool = Arc::new(ServerPool::new("round-robin"));
    let ok = add_backend(&pool, &client, ok_addr);
    let erroring = add_backend(&pool, &client, erroring_addr);
    let refused = add_backend(&pool, &client, refused_addr);
    let slow = add_backend(&pool, &client, slow_addr);

    // Start the 200 backend dead to prove the probe revives it.
    ok.set_alive(false);

    let shutdown = Shutdown::new();
    let checker = HealthChecker::new(pool.clone(), client)
        .with_timing(Duration::from_millis(50), Duration::from_millis(100));
    tokio::spawn(checker.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(ok.is_alive(), "200 backend must be marked alive");
    assert!(!erroring.is_alive(), "non-200 backend must be marked dead");
    assert!(!refused.is_alive(), "refused backend must be marked dead");
    assert!(!slow.is_alive(), "timed-out backend must be marked dead");

    shutdown.trigger();
}

#[tokio::test]
async fn every_backend_is_probed_each_round() {
    let first_hits = Arc::new(AtomicU32::new(0));
    let second_hits = Arc::new(AtomicU32::new(0));

    let fh = first_hits.clone();
    let first_addr = common::start_programmable_backend(move || {
        let fh = fh.clone();
        async move {
            fh.fetch_add(1, Ordering::SeqCst);
            (200, "first".into())
        }
    })
    .await;

    let sh = second_hits.clone();
    let second_addr = common::start_programmable_backend(move || {
        let sh = sh.clone();
        async move {
            sh.fetch_add(1, Ordering::SeqCst);
            (200, "second".into())
        }
    })
    .await;

    let client = probe_client();
    let pool = Arc::new(ServerPool::new("round-robin"));
    add_backend(&pool, &client, first_addr);
    add_backend(&pool, &client, second_addr);

    let shutdown = Shutdown::new();
    let checker = HealthChecker::new(pool.clone(), client)
        .with_timing(Duration::from_millis(50), Duration::from_millis(200));
    tokio::spawn(checker.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(600)).await;
    shutdown.trigger();

    // Several rounds elapsed; both backends must have been probed in each
    // of them, not just whichever the request cursor happened to reach.
    assert!(first_hits.load(Ordering::SeqCst) >= 2);
    assert!(second_hits.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn shutdown_stops_scheduling_probe_rounds() {
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = healthy.clone();
    let addr = common::start_programmable_backend(move || {
        let flag = flag.clone();
        async move {
            if flag.load(Ordering::SeqCst) {
                (200, "up".into())
            } else {
                (500, "down".into())
            }
        }
    })
    .await;

    let client = probe_client();
    let pool = Arc::new(ServerPool::new("round-robin"));
    let backend = add_backend(&pool, &client, addr);

    let shutdown = Shutdown::new();
    let checker = HealthChecker::new(pool.clone(), client)
        .with_timing(Duration::from_millis(50), Duration::from_millis(200));
    tokio::spawn(checker.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!backend.is_alive(), "500 backend must be marked dead");

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The origin recovers, but no further rounds run after shutdown.
    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!backend.is_alive(), "no probes may run after shutdown");
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedTransport, refused, response};
use serde_json::json;
use visual_erp_client::{
    ClientConfig, ClientError, ConnectivityMonitor, ConnectivityState, FlushReport, Listing,
    ResourceClient, RetryPolicy, TransportError,
};
use visual_erp_core::{CustomerDraft, ProductId, QuoteId};

fn dev_config() -> ClientConfig {
    ClientConfig::new("http://localhost:8080")
}

fn client(config: ClientConfig, transport: &Arc<ScriptedTransport>) -> ResourceClient {
    ResourceClient::with_transport(config, transport.clone())
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_retried_with_linear_backoff() {
    let transport = ScriptedTransport::always(Ok(response(503, json!({"error": "maintenance"}))));
    let client = client(ClientConfig::new("https://erp.acme.test"), &transport);

    let started = tokio::time::Instant::now();
    let err = client.get_quote(&QuoteId::new("1")).await.unwrap_err();

    assert_eq!(transport.calls(), 3);
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert!(matches!(err, ClientError::Transient { status: Some(503), .. }));
    assert_eq!(
        err.user_message(),
        "The server encountered an error. Please try again later."
    );
}

#[tokio::test(start_paused = true)]
async fn recovery_on_a_later_attempt_returns_the_record() {
    let transport = ScriptedTransport::new();
    transport
        .push(refused())
        .push(Err(TransportError::Timeout))
        .push_status(
            200,
            json!({"success": true, "quote": {
                "id": "7", "title": "Spring order", "customerId": "3", "status": "Approved",
                "validUntil": "2027-04-01", "lineItems": [], "total": 0.0
            }}),
        );
    let client = client(ClientConfig::new("https://erp.acme.test"), &transport);

    let quote = client.get_quote(&QuoteId::new("7")).await.unwrap();
    assert_eq!(quote.title, "Spring order");
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn auth_and_permission_failures_are_not_retried() {
    for (status, expected) in [
        (401, "Your session has expired. Please log in again."),
        (403, "You do not have permission to perform this action."),
        (404, "The requested record was not found."),
    ] {
        let transport = ScriptedTransport::always(Ok(response(status, json!({"message": "no"}))));
        let client = client(ClientConfig::new("https://erp.acme.test"), &transport);

        let started = tokio::time::Instant::now();
        let err = client.get_product(&ProductId::new("1")).await.unwrap_err();

        assert_eq!(transport.calls(), 1, "status {status}");
        assert!(started.elapsed() < Duration::from_millis(1));
        assert_eq!(err.user_message(), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn retry_attempts_follow_configuration() {
    let transport = ScriptedTransport::always(refused());
    let config = dev_config()
        .with_api_token("key")
        .with_retry(RetryPolicy::new(5, Duration::from_millis(10)));
    let client = client(config, &transport);

    let started = tokio::time::Instant::now();
    let listing = client.list_customers().await;

    assert!(matches!(listing, Listing::Failed(ClientError::NetworkUnavailable(_))));
    assert_eq!(transport.calls(), 5);
    // 10 + 20 + 30 + 40 ms between the five attempts
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn dev_backend_down_serves_sample_lists() {
    let transport = ScriptedTransport::always(refused());
    let client = client(dev_config(), &transport);
    assert!(client.fallback_applies());

    let products = client.list_products().await;
    assert!(products.is_mock());
    assert_eq!(products.records().len(), 4);
    assert!(matches!(products.error(), Some(ClientError::NetworkUnavailable(_))));

    let quotes = client.list_quotes().await;
    assert_eq!(quotes.records().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn dev_backend_down_serves_sample_records_by_id() {
    let transport = ScriptedTransport::always(refused());
    let client = client(dev_config(), &transport);

    let product = client.get_product(&ProductId::new("2")).await.unwrap();
    assert_eq!(product.sku, "GDG-002");

    let missing = client.get_product(&ProductId::new("99")).await.unwrap_err();
    assert!(matches!(missing, ClientError::NetworkUnavailable(_)));
}

#[tokio::test(start_paused = true)]
async fn success_false_envelope_also_falls_back_on_dev_hosts() {
    let transport =
        ScriptedTransport::always(Ok(response(200, json!({"success": false, "error": "db offline"}))));
    let client = client(dev_config(), &transport);

    let listing = client.list_customers().await;
    assert!(listing.is_mock());
    assert_eq!(listing.error(), Some(&ClientError::Backend("db offline".to_string())));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_sample_data_for_real_hosts_or_configured_credentials() {
    let transport = ScriptedTransport::always(refused());
    let real = client(ClientConfig::new("https://erp.acme.test"), &transport);
    assert!(matches!(real.list_products().await, Listing::Failed(_)));

    let transport = ScriptedTransport::always(refused());
    let keyed = client(dev_config().with_api_token("key"), &transport);
    assert!(!keyed.fallback_applies());
    assert!(matches!(keyed.list_products().await, Listing::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn writes_never_fall_back() {
    let transport = ScriptedTransport::always(refused());
    let client = client(dev_config(), &transport);

    let draft = CustomerDraft {
        company_name: "Acme".to_string(),
        contact_name: "Sam".to_string(),
        email: "sam@acme.test".to_string(),
        ..Default::default()
    };
    let err = client.create_customer(&draft).await.unwrap_err();
    assert!(matches!(err, ClientError::NetworkUnavailable(_)));
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn bearer_comes_from_configured_api_token() {
    let transport = ScriptedTransport::always(Ok(response(200, json!({"success": true, "products": []}))));
    let client = client(dev_config().with_api_token("key-1"), &transport);

    client.list_products().await;
    assert_eq!(transport.seen()[0].bearer.as_deref(), Some("key-1"));
    assert_eq!(transport.seen()[0].url, "http://localhost:8080/api/inventory/products");
}

#[tokio::test(start_paused = true)]
async fn probe_marks_offline_only_for_unreachable_backends() {
    let transport = ScriptedTransport::new();
    transport
        .push(refused())
        .push_status(401, json!({"error": "unauthorized"}))
        .push_status(200, json!({"status": "ok"}));
    let client = Arc::new(client(dev_config(), &transport));
    let monitor = ConnectivityMonitor::new(client.clone());

    assert_eq!(monitor.probe_now().await, ConnectivityState::Offline);
    assert!(client.is_offline());
    // single attempt per probe
    assert_eq!(transport.calls(), 1);

    assert_eq!(monitor.probe_now().await, ConnectivityState::Online);
    assert_eq!(monitor.probe_now().await, ConnectivityState::Online);
    assert!(monitor.snapshot().last_checked.is_some());
}

#[tokio::test(start_paused = true)]
async fn probe_that_restores_connectivity_flushes_the_queue() {
    let transport = ScriptedTransport::new();
    transport
        .push(refused())
        .push_status(200, json!({"status": "ok"}))
        .push_status(200, json!({"success": true}));
    let client = Arc::new(client(dev_config(), &transport));
    let monitor = ConnectivityMonitor::new(client.clone());

    monitor.probe_now().await;
    let pending = client.delete_quote(&QuoteId::new("4")).await.unwrap();
    assert!(pending.is_queued());

    monitor.probe_now().await;
    pending.resolve().await.unwrap();
    let methods: Vec<_> = transport.seen().iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["GET", "GET", "DELETE"]);
}

#[tokio::test(start_paused = true)]
async fn monitor_probes_periodically_until_shutdown() {
    let transport = ScriptedTransport::always(Ok(response(200, json!({"status": "ok"}))));
    let client = Arc::new(client(dev_config(), &transport));
    let monitor = Arc::new(ConnectivityMonitor::with_interval(
        client,
        Duration::from_secs(30),
    ));

    let handle = monitor.start();
    tokio::time::sleep(Duration::from_secs(65)).await;
    monitor.shutdown();
    handle.await.unwrap();

    // immediate probe plus one every 30 s
    assert_eq!(transport.calls(), 3);
    assert_eq!(monitor.snapshot().state, ConnectivityState::Online);
}

#[tokio::test(start_paused = true)]
async fn replay_failure_rejects_only_its_own_handle() {
    let transport = ScriptedTransport::new();
    transport
        .push_status(200, json!({"success": true}))
        .push_status(404, json!({"message": "Quote not found"}))
        .push_status(200, json!({"success": true}));
    let client = Arc::new(client(ClientConfig::new("https://erp.acme.test"), &transport));
    let monitor = ConnectivityMonitor::new(client.clone());
    monitor.network_changed(false).await;

    let mut handles = Vec::new();
    for id in ["1", "2", "3"] {
        handles.push(client.delete_quote(&QuoteId::new(id)).await.unwrap());
    }
    assert_eq!(transport.calls(), 0);

    let report = monitor.network_changed(true).await.expect("flushed on reconnect");
    assert_eq!(report, FlushReport { replayed: 2, failed: 1 });

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.resolve().await);
    }
    assert!(outcomes[0].is_ok());
    assert!(matches!(outcomes[1], Err(ClientError::NotFound(_))));
    assert!(outcomes[2].is_ok());
    assert_eq!(
        transport.paths(),
        vec!["DELETE quotes/1", "DELETE quotes/2", "DELETE quotes/3"]
    );
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn going_offline_mid_replay_keeps_the_rest_queued_in_order() {
    let transport = ScriptedTransport::always(Ok(response(200, json!({"success": true}))));
    transport.with_latency(Duration::from_secs(1));
    let client = Arc::new(client(ClientConfig::new("https://erp.acme.test"), &transport));
    let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));
    monitor.network_changed(false).await;

    let first = client.delete_quote(&QuoteId::new("1")).await.unwrap();
    let _second = client.delete_quote(&QuoteId::new("2")).await.unwrap();
    let _third = client.delete_quote(&QuoteId::new("3")).await.unwrap();

    let flush = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.network_changed(true).await }
    });
    // first replay is in flight
    tokio::time::sleep(Duration::from_millis(500)).await;
    monitor.network_changed(false).await;

    let report = flush.await.unwrap().expect("flush ran");
    assert_eq!(report, FlushReport { replayed: 1, failed: 0 });
    first.resolve().await.unwrap();
    assert_eq!(transport.paths(), vec!["DELETE quotes/1"]);

    let pending: Vec<_> = client.pending_requests().into_iter().map(|r| r.path).collect();
    assert_eq!(pending, vec!["/api/quotes/2", "/api/quotes/3"]);
}

#[tokio::test(start_paused = true)]
async fn writes_issued_during_replay_go_behind_the_queue() {
    let transport = ScriptedTransport::always(Ok(response(200, json!({"success": true}))));
    transport.with_latency(Duration::from_secs(1));
    let client = Arc::new(client(ClientConfig::new("https://erp.acme.test"), &transport));
    let monitor = Arc::new(ConnectivityMonitor::new(client.clone()));
    monitor.network_changed(false).await;

    client.delete_quote(&QuoteId::new("1")).await.unwrap();
    client.delete_quote(&QuoteId::new("2")).await.unwrap();

    let flush = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.network_changed(true).await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!client.is_offline());

    let late = client.delete_quote(&QuoteId::new("9")).await.unwrap();
    assert!(!late.is_queued());

    assert_eq!(
        flush.await.unwrap(),
        Some(FlushReport { replayed: 3, failed: 0 })
    );
    assert_eq!(
        transport.paths(),
        vec!["DELETE quotes/1", "DELETE quotes/2", "DELETE quotes/9"]
    );
    assert_eq!(client.pending_count(), 0);
}

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use stockwatch_api::config::AppConfig;
use stockwatch_api::notify::InMemoryNotifier;

struct TestServer {
    base_url: String,
    notifier: Arc<InMemoryNotifier>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let notifier = Arc::new(InMemoryNotifier::new());
        let (app, _services) =
            stockwatch_api::app::build_app_with_notifier(AppConfig::default(), Arc::clone(&notifier))
                .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            notifier,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn day(n: u32) -> String {
    format!("2024-03-{:02}T09:00:00Z", n + 1)
}

async fn deliver(
    client: &reqwest::Client,
    srv: &TestServer,
    material: &str,
    quantity: f64,
    threshold: f64,
    at: &str,
) -> reqwest::Response {
    client
        .post(srv.url("/deliveries"))
        .json(&json!({
            "material": material,
            "quantity": quantity,
            "threshold": threshold,
            "occurred_at": at,
        }))
        .send()
        .await
        .unwrap()
}

async fn withdraw(
    client: &reqwest::Client,
    srv: &TestServer,
    material: &str,
    quantity: f64,
    at: &str,
) -> reqwest::Response {
    client
        .post(srv.url("/withdrawals"))
        .json(&json!({
            "material": material,
            "quantity": quantity,
            "occurred_at": at,
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn delivery_then_over_withdrawal_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = deliver(&client, &srv, "Cement", 100.0, 10.0, &day(0)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["material"], "Cement");
    assert_eq!(body["quantity"].as_f64(), Some(100.0));
    assert_eq!(body["status"], "healthy");

    let res = withdraw(&client, &srv, "Cement", 30.0, &day(1)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["quantity"].as_f64(), Some(70.0));

    let res = withdraw(&client, &srv, "Cement", 80.0, &day(2)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = client.get(srv.url("/stock")).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["materials"][0]["quantity"].as_f64(), Some(70.0));
}

#[tokio::test]
async fn domain_errors_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = withdraw(&client, &srv, "Steel", 1.0, &day(0)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_material");

    let res = deliver(&client, &srv, "Steel", -5.0, 10.0, &day(0)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_input");

    // The empty name is an ordinary key: unseen until delivered.
    let res = withdraw(&client, &srv, "", 1.0, &day(0)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = deliver(&client, &srv, "", 3.0, 1.0, &day(0)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn forecast_reports_rate_and_days_remaining() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    deliver(&client, &srv, "Cement", 100.0, 10.0, &day(0)).await;
    for n in 0..5 {
        let res = withdraw(&client, &srv, "Cement", 10.0, &day(n)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(srv.url(&format!("/materials/Cement/forecast?as_of={}", day(4))))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["window_days"], 7);
    assert_eq!(body["consumption_rate"]["kind"], "per_day");
    assert_eq!(body["consumption_rate"]["per_day"].as_f64(), Some(10.0));
    assert_eq!(body["consumption_rate"]["span_days"], 5);
    assert_eq!(body["depletion"]["kind"], "days");
    assert_eq!(body["depletion"]["days_remaining"].as_f64(), Some(5.0));
    assert_eq!(body["depletion_display"], "runs out in 5.0 days");
}

#[tokio::test]
async fn forecast_without_consumption_is_unbounded() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    deliver(&client, &srv, "Sand", 40.0, 5.0, &day(0)).await;

    let res = client
        .get(srv.url(&format!("/materials/Sand/forecast?as_of={}", day(1))))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["consumption_rate"], json!({ "kind": "no_recent_consumption" }));
    assert_eq!(body["depletion"], json!({ "kind": "unbounded" }));

    let res = client
        .get(srv.url("/materials/Sand/forecast?window_days=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn series_and_transactions_follow_the_log() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    deliver(&client, &srv, "Steel", 50.0, 10.0, &day(0)).await;
    withdraw(&client, &srv, "Steel", 20.0, &day(1)).await;
    deliver(&client, &srv, "Steel", 30.0, 10.0, &day(2)).await;

    let res = client.get(srv.url("/materials/Steel/series")).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let totals: Vec<f64> = body["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["quantity"].as_f64().unwrap())
        .collect();
    assert_eq!(totals, vec![50.0, 30.0, 60.0]);

    let res = client
        .get(srv.url(&format!(
            "/materials/Steel/transactions?since={}&until={}",
            day(1),
            day(2)
        )))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["transactions"][0]["kind"], "withdrawal");
    assert_eq!(body["transactions"][1]["kind"], "delivery");

    let res = client.get(srv.url("/materials/Nothing/series")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["points"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn materials_list_merges_catalog_and_history() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    deliver(&client, &srv, "Rebar 12mm", 10.0, 1.0, &day(0)).await;
    deliver(&client, &srv, "Cement", 10.0, 1.0, &day(0)).await;

    let res = client.get(srv.url("/materials")).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let names: Vec<&str> = body["materials"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Cement", "Steel", "Sand", "Gravel", "Bricks", "Other", "Rebar 12mm"]
    );
}

#[tokio::test]
async fn threshold_breach_reaches_the_notifier() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    deliver(&client, &srv, "Bricks", 20.0, 10.0, &day(0)).await;
    withdraw(&client, &srv, "Bricks", 15.0, &day(1)).await;

    // Delivery happens on a background worker; poll briefly.
    for _ in 0..100 {
        if !srv.notifier.all().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let alerts = srv.notifier.all();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].material.as_str(), "Bricks");
    assert_eq!(alerts[0].quantity, 5.0);
    assert_eq!(alerts[0].threshold, 10.0);
}

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use stockyard_api::app::{build_app, AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let services = Arc::new(AppServices::in_memory().expect("failed to wire services"));
        let app = build_app(services);
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
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    /// Unit + class + one purchase item; returns the purchase item id.
    async fn seed_purchase(&self) -> String {
        let (status, unit) = self.post("/units", json!({ "name": "Bag", "symbol": "bg" })).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, class) = self.post("/classes", json!({ "name": "Masonry" })).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, item) = self
            .post(
                "/purchases",
                json!({
                    "acquired_on": "2024-01-15",
                    "designation": "Cement bag",
                    "quantity": 40,
                    "unit_price": 1250,
                    "unit_id": unit["id"],
                    "class_id": class["id"],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        item["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_storage() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "in_memory");
}

#[tokio::test]
async fn stock_lifecycle_receive_issue_query() {
    let srv = TestServer::spawn().await;
    let item_id = srv.seed_purchase().await;

    for (qty, source) in [(20, "Depot A"), (15, "Depot B"), (5, "Depot A")] {
        let (status, _) = srv
            .post(
                "/movements/in",
                json!({ "purchase_item_id": item_id, "date": "2024-01-20", "quantity": qty, "source": source }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    for (qty, dest) in [(10, "Site 7"), (8, "Site 9")] {
        let (status, _) = srv
            .post(
                "/movements/out",
                json!({ "purchase_item_id": item_id, "date": "2024-02-01", "quantity": qty, "destination": dest }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, details) = srv.get(&format!("/stock/{}", item_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["total_received"], 40);
    assert_eq!(details["total_issued"], 18);
    assert_eq!(details["available"], 22);
    assert_eq!(details["unit"], "bg");
    assert_eq!(details["class"], "Masonry");
    assert_eq!(details["sources"], json!(["Depot A", "Depot B"]));
    assert_eq!(details["received"].as_array().unwrap().len(), 3);

    let (status, all) = srv.get("/stock").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, body) = srv.delete("/movements/out").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, details) = srv.get(&format!("/stock/{}", item_id)).await;
    assert_eq!(details["available"], 40);
}

#[tokio::test]
async fn purchase_delete_cascades() {
    let srv = TestServer::spawn().await;
    let item_id = srv.seed_purchase().await;
    srv.post(
        "/movements/in",
        json!({ "purchase_item_id": item_id, "date": "2024-01-20", "quantity": 3 }),
    )
    .await;

    let (status, body) = srv.delete(&format!("/purchases/{}", item_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movements_in_deleted"], 1);

    let (status, _) = srv.get(&format!("/stock/{}", item_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, movements) = srv.get("/movements/in").await;
    assert!(movements.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_input_maps_to_client_errors() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/stock/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let item_id = srv.seed_purchase().await;
    let (status, body) = srv
        .post(
            "/movements/in",
            json!({ "purchase_item_id": item_id, "date": "2024-01-20", "quantity": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post(
            "/movements/in",
            json!({ "purchase_item_id": item_id, "date": "20/01/2024", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_date");

    let (status, _) = srv.get("/movements/sideways").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cash_ledger_chains_balances_per_project() {
    let srv = TestServer::spawn().await;
    let project = uuid::Uuid::now_v7().to_string();

    let (status, first) = srv
        .post(
            "/cash",
            json!({ "date": "2024-03-01", "label": "float", "credit": 100, "project_id": project }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["balance"], 100);

    let (_, second) = srv
        .post(
            "/cash",
            json!({ "date": "2024-03-02", "label": "fuel", "debit": 30, "project_id": project }),
        )
        .await;
    assert_eq!(second["balance"], 70);

    let (_, unassigned) = srv
        .post("/cash", json!({ "date": "2024-03-02", "label": "stamps", "debit": 5 }))
        .await;
    assert_eq!(unassigned["balance"], -5);

    let (status, balance) = srv.get(&format!("/cash/balance?project={}", project)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["balance"], 70);

    let (_, balance) = srv.get("/cash/balance").await;
    assert_eq!(balance["balance"], -5);

    let (_, listed) = srv.get(&format!("/cash?project={}", project)).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (_, totals) = srv.get(&format!("/cash/totals?project={}", project)).await;
    assert_eq!(totals["total_debit"], 30);
    assert_eq!(totals["total_credit"], 100);
    assert_eq!(totals["last_balance"], 70);
}

#[tokio::test]
async fn reconcile_reports_drift_after_middle_delete() {
    let srv = TestServer::spawn().await;

    srv.post("/cash", json!({ "date": "2024-03-01", "label": "float", "credit": 100 }))
        .await;
    let (_, middle) = srv
        .post("/cash", json!({ "date": "2024-03-02", "label": "fuel", "debit": 30 }))
        .await;
    srv.post("/cash", json!({ "date": "2024-03-03", "label": "refund", "credit": 10 }))
        .await;

    let (_, drift) = srv.get("/cash/reconcile").await;
    assert!(drift.as_array().unwrap().is_empty());

    let res = srv
        .client
        .delete(srv.url(&format!("/cash/{}", middle["id"].as_str().unwrap())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (_, drift) = srv.get("/cash/reconcile?project=unassigned").await;
    let lines = drift.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["stored_balance"], 80);
    assert_eq!(lines[0]["expected_balance"], 110);
    assert_eq!(lines[0]["drift"], -30);
}

#[tokio::test]
async fn main_register_is_separate_from_petty_cash() {
    let srv = TestServer::spawn().await;
    let project = uuid::Uuid::now_v7().to_string();

    srv.post(
        "/cash",
        json!({ "date": "2024-04-01", "label": "float", "credit": 200, "project_id": project }),
    )
    .await;
    let (status, deposit) = srv
        .post(
            "/cash",
            json!({
                "date": "2024-04-01",
                "label": "client deposit",
                "credit": 10_000,
                "project_id": project,
                "register": "main",
                "payment_method": "transfer",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deposit["balance"], 10_000);
    assert_eq!(deposit["register"], "main");
    assert_eq!(deposit["payment_method"], "transfer");

    let (_, petty) = srv.get(&format!("/cash/balance?project={}", project)).await;
    assert_eq!(petty["balance"], 200);
    let (_, main) = srv
        .get(&format!("/cash/balance?project={}&register=main", project))
        .await;
    assert_eq!(main["balance"], 10_000);
    assert_eq!(main["register"], "main");

    let (_, listed) = srv.get("/cash?register=main").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = srv.get("/cash?register=vault").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_register");

    let (status, cleared) = srv.delete("/cash?register=main").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["deleted"], 1);
    let (_, petty) = srv.get(&format!("/cash/balance?project={}", project)).await;
    assert_eq!(petty["balance"], 200);
}

//! Exercises the REST gateway against an in-process server speaking the
//! store's wire protocol: collection routes under `/rest/v1`, password
//! sessions under `/auth/v1`, and the send-contract function.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use fleetdesk_client::fixtures::{demo_rental, demo_request, demo_vehicles};
use fleetdesk_client::rest::RestGateway;
use fleetdesk_core::config::StoreConfig;
use fleetdesk_core::domain::{CustomerId, RentalId, RentalStatus, RequestId, RequestStatus, VehicleId};
use fleetdesk_core::gateway::{RentalPatch, StoreError, StoreGateway};

const ANON_KEY: &str = "anon-key";
const OPERATOR_EMAIL: &str = "operator@fleetdesk.test";
const OPERATOR_PASSWORD: &str = "orchard-route";
const ACCESS_TOKEN: &str = "access-token-123";

#[derive(Clone, Default)]
struct MockStore {
    rows: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    contract_calls: Arc<Mutex<Vec<i64>>>,
    bearers: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    fn seed(&self, collection: &str, rows: Vec<Value>) {
        self.rows.lock().expect("rows lock").insert(collection.to_string(), rows);
    }

    fn rows(&self, collection: &str) -> Vec<Value> {
        self.rows.lock().expect("rows lock").get(collection).cloned().unwrap_or_default()
    }

    fn contract_calls(&self) -> Vec<i64> {
        self.contract_calls.lock().expect("calls lock").clone()
    }

    fn last_bearer(&self) -> Option<String> {
        self.bearers.lock().expect("bearers lock").last().cloned()
    }

    fn reject(&self, headers: &HeaderMap) -> Option<(StatusCode, Json<Value>)> {
        let key = headers.get("apikey").and_then(|value| value.to_str().ok());
        if key == Some(ANON_KEY) {
            return None;
        }
        Some((StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid api key" }))))
    }

    fn note_bearer(&self, headers: &HeaderMap) {
        if let Some(bearer) = headers.get("authorization").and_then(|value| value.to_str().ok()) {
            self.bearers.lock().expect("bearers lock").push(bearer.to_string());
        }
    }
}

async fn token(
    State(store): State<MockStore>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }
    if params.get("grant_type").map(String::as_str) != Some("password") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "unsupported_grant_type" })));
    }

    let email = body.get("email").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    if email != Some(OPERATOR_EMAIL) || password != Some(OPERATOR_PASSWORD) {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })));
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "bearer",
            "user": { "id": "user-1", "email": OPERATOR_EMAIL }
        })),
    )
}

async fn logout(State(store): State<MockStore>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }
    (StatusCode::OK, Json(json!({})))
}

async fn list_rows(
    State(store): State<MockStore>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }
    store.note_bearer(&headers);
    (StatusCode::OK, Json(Value::Array(store.rows(&collection))))
}

async fn insert_row(
    State(store): State<MockStore>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }

    let mut rows = store.rows.lock().expect("rows lock");
    let list = rows.entry(collection).or_default();
    let id = list.len() as i64 + 1;
    body["id"] = json!(id);
    list.push(body.clone());
    (StatusCode::CREATED, Json(json!([body])))
}

async fn patch_rows(
    State(store): State<MockStore>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }

    let id = params
        .get("id")
        .and_then(|filter| filter.strip_prefix("eq."))
        .and_then(|value| value.parse::<i64>().ok());
    let Some(id) = id else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "missing id filter" })));
    };

    let mut rows = store.rows.lock().expect("rows lock");
    let mut updated = Vec::new();
    if let Some(list) = rows.get_mut(&collection) {
        for row in list.iter_mut() {
            if row["id"] == json!(id) {
                if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
                    for (key, value) in patch {
                        target.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
    }
    (StatusCode::OK, Json(Value::Array(updated)))
}

async fn send_contract(
    State(store): State<MockStore>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = store.reject(&headers) {
        return rejection;
    }

    let rental_id = body.get("rentalId").and_then(Value::as_i64).unwrap_or_default();
    store.contract_calls.lock().expect("calls lock").push(rental_id);
    (StatusCode::OK, Json(json!({ "success": true })))
}

fn router(store: MockStore) -> Router {
    Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/{collection}", get(list_rows).post(insert_row).patch(patch_rows))
        .route("/functions/v1/send-contract", post(send_contract))
        .with_state(store)
}

async fn spawn_store() -> (String, MockStore) {
    let store = MockStore::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local addr");
    let routes = router(store.clone());
    tokio::spawn(async move {
        axum::serve(listener, routes).await.expect("serve");
    });
    (format!("http://{address}"), store)
}

fn gateway(base_url: &str, api_key: &str, session_file: std::path::PathBuf) -> RestGateway {
    let config = StoreConfig {
        base_url: base_url.to_string(),
        api_key: api_key.to_string().into(),
        timeout_secs: 5,
    };
    RestGateway::new(&config, session_file).expect("gateway builds")
}

fn vehicle_row(id: i64) -> Value {
    json!({
        "id": id,
        "brand": "Ford Transit",
        "license_plate": "1AB 1234",
        "vin": "ABC123XYZ",
        "year": 2022,
        "price_4h": 600,
        "price_12h": 1000,
        "price_day": 1500,
        "price_month": null,
        "stk_date": "2026-04-01",
        "insurance_info": "ČSOB, č. 123456",
        "vignette_until": "2025-01-31"
    })
}

fn rental_row(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "vehicle_id": 1,
        "customer_id": 1,
        "start_date": "2024-06-10T09:00:00Z",
        "end_date": "2024-06-12T17:00:00Z",
        "total_price": 4500,
        "status": status,
        "customer_signature": null,
        "company_signature": null,
        "digital_consent_at": null
    })
}

fn request_row(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "first_name": "Petra",
        "last_name": "Svobodová",
        "email": "petra.svobodova@email.com",
        "phone": "+420 987 654 321",
        "id_card_number": "555444333",
        "drivers_license_number": "333444555",
        "drivers_license_image_base64": null,
        "digital_consent_at": "2024-06-01T12:00:00Z",
        "status": status
    })
}

#[tokio::test]
async fn listing_maps_store_columns_onto_the_domain() {
    let (base_url, store) = spawn_store().await;
    store.seed("vehicles", vec![vehicle_row(1)]);
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let vehicles = gateway.list_vehicles().await.expect("list vehicles");

    assert_eq!(vehicles.len(), 1);
    let vehicle = &vehicles[0];
    assert_eq!(vehicle.id, VehicleId(1));
    assert_eq!(vehicle.rates.day, Some(Decimal::from(1500)));
    assert_eq!(vehicle.rates.month, None);
    assert_eq!(vehicle.inspection_until, NaiveDate::from_ymd_opt(2026, 4, 1).expect("date"));
    assert_eq!(vehicle.insurance_note, "ČSOB, č. 123456");
}

#[tokio::test]
async fn inserting_writes_store_columns_and_returns_the_created_row() {
    let (base_url, store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let created = gateway.insert_vehicle(&demo_vehicles()[0]).await.expect("insert vehicle");
    assert_eq!(created.id, VehicleId(1));
    assert_eq!(created.brand, "Ford Transit");

    let rows = store.rows("vehicles");
    assert_eq!(rows[0]["stk_date"], json!("2026-04-01"));
    assert_eq!(rows[0]["insurance_info"], json!("ČSOB, č. 123456"));
    assert!(rows[0].get("inspection_until").is_none());
}

#[tokio::test]
async fn an_invalid_key_is_an_auth_error() {
    let (base_url, _store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, "wrong-key", dir.path().join("session.json"));

    let result = gateway.list_vehicles().await;
    assert!(matches!(result, Err(StoreError::Auth(_))));
}

#[tokio::test]
async fn an_unknown_rental_status_is_a_schema_error() {
    let (base_url, store) = spawn_store().await;
    store.seed("rentals", vec![rental_row(1, "archived")]);
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let result = gateway.list_rentals().await;
    match result {
        Err(StoreError::Schema(message)) => assert!(message.contains("archived")),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[tokio::test]
async fn rental_patch_updates_only_the_filtered_row() {
    let (base_url, store) = spawn_store().await;
    store.seed("rentals", vec![rental_row(1, "active"), rental_row(2, "active")]);
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let updated = gateway
        .update_rental(RentalId(2), &RentalPatch::status(RentalStatus::Completed))
        .await
        .expect("patch rental");
    assert_eq!(updated.status, RentalStatus::Completed);

    let rows = store.rows("rentals");
    assert_eq!(rows[0]["status"], json!("active"));
    assert_eq!(rows[1]["status"], json!("completed"));
    // Unset patch fields never reach the store.
    assert_eq!(rows[1]["customer_signature"], json!(null));
}

#[tokio::test]
async fn patching_a_missing_row_is_a_schema_error() {
    let (base_url, store) = spawn_store().await;
    store.seed("rentals", vec![rental_row(1, "active")]);
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let result = gateway.update_rental(RentalId(9), &RentalPatch::status(RentalStatus::Completed)).await;
    match result {
        Err(StoreError::Schema(message)) => assert!(message.contains("matched no row")),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[tokio::test]
async fn request_decisions_patch_the_status_column() {
    let (base_url, store) = spawn_store().await;
    store.seed("rental_requests", vec![request_row(1, "pending")]);
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let updated = gateway
        .update_request_status(RequestId(1), RequestStatus::Approved)
        .await
        .expect("approve request");
    assert_eq!(updated.status, RequestStatus::Approved);
    assert_eq!(store.rows("rental_requests")[0]["status"], json!("approved"));
}

#[tokio::test]
async fn sign_in_persists_the_session_and_switches_the_bearer() {
    let (base_url, store) = spawn_store().await;
    store.seed("vehicles", vec![vehicle_row(1)]);
    let dir = tempfile::tempdir().expect("tempdir");
    let session_file = dir.path().join("session.json");
    let gateway = gateway(&base_url, ANON_KEY, session_file.clone());
    let events = gateway.session_events();

    let info = gateway.sign_in(OPERATOR_EMAIL, OPERATOR_PASSWORD).await.expect("sign in");
    assert_eq!(info.email, OPERATOR_EMAIL);
    assert!(session_file.exists());
    assert!(events.borrow().as_ref().is_some_and(|session| session.email == OPERATOR_EMAIL));

    gateway.list_vehicles().await.expect("list vehicles");
    assert_eq!(store.last_bearer(), Some(format!("Bearer {ACCESS_TOKEN}")));
}

#[tokio::test]
async fn a_fresh_gateway_restores_the_persisted_session() {
    let (base_url, _store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let session_file = dir.path().join("session.json");

    let first = gateway(&base_url, ANON_KEY, session_file.clone());
    first.sign_in(OPERATOR_EMAIL, OPERATOR_PASSWORD).await.expect("sign in");

    let second = gateway(&base_url, ANON_KEY, session_file);
    let session = second.current_session().await.expect("restored session");
    assert_eq!(session.email, OPERATOR_EMAIL);
}

#[tokio::test]
async fn a_wrong_password_is_an_auth_error_and_leaves_no_session() {
    let (base_url, _store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let session_file = dir.path().join("session.json");
    let gateway = gateway(&base_url, ANON_KEY, session_file.clone());

    let result = gateway.sign_in(OPERATOR_EMAIL, "not-the-password").await;
    assert!(matches!(result, Err(StoreError::Auth(_))));
    assert!(!session_file.exists());
    assert!(gateway.current_session().await.is_none());
}

#[tokio::test]
async fn sign_out_clears_the_session_and_falls_back_to_the_anon_bearer() {
    let (base_url, store) = spawn_store().await;
    store.seed("vehicles", vec![vehicle_row(1)]);
    let dir = tempfile::tempdir().expect("tempdir");
    let session_file = dir.path().join("session.json");
    let gateway = gateway(&base_url, ANON_KEY, session_file.clone());

    gateway.sign_in(OPERATOR_EMAIL, OPERATOR_PASSWORD).await.expect("sign in");
    gateway.sign_out().await.expect("sign out");

    assert!(!session_file.exists());
    assert!(gateway.current_session().await.is_none());
    assert!(gateway.session_events().borrow().is_none());

    gateway.list_vehicles().await.expect("list vehicles");
    assert_eq!(store.last_bearer(), Some(format!("Bearer {ANON_KEY}")));
}

#[tokio::test]
async fn send_contract_posts_the_rental_id_to_the_function() {
    let (base_url, store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    gateway.send_contract(RentalId(7)).await.expect("send contract");
    assert_eq!(store.contract_calls(), vec![7]);
}

#[tokio::test]
async fn inserting_a_rental_and_request_round_trips_the_domain_payloads() {
    let (base_url, store) = spawn_store().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(&base_url, ANON_KEY, dir.path().join("session.json"));

    let rental = gateway
        .insert_rental(&demo_rental(VehicleId(1), CustomerId(1)))
        .await
        .expect("insert rental");
    assert_eq!(rental.id, RentalId(1));
    assert_eq!(rental.status, RentalStatus::Completed);
    assert_eq!(store.rows("rentals")[0]["status"], json!("completed"));

    let request = gateway.insert_request(&demo_request()).await.expect("insert request");
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(store.rows("rental_requests")[0]["drivers_license_number"], json!("333444555"));
}

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use dealroom_backend::{
    build_router,
    services::{identity::GatewayHeaderIdentity, opportunity_store::InMemoryOpportunityStore},
    AppState,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory store; the store handle is returned for
/// direct inspection
pub fn build_test_app() -> (Router, InMemoryOpportunityStore) {
    let store = InMemoryOpportunityStore::new();
    let state = AppState {
        store: Arc::new(store.clone()),
        identity: Arc::new(GatewayHeaderIdentity::new()),
    };
    (build_router(state, None), store)
}

/// Identity forwarded by the gateway: `(actor_id, role)`
pub type Actor<'a> = Option<(&'a str, &'a str)>;

pub const SPONSOR: Actor<'static> = Some(("sponsor-123", "deal_sponsor"));
pub const OTHER_SPONSOR: Actor<'static> = Some(("sponsor-999", "deal_sponsor"));
pub const CAPITAL_PARTNER: Actor<'static> = Some(("cp-1", "capital_partner"));
pub const SERVICE_PROVIDER: Actor<'static> = Some(("sp-1", "service_provider"));
pub const ANONYMOUS: Actor<'static> = None;

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Actor<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

/// Send a body as-is, for payloads that are not valid JSON
pub async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Actor<'_>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Minimal valid opportunity body
pub fn opportunity_body() -> Value {
    json!({
        "opportunity_name": "Test",
        "property_type": "multifamily",
        "property_address": {
            "street": "1 Main",
            "city": "X",
            "state": "NY",
            "zip": "10001"
        },
        "total_project_cost": 1000000,
        "equity_requirement": 300000,
        "minimum_investment": 50000,
        "target_raise_amount": 300000
    })
}

/// Public, fundraising listing owned by `SPONSOR`; returns its id
pub async fn create_listed(app: &Router) -> String {
    create_listed_with(app, json!({})).await
}

/// Like [`create_listed`], with extra top-level fields overriding the body
pub async fn create_listed_with(app: &Router, overrides: Value) -> String {
    let mut body = opportunity_body();
    body["status"] = json!("fundraising");
    body["public_listing"] = json!(true);
    if let Value::Object(fields) = overrides {
        for (key, value) in fields {
            body[key.as_str()] = value;
        }
    }
    let (status, json) = send(app, "POST", "/api/opportunities", SPONSOR, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

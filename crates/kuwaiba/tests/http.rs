#![cfg(feature = "server")]

use axum::body::{Body, to_bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode, header};
use kuwaiba::server::{SESSION_HEADER, router};
use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_event_bus::EventBus;
use kw_kernel::server::ApiState;
use serde_json::{Value, json};
use std::net::SocketAddr;
use tower::ServiceExt;

fn app() -> axum::Router {
    let config = ApiConfig::default();
    let database = Database::in_memory();
    let events = EventBus::new();
    let slices = kuwaiba::init(&config, &database, &events, None).unwrap();
    let state =
        ApiState::builder().config(config).db(database).events(events).register_slices(slices).build().unwrap();
    let (router, _api) = router().split_for_parts();
    router.with_state(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_of(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn a_session_drives_the_operation_endpoint() {
    let app = app();

    let login = json!({ "userName": "admin", "password": "kuwaiba", "sessionType": 2 });
    let response = app.clone().oneshot(post("/ws/session", &login)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = json_of(response).await;
    let token = session["sessionId"].as_str().unwrap().to_owned();
    assert_eq!(session["userName"], "admin");

    let call = json!({ "sessionId": token, "operation": "getClass", "params": { "className": "Router" } });
    let response = app.clone().oneshot(post("/ws", &call)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await["name"], "Router");

    let call = json!({ "sessionId": token, "operation": "getClass", "params": { "className": "Nope" } });
    let response = app.clone().oneshot(post("/ws", &call)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_of(response).await["kind"], "notFound");

    let logout = Request::delete("/ws/session").header(SESSION_HEADER, token.as_str()).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let call = json!({ "sessionId": token, "operation": "getClass", "params": { "className": "Router" } });
    let response = app.oneshot(post("/ws", &call)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let login = json!({ "userName": "admin", "password": "guess", "sessionType": 2 });
    let response = app().oneshot(post("/ws/session", &login)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_lists_the_slices() {
    let response = app().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let slices = json_of(response).await["slices"].as_array().unwrap().len();
    assert_eq!(slices, 9);
}

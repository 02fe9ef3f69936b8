//! HTTP surface of the web service: session management and the operation endpoint.
//!
//! The router must be served with `into_make_service_with_connect_info::<SocketAddr>()`;
//! sessions are bound to the peer address.

use crate::dispatch::{self, Slices, WsRequest};
use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::http::StatusCode;
use kw_derive::{api_handler, api_model};
use kw_domain::constants::{INVENTORY_TAG, SESSION_TAG};
use kw_domain::model::{Id, Timestamp};
use kw_domain::registry::FeatureSlice;
use kw_event_bus::EventBus;
use kw_kernel::error::InventoryError;
use kw_kernel::server::ApiState;
use kw_kernel::server::router::system_router;
use kw_session::{Session, Sessions};
use serde_json::Value;
use std::net::SocketAddr;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Header carrying the session token on calls outside the JSON body.
pub const SESSION_HEADER: &str = "x-session-id";

impl Slices for ApiState {
    fn slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.get_slice::<T>()
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}

#[api_model]
pub struct CreateSessionRequest {
    pub user_name: String,
    pub password: String,
    /// 1 desktop, 2 web service, 3 web.
    pub session_type: i32,
}

#[api_model]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: Id,
    pub user_name: String,
    pub session_type: i32,
    pub login_time: Timestamp,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.token.clone(),
            user_id: session.user_id.clone(),
            user_name: session.user_name.clone(),
            session_type: session.session_type,
            login_time: session.login_time,
        }
    }
}

fn sessions(state: &ApiState) -> Result<&Sessions, InventoryError> {
    state.get_slice::<Sessions>().ok_or_else(|| InventoryError::Internal {
        message: "Sessions are not registered".into(),
        context: None,
    })
}

#[api_handler(
    post,
    path = "/ws/session",
    request_body = CreateSessionRequest,
    responses(
        (status = OK, description = "Session opened", body = SessionResponse),
        (status = UNAUTHORIZED, description = "Wrong credentials or disabled account", body = kw_kernel::error::ErrorBody),
    ),
    tag = SESSION_TAG,
)]
pub(crate) async fn create_session_handler(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionResponse>, InventoryError> {
    let session =
        sessions(&state)?.create_session(&request.user_name, &request.password, request.session_type, peer.ip())?;
    Ok(Json(SessionResponse::from(session.as_ref())))
}

#[api_handler(
    delete,
    path = "/ws/session",
    params(("x-session-id" = String, Header, description = "Session token")),
    responses(
        (status = NO_CONTENT, description = "Session closed"),
        (status = UNAUTHORIZED, description = "Unknown session", body = kw_kernel::error::ErrorBody),
    ),
    tag = SESSION_TAG,
)]
pub(crate) async fn close_session_handler(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<StatusCode, InventoryError> {
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| InventoryError::not_authorized("Missing session header"))?;
    sessions(&state)?.close_session(token, peer.ip())?;
    Ok(StatusCode::NO_CONTENT)
}

#[api_handler(
    post,
    path = "/ws",
    request_body = WsRequest,
    responses(
        (status = OK, description = "Operation result", body = Object),
        (status = BAD_REQUEST, description = "Unknown operation or bad parameters", body = kw_kernel::error::ErrorBody),
        (status = UNAUTHORIZED, description = "Invalid session or missing privilege", body = kw_kernel::error::ErrorBody),
        (status = FORBIDDEN, description = "Operation not permitted", body = kw_kernel::error::ErrorBody),
        (status = NOT_FOUND, description = "Unknown class or object", body = kw_kernel::error::ErrorBody),
    ),
    tag = INVENTORY_TAG,
)]
pub(crate) async fn ws_handler(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Json(request): Json<WsRequest>,
) -> Result<Json<Value>, InventoryError> {
    dispatch::dispatch(&state, peer.ip(), request).await.map(Json)
}

/// Every route of the service: system routes, sessions and the operation endpoint.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(create_session_handler, close_session_handler))
        .routes(routes!(ws_handler))
        .merge(system_router())
}

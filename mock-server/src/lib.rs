//! In-memory Thunder-compatible REST server for tests and local development.
//!
//! Users are "connected" through `MockState::connect`; the HTTP API then
//! reports presence, channel membership and delivery counts against that
//! registry and records every delivered message in the user's inbox.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

pub const API_VERSION: &str = "1.0.0";
pub const SECRET_KEY_HEADER: &str = "x-thunder-secret-key";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnlineResponse {
    pub online: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsersResponse {
    pub users: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Connection {
    pub channels: BTreeSet<String>,
    pub inbox: Vec<Value>,
}

pub type Registry = Arc<RwLock<HashMap<String, Connection>>>;

/// Credentials plus the shared connection registry.
#[derive(Clone, Debug)]
pub struct MockState {
    api_key: Arc<str>,
    api_secret: Arc<str>,
    registry: Registry,
}

impl MockState {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            api_key: Arc::from(api_key),
            api_secret: Arc::from(api_secret),
            registry: Registry::default(),
        }
    }

    /// Mark `user` online and subscribe it to `channels`.
    pub async fn connect<I, S>(&self, user: &str, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = self.registry.write().await;
        let connection = registry.entry(user.to_string()).or_default();
        connection.channels.extend(channels.into_iter().map(Into::into));
    }

    /// Messages delivered to `user` so far; empty if the user is offline.
    pub async fn inbox(&self, user: &str) -> Vec<Value> {
        let registry = self.registry.read().await;
        registry.get(user).map(|c| c.inbox.clone()).unwrap_or_default()
    }

    pub async fn is_online(&self, user: &str) -> bool {
        self.registry.read().await.contains_key(user)
    }

    /// Reject wrong version/key with 404 and a wrong secret with 401.
    fn authorize(&self, version: &str, api_key: &str, headers: &HeaderMap) -> Result<(), StatusCode> {
        if version != API_VERSION || api_key != &*self.api_key {
            return Err(StatusCode::NOT_FOUND);
        }
        let secret = headers.get(SECRET_KEY_HEADER).and_then(|v| v.to_str().ok());
        if secret != Some(&*self.api_secret) {
            tracing::debug!("rejecting request with missing or wrong secret key");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(())
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/api/{version}/{apikey}/users/", get(user_count))
        .route(
            "/api/{version}/{apikey}/users/{userid}/",
            get(user_online).post(message_user).delete(disconnect_user),
        )
        .route(
            "/api/{version}/{apikey}/channels/{channel}/",
            get(channel_users).post(message_channel),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn parse_message(body: &str) -> Result<Value, StatusCode> {
    serde_json::from_str(body).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn user_count(
    State(state): State<MockState>,
    Path((version, apikey)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<CountResponse>, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let count = state.registry.read().await.len();
    Ok(Json(CountResponse { count }))
}

async fn user_online(
    State(state): State<MockState>,
    Path((version, apikey, userid)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<OnlineResponse>, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let online = state.registry.read().await.contains_key(&userid);
    Ok(Json(OnlineResponse { online }))
}

async fn message_user(
    State(state): State<MockState>,
    Path((version, apikey, userid)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CountResponse>, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let message = parse_message(&body)?;
    let mut registry = state.registry.write().await;
    let count = match registry.get_mut(&userid) {
        Some(connection) => {
            connection.inbox.push(message);
            1
        }
        None => 0,
    };
    tracing::debug!(user = %userid, count, "delivered message to user");
    Ok(Json(CountResponse { count }))
}

async fn disconnect_user(
    State(state): State<MockState>,
    Path((version, apikey, userid)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let mut registry = state.registry.write().await;
    registry
        .remove(&userid)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn channel_users(
    State(state): State<MockState>,
    Path((version, apikey, channel)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<UsersResponse>, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let registry = state.registry.read().await;
    let mut users: Vec<String> = registry
        .iter()
        .filter(|(_, connection)| connection.channels.contains(&channel))
        .map(|(user, _)| user.clone())
        .collect();
    users.sort();
    Ok(Json(UsersResponse { users }))
}

async fn message_channel(
    State(state): State<MockState>,
    Path((version, apikey, channel)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CountResponse>, StatusCode> {
    state.authorize(&version, &apikey, &headers)?;
    let message = parse_message(&body)?;
    let mut registry = state.registry.write().await;
    let mut count = 0;
    for connection in registry.values_mut().filter(|c| c.channels.contains(&channel)) {
        connection.inbox.push(message.clone());
        count += 1;
    }
    tracing::debug!(%channel, count, "delivered message to channel");
    Ok(Json(CountResponse { count }))
}

//! Mock token endpoint for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::OAuthConfig;

type RecordedRequests = Arc<Mutex<Vec<HashMap<String, String>>>>;

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    requests: RecordedRequests,
}

pub(crate) struct MockTokenServer {
    pub token_uri: String,
    requests: RecordedRequests,
}

impl MockTokenServer {
    pub fn config(&self) -> OAuthConfig {
        let mut config = OAuthConfig::new("client-1".to_string(), "secret-1".to_string());
        config.token_uri = self.token_uri.clone();
        config
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

async fn token_handler(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let grant_type = form.get("grant_type").cloned().unwrap_or_default();
    state.requests.lock().unwrap().push(form);

    if state.status != StatusCode::OK {
        return (state.status, r#"{"error":"invalid_grant"}"#).into_response();
    }

    match grant_type.as_str() {
        "authorization_code" => Json(json!({
            "access_token": "access-from-code",
            "refresh_token": "refresh-from-code",
            "token_type": "Bearer",
            "expires_in": 3599,
        }))
        .into_response(),
        "refresh_token" => Json(json!({
            "access_token": "access-refreshed",
            "token_type": "Bearer",
            "expires_in": 3599,
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Serve a token endpoint on an ephemeral port answering with `status`
pub(crate) async fn spawn_token_server(status: StatusCode) -> MockTokenServer {
    let requests = RecordedRequests::default();
    let app = Router::new()
        .route("/token", post(token_handler))
        .with_state(MockState {
            status,
            requests: requests.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockTokenServer {
        token_uri: format!("http://{}/token", addr),
        requests,
    }
}

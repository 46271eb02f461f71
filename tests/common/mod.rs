// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use caehlcettel::application::Config;
use caehlcettel::domain::{Catalog, Session};
use serde_json::Value;
use tokio::net::TcpListener;

/// Path the mock serves the counting endpoint on, relative to its base URL.
pub const COUNTING_PATH: &str = "/api/count/";

/// A request as seen by the mock accounting API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// How the mock answers. `{base}` in `count_body` is replaced with the
/// server's base URL.
#[derive(Debug, Clone)]
pub struct MockBehaviour {
    pub count_status: u16,
    pub count_body: String,
    pub print_status: u16,
    pub delay: Duration,
}

impl Default for MockBehaviour {
    fn default() -> Self {
        Self {
            count_status: 201,
            count_body: r#"{"url": "{base}/record/1/"}"#.to_string(),
            print_status: 200,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
struct MockState {
    base_url: String,
    behaviour: MockBehaviour,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Running mock accounting API bound to an ephemeral local port.
pub struct MockApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApi {
    pub async fn start(behaviour: MockBehaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = MockState {
            base_url: base_url.clone(),
            behaviour,
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(handle).with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, requests }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Config pointing at this mock with a short timeout.
    pub fn config(&self) -> Config {
        config_for(&self.base_url)
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).ok(),
    });

    if !state.behaviour.delay.is_zero() {
        tokio::time::sleep(state.behaviour.delay).await;
    }

    let path = uri.path();
    let (status, body) = if method == Method::POST && path == COUNTING_PATH {
        (
            state.behaviour.count_status,
            state.behaviour.count_body.replace("{base}", &state.base_url),
        )
    } else if method == Method::GET && path.ends_with("/print/") {
        (state.behaviour.print_status, String::new())
    } else {
        (404, "not found".to_string())
    };

    (StatusCode::from_u16(status).unwrap(), body)
}

/// Config for the given base URL; counting path matches the mock.
pub fn config_for(base_url: &str) -> Config {
    let base_url = format!("{}/api", base_url);
    let mut config = Config::from_lookup(|name| match name {
        "ACCESS_TOKEN" => Some("secret".to_string()),
        "API_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    config.timeout = Duration::from_millis(500);
    config
}

/// Session with a few counted denominations and an operator.
pub fn counted_session(operator: &str) -> Session {
    let mut session = Session::new(Catalog::default(), "cash_count");
    session.set_operator(operator);
    session.ledger.set_count(20000, "2");
    session.ledger.set_count(50, "3");
    session
}

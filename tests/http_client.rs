//! Wire-format test for `HttpRemoteClient` against an in-process mock
//! Prometheus-compatible endpoint, built the way the teacher's
//! `tests/mock_coordinator.rs` builds its mock coordinator: bind
//! `127.0.0.1:0`, spawn `axum::serve` as a background task, hand back a
//! handle carrying the assigned port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use seriesprobe::client::{HttpRemoteClient, RemoteClient};

#[derive(Default)]
struct MockState {
    pushed_batches: Vec<Value>,
    query_response: Value,
    query_range_response: Value,
}

type SharedState = Arc<Mutex<MockState>>;

struct MockTsdb {
    base_url: String,
    state: SharedState,
}

impl MockTsdb {
    async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/api/v1/push", post(handle_push))
            .route("/api/v1/query", get(handle_query))
            .route("/api/v1/query_range", get(handle_query_range))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock tsdb");
        let addr: SocketAddr = listener.local_addr().expect("local addr");
        let base_url = format!("http://127.0.0.1:{}", addr.port());

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock tsdb server failed");
        });

        Self { base_url, state }
    }

    fn set_instant_response(&self, result: Value) {
        self.state.lock().unwrap().query_response = json!({
            "status": "success",
            "data": { "resultType": "vector", "result": result },
        });
    }

    fn set_range_response(&self, result: Value) {
        self.state.lock().unwrap().query_range_response = json!({
            "status": "success",
            "data": { "resultType": "matrix", "result": result },
        });
    }

    fn pushed_batches(&self) -> Vec<Value> {
        self.state.lock().unwrap().pushed_batches.clone()
    }
}

async fn handle_push(State(state): State<SharedState>, Json(body): Json<Value>) -> &'static str {
    state.lock().unwrap().pushed_batches.push(body);
    "ok"
}

async fn handle_query(State(state): State<SharedState>, Query(_params): Query<std::collections::HashMap<String, String>>) -> Json<Value> {
    Json(state.lock().unwrap().query_response.clone())
}

async fn handle_query_range(
    State(state): State<SharedState>,
    Query(_params): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    Json(state.lock().unwrap().query_range_response.clone())
}

fn client_for(mock: &MockTsdb) -> HttpRemoteClient {
    HttpRemoteClient::new(reqwest::Client::new(), mock.base_url.clone(), mock.base_url.clone())
}

#[tokio::test]
async fn write_series_posts_expected_json_shape() {
    use seriesprobe::types::{Series, Value as SeriesValue};

    let mock = MockTsdb::start().await;
    let client = client_for(&mock);
    let ctx = CancellationToken::new();

    let series = vec![Series {
        metric_name: "seriesprobe_sine_wave".to_string(),
        labels: vec![("series_id".to_string(), "0".to_string())],
        timestamp: 1000,
        value: SeriesValue::Sample(0.5),
    }];

    let status = client.write_series(&ctx, &series).await.unwrap();
    assert_eq!(status, 200);

    let batches = mock.pushed_batches();
    assert_eq!(batches.len(), 1);
    let posted = &batches[0][0];
    assert_eq!(posted["metric_name"], "seriesprobe_sine_wave");
    assert_eq!(posted["timestamp"], 1000);
    assert_eq!(posted["kind"], "sample");
    assert_eq!(posted["value"], 0.5);
}

#[tokio::test]
async fn query_decodes_vector_response() {
    let mock = MockTsdb::start().await;
    mock.set_instant_response(json!([
        { "value": [1000.0, "3.5"] }
    ]));
    let client = client_for(&mock);
    let ctx = CancellationToken::new();

    let points = client.query(&ctx, "sum(seriesprobe_sine_wave)", 1000).await.unwrap();
    assert_eq!(points, vec![(1000, 3.5)]);
}

#[tokio::test]
async fn query_range_decodes_and_sorts_matrix_response() {
    let mock = MockTsdb::start().await;
    mock.set_range_response(json!([
        { "values": [[1020.0, "2.0"], [1000.0, "1.0"]] }
    ]));
    let client = client_for(&mock);
    let ctx = CancellationToken::new();

    let points = client.query_range(&ctx, "sum(seriesprobe_sine_wave)", 1000, 1020, 20).await.unwrap();
    assert_eq!(points, vec![(1000, 1.0), (1020, 2.0)]);
}

#[tokio::test]
async fn query_surfaces_non_success_status_as_query_transport_error() {
    let mock = MockTsdb::start().await;
    mock.set_instant_response(Value::Null); // malformed: "status" field absent entirely
    let client = client_for(&mock);
    let ctx = CancellationToken::new();

    let result = client.query(&ctx, "sum(seriesprobe_sine_wave)", 1000).await;
    assert!(result.is_err());
}

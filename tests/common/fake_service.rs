//! In-process stand-in for the hosted project: SQL query endpoints with
//! scripted status codes, plus a tiny PostgREST surface over the tables the
//! "database" currently holds.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const PG_META_PATH: &str = "/pg-meta/default/query";
pub const RPC_PATH: &str = "/rest/v1/rpc/exec_sql";
pub const SLOW_PATH: &str = "/slow/query";

const TABLES: [&str; 4] = ["profile", "projects", "experiences", "skill_categories"];

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeState {
    pub requests: Vec<RecordedRequest>,
    /// Status returned by each SQL endpoint; unlisted endpoints answer 404.
    pub query_status: HashMap<String, u16>,
    pub tables: BTreeSet<String>,
    pub profiles: Vec<Value>,
}

impl FakeState {
    pub fn answer(&mut self, path: &str, status: u16) {
        self.query_status.insert(path.to_string(), status);
    }

    pub fn with_existing_tables(&mut self) {
        self.tables = TABLES.iter().map(|t| t.to_string()).collect();
    }

    pub fn with_profile(&mut self, row: Value) {
        self.profiles.push(row);
    }

    fn record(&mut self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        self.record_query(method, path, None, headers, body);
    }

    fn record_query(
        &mut self,
        method: &'static str,
        path: String,
        query: Option<String>,
        headers: &HeaderMap,
        body: Value,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.push(RecordedRequest {
            method,
            path,
            query,
            api_key: header("apikey"),
            authorization: header("authorization"),
            body,
        });
    }

    /// What a successful script does to the fake database.
    fn apply_script(&mut self) {
        self.with_existing_tables();
        if self.profiles.is_empty() {
            self.profiles.push(json!({
                "id": 1,
                "full_name": "Alex Chen",
                "title": "Full-stack Software Engineer",
                "hero_tagline": "Crafting digital experiences with purpose.",
                "available_for_work": true,
            }));
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeService {
    pub base_url: String,
    state: Shared,
}

impl FakeService {
    pub fn start(configure: impl FnOnce(&mut FakeState)) -> Self {
        let mut state = FakeState::default();
        configure(&mut state);
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route(PG_META_PATH, post(pg_meta_query))
            .route(RPC_PATH, post(rpc_query))
            .route(SLOW_PATH, post(slow_query))
            .route("/rest/v1/{table}", get(select_rows).post(insert_row))
            .with_state(state.clone());

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).expect("set nonblocking");
        let addr = listener.local_addr().expect("local addr");

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
                axum::serve(listener, app).await.expect("serve");
            });
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("lock").requests.clone()
    }

    pub fn profiles(&self) -> Vec<Value> {
        self.state.lock().expect("lock").profiles.clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn run_query(
    state: &Shared,
    path: &str,
    headers: &HeaderMap,
    body: Value,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().expect("lock");
    state.record("POST", path.to_string(), headers, body.clone());

    // exec_sql hands its argument to EXECUTE, which refuses transaction control.
    let executes_transaction_commands = path == RPC_PATH
        && body["sql_query"]
            .as_str()
            .is_some_and(|sql| sql.contains("BEGIN;") || sql.contains("COMMIT;"));
    if executes_transaction_commands {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "0A000",
                "message": "EXECUTE of transaction commands is not implemented",
            })),
        );
    }

    let status = state.query_status.get(path).copied().unwrap_or(404);
    let status = StatusCode::from_u16(status).expect("valid status");
    if status.is_success() {
        state.apply_script();
        (status, Json(json!([])))
    } else {
        (status, Json(json!({"message": format!("scripted {}", status.as_u16())})))
    }
}

async fn pg_meta_query(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    run_query(&state, PG_META_PATH, &headers, body)
}

async fn rpc_query(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    run_query(&state, RPC_PATH, &headers, body)
}

async fn slow_query(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    state
        .lock()
        .expect("lock")
        .record("POST", SLOW_PATH.to_string(), &headers, body);
    tokio::time::sleep(Duration::from_secs(5)).await;
    StatusCode::OK
}

async fn select_rows(
    State(state): State<Shared>,
    Path(table): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().expect("lock");
    state.record_query(
        "GET",
        format!("/rest/v1/{table}"),
        query,
        &headers,
        Value::Null,
    );

    if !state.tables.contains(&table) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("relation \"public.{table}\" does not exist")})),
        );
    }
    let rows = if table == "profile" {
        state.profiles.iter().take(1).cloned().collect()
    } else {
        Vec::new()
    };
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn insert_row(
    State(state): State<Shared>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut state = state.lock().expect("lock");
    state.record("POST", format!("/rest/v1/{table}"), &headers, body.clone());

    if table != "profile" || !state.tables.contains(&table) {
        return StatusCode::NOT_FOUND;
    }
    let mut row = body;
    row["id"] = json!(state.profiles.len() + 1);
    state.profiles.push(row);
    StatusCode::CREATED
}

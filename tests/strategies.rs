//! Strategy behaviour against a live HTTP endpoint.

mod common;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use common::FakeService;
use common::fake_service::{PG_META_PATH, RPC_PATH, SLOW_PATH};
use portfolio_schema::config::ProvisionConfig;
use portfolio_schema::provision::Provisioner;
use portfolio_schema::schema::SchemaBatch;
use portfolio_schema::strategy::{HttpQueryStrategy, SqlExecutor, StrategyError, build_client};
use url::Url;

fn strategy(service: &FakeService, path: &str, timeout: Duration) -> HttpQueryStrategy {
    let field = if path == RPC_PATH { "sql_query" } else { "query" };
    let strategy = HttpQueryStrategy::new(
        path,
        Url::parse(&service.url(path)).expect("url"),
        field,
        "key",
        build_client(timeout).expect("client"),
    );
    if path == RPC_PATH {
        strategy.without_transaction()
    } else {
        strategy
    }
}

/// Serves one request, answering with headers that promise more body than
/// is sent before the socket closes.
fn truncated_response_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read header");
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().expect("content length");
                }
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).expect("read body");

        let mut stream = reader.into_inner();
        let response = format!("{status_line}\r\nContent-Length: 500\r\n\r\npartial");
        stream.write_all(response.as_bytes()).expect("write");
    });

    format!("http://{addr}{PG_META_PATH}")
}

#[test]
fn test_timeout_moves_on_to_next_strategy() {
    let service = FakeService::start(|state| state.answer(RPC_PATH, 200));

    let provisioner = Provisioner::new(vec![
        Box::new(strategy(&service, SLOW_PATH, Duration::from_millis(500))),
        Box::new(strategy(&service, RPC_PATH, Duration::from_secs(5))),
    ]);

    let started = Instant::now();
    let application = provisioner.apply(&SchemaBatch::portfolio());

    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(matches!(
        application.attempts[0].result,
        Err(StrategyError::EndpointUnavailable(_))
    ));
    assert_eq!(application.applied_by(), Some(RPC_PATH));
}

#[test]
fn test_connection_refused_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let strategy = HttpQueryStrategy::new(
        "pg-meta",
        Url::parse(&format!("http://{addr}{PG_META_PATH}")).expect("url"),
        "query",
        "key",
        build_client(Duration::from_secs(2)).expect("client"),
    );
    let err = strategy.execute(&SchemaBatch::portfolio()).unwrap_err();
    assert!(matches!(err, StrategyError::EndpointUnavailable(_)));
}

#[test]
fn test_provisioner_from_config_hits_configured_endpoints() {
    let service = FakeService::start(|state| state.answer(RPC_PATH, 204));
    let base_url = service.base_url.clone();
    let config = ProvisionConfig::from_lookup(|name| match name {
        "SUPABASE_URL" => Some(base_url.clone()),
        "SUPABASE_KEY" => Some("key".to_string()),
        _ => None,
    })
    .expect("config");

    let application = Provisioner::from_config(&config)
        .expect("provisioner")
        .apply(&SchemaBatch::portfolio());

    assert_eq!(application.applied_by(), Some("rpc"));
    let requests = service.requests();
    let paths: Vec<&str> = requests.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, [PG_META_PATH, RPC_PATH]);

    let pg_meta_sql = requests[0].body["query"].as_str().expect("query field");
    assert!(pg_meta_sql.starts_with("BEGIN;"));
    let rpc_sql = requests[1].body["sql_query"].as_str().expect("sql_query field");
    assert!(!rpc_sql.contains("BEGIN;"));
    assert!(!rpc_sql.contains("COMMIT;"));
    assert!(rpc_sql.contains("CREATE TABLE IF NOT EXISTS profile"));
}

#[test]
fn test_rpc_with_transaction_wrapper_is_refused() {
    let service = FakeService::start(|state| state.answer(RPC_PATH, 200));
    let wrapped = HttpQueryStrategy::new(
        "rpc",
        Url::parse(&service.url(RPC_PATH)).expect("url"),
        "sql_query",
        "key",
        build_client(Duration::from_secs(5)).expect("client"),
    );

    let err = wrapped.execute(&SchemaBatch::portfolio()).unwrap_err();
    assert!(err.to_string().contains("HTTP 400"));
    assert!(err.to_string().contains("transaction commands"));

    let bare = strategy(&service, RPC_PATH, Duration::from_secs(5));
    assert!(bare.execute(&SchemaBatch::portfolio()).is_ok());
}

#[test]
fn test_unreadable_body_is_reported() {
    let endpoint = truncated_response_server("HTTP/1.1 502 Bad Gateway");
    let strategy = HttpQueryStrategy::new(
        "pg-meta",
        Url::parse(&endpoint).expect("url"),
        "query",
        "key",
        build_client(Duration::from_secs(5)).expect("client"),
    );

    let err = strategy.execute(&SchemaBatch::portfolio()).unwrap_err();
    assert!(matches!(err, StrategyError::EndpointUnavailable(_)));
    assert!(err.to_string().contains("HTTP 502"));
    assert!(err.to_string().contains("failed to read response body"));
}

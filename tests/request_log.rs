//! Request logging at the default `info` level.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use idea_gateway::http_server::router;
use idea_gateway::runtime::{RuntimeError, UserRuntime};
use idea_gateway::state::AppState;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

struct NoUsers;

#[async_trait]
impl UserRuntime for NoUsers {
    async fn list_users(&self) -> Vec<String> {
        Vec::new()
    }

    async fn create_user(&self, _id: &str, _password: &str) -> Result<(), RuntimeError> {
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), RuntimeError> {
        Err(RuntimeError::CommandFailed {
            stderr: format!("Error response from daemon: No such container: idea-{}\n", id),
        })
    }
}

/// Log sink shared with the subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

impl Captured {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[tokio::test]
async fn test_each_request_logs_one_info_line() {
    let (captured, _guard) = capture();

    let app = router(AppState::new(Arc::new(NoUsers), "idea123"));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].contains("GET"), "{:?}", lines);
    assert!(lines[0].contains("/api/users"), "{:?}", lines);
    assert!(lines[0].contains("status=200"), "{:?}", lines);
}

#[tokio::test]
async fn test_runtime_failure_adds_no_log_line() {
    let (captured, _guard) = capture();

    let app = router(AppState::new(Arc::new(NoUsers), "idea123"));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/users/ghost")
                .body(Body::from(r#"{"password":"idea123"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{:?}", lines);
    assert!(lines[0].contains("status=500"), "{:?}", lines);
}

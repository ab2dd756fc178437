//! # HTTP Front End
//!
//! JSON control surface. Every response is `{"response": "<text>"}` with
//! status 200, including NACKs.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use super::SessionController;
use crate::error::Result;
use crate::protocol::Envelope;

type Shared = State<Arc<SessionController>>;

/// Routes of the control surface
pub fn router(controller: Arc<SessionController>) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/start_test", post(start_test))
        .route("/stop_op25", post(stop_op25))
        .route("/get_output", get(get_output))
        .route("/get_config", get(get_config))
        .route("/write_config", post(write_config))
        .with_state(controller)
}

/// Serve the control surface on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, controller: Arc<SessionController>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("HTTP control surface listening on {}", addr);
    }

    axum::serve(listener, router(controller))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn hello(State(controller): Shared) -> Json<Envelope> {
    Json(controller.hello().into())
}

async fn start_test(State(controller): Shared) -> Json<Envelope> {
    Json(controller.start_test().await.into())
}

async fn stop_op25(State(controller): Shared) -> Json<Envelope> {
    Json(controller.stop_op25().await.into())
}

async fn get_output(State(controller): Shared) -> Json<Envelope> {
    Json(controller.get_output().await.into())
}

async fn get_config(State(controller): Shared) -> Json<Envelope> {
    Json(controller.get_config().await.into())
}

/// Raw body so that non-JSON requests still get an envelope back
async fn write_config(State(controller): Shared, body: Bytes) -> Json<Envelope> {
    Json(controller.write_config(&body).await.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MockVolumeControl;
    use crate::config::Config;
    use crate::session::MockSessionManager;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const TRUNK_TSV: &str = "\"Sysname\"\t\"Control Channel List\"\t\"TGID Tags File\"\t\"NAC\"\n\
\"County P25\"\t\"851.0125\"\t\"county.tsv\"\t\"0x125\"\n";

    fn app(dir: &TempDir, sessions: MockSessionManager) -> Router {
        std::fs::write(dir.path().join("trunk.tsv"), TRUNK_TSV).unwrap();
        let mut config = Config::default();
        config.receiver.working_dir = dir.path().to_path_buf();

        let controller = SessionController::new(&config, Arc::new(sessions), Arc::new(MockVolumeControl::new()));
        router(Arc::new(controller))
    }

    async fn call(app: Router, method: Method, uri: &str, body: &'static str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let envelope: Envelope = serde_json::from_slice(&bytes).unwrap();
        (status, envelope.response)
    }

    #[tokio::test]
    async fn test_hello() {
        let dir = TempDir::new().unwrap();
        let (status, response) = call(app(&dir, MockSessionManager::new()), Method::GET, "/hello", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, "ACK: HELLO");
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let dir = TempDir::new().unwrap();
        let mut sessions = MockSessionManager::new();
        sessions.expect_stop().returning(|_| Ok(()));
        sessions.expect_is_alive().returning(|_| Ok(false));
        sessions.expect_start().times(1).returning(|_, _| Ok(()));
        let app = app(&dir, sessions);

        let (_, response) = call(app.clone(), Method::POST, "/start_test", "").await;
        assert_eq!(response, "ACK: OP25 started");

        let (_, response) = call(app, Method::POST, "/stop_op25", "").await;
        assert_eq!(response, "ACK: OP25 stopped");
    }

    #[tokio::test]
    async fn test_get_config() {
        let dir = TempDir::new().unwrap();
        let (_, response) = call(app(&dir, MockSessionManager::new()), Method::GET, "/get_config", "").await;
        assert_eq!(
            response,
            "Control Channel List: 851.0125 Sysname: County P25 Talkgroup List Name: county.tsv"
        );
    }

    #[tokio::test]
    async fn test_write_config() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, MockSessionManager::new());

        let body = r#"{"Control_Channel_List":"851.0125","Sysname":"TestSys","Talkgroup_List_Name":"tg.tsv"}"#;
        let (status, response) = call(app.clone(), Method::POST, "/write_config", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, "ACK: Config updated");

        let written = std::fs::read_to_string(dir.path().join("trunk.tsv")).unwrap();
        assert_eq!(
            written,
            "\"Sysname\"\t\"Control Channel List\"\t\"TGID Tags File\"\t\"NAC\"\n\
\"TestSys\"\t\"851.0125\"\t\"tg.tsv\"\t\"0x125\"\n"
        );

        let (status, response) = call(app, Method::POST, "/write_config", "garbage").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, "NACK: No JSON data received");
    }

    #[tokio::test]
    async fn test_get_output_failure_is_enveloped() {
        let dir = TempDir::new().unwrap();
        let mut sessions = MockSessionManager::new();
        sessions
            .expect_capture_output()
            .returning(|_| Err(crate::error::ControlError::Session("no session".into())));

        let (status, response) = call(app(&dir, sessions), Method::GET, "/get_output", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.starts_with("NACK: Error getting output - "));
    }
}

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use relaychat::providers::{FakeProvider, Provider};
use relaychat::server::{self, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[allow(dead_code)]
pub const CHAT_MODEL: &str = "models/test-chat";
#[allow(dead_code)]
pub const PING_MODEL: &str = "models/test-ping";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Relay state around a fake provider, returned alongside the provider handle
#[allow(dead_code)]
pub fn fake_state(provider: FakeProvider) -> (Arc<AppState>, FakeProvider) {
    let handle = provider.clone();
    let provider: Arc<dyn Provider> = Arc::new(provider);
    (
        Arc::new(AppState::new(provider, CHAT_MODEL, PING_MODEL)),
        handle,
    )
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

/// A relay serving on an ephemeral local port
#[allow(dead_code)]
pub struct RunningRelay {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl RunningRelay {
    pub async fn start(state: Arc<AppState>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind listener");
        let addr = listener.local_addr().expect("listener has no address");
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server::serve(listener, state, async {
                let _ = rx.await;
            })
            .await
            .expect("relay failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            shutdown: Some(tx),
            handle,
        }
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

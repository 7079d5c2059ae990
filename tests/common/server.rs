//! Local feed server lifecycle
//!
//! Serves canned CSV bodies over real HTTP so the blocking client can be
//! exercised end to end. The server runs on its own tokio runtime thread;
//! tests stay synchronous.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::net::TcpListener;

#[derive(Clone)]
struct FeedRoutes {
    routes: Arc<Vec<(String, String)>>,
    requests: Arc<Mutex<Vec<String>>>,
}

/// Each request is answered by the first route whose needle appears in the
/// request target; anything else gets a 404.
async fn serve_route(State(state): State<FeedRoutes>, uri: Uri) -> (StatusCode, String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.requests.lock().unwrap().push(target.clone());

    match state
        .routes
        .iter()
        .find(|(needle, _)| target.contains(needle.as_str()))
    {
        Some((_, body)) => (StatusCode::OK, body.clone()),
        None => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

/// Test feed server on a random local port
///
/// When dropped, the server shuts down gracefully and its thread is joined.
pub struct TestFeedServer {
    /// Base URL for the feed client (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

#[allow(dead_code)]
impl TestFeedServer {
    /// Spawns the server and returns once it is accepting connections.
    ///
    /// # Panics
    ///
    /// Panics if the runtime cannot be built or the port cannot be bound.
    pub fn spawn(routes: Vec<(String, String)>) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FeedRoutes {
            routes: Arc::new(routes),
            requests: requests.clone(),
        };
        let app = Router::new().fallback(serve_route).with_state(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let (port_tx, port_rx) = mpsc::channel::<u16>();

        let handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to build test runtime");

            runtime.block_on(async move {
                let listener = TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("Failed to bind to random port");
                let port = listener
                    .local_addr()
                    .expect("Failed to get local address")
                    .port();
                port_tx.send(port).expect("Test thread went away");

                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        shutdown_rx.await.ok();
                    })
                    .await
                    .expect("Server failed");
            });
        });

        // The listener is bound before the port is sent, so connections queue.
        let port = port_rx.recv().expect("Test feed server failed to start");

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestFeedServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

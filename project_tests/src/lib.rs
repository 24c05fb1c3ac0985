//! # Integration Test Fixtures
//!
//! Shared helpers for the `tests/` suites: a local stub HTTP server standing in
//! for the rate API, a log sink for asserting on `tracing` output, and a
//! ready-made loading-screen document.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::{header, StatusCode, Uri};
use axum::Router;
use lib_splash::core::orchestrator::{LOADING_SCREEN_ID, MOUNT_POINT_ID, STATUS_TEXT_ID};
use lib_splash::dom::{MemoryDocument, MemoryElement};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing_subscriber::fmt::MakeWriter;

/// A local HTTP server answering every request with one canned response.
pub struct StubServer {
    addr: SocketAddr,
    paths: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Starts the server on an ephemeral port.
    pub async fn start(status: StatusCode, body: &str) -> anyhow::Result<Self> {
        let paths = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&paths);
        let body = body.to_string();

        let app = Router::new().fallback(move |uri: Uri| {
            let seen = Arc::clone(&seen);
            let body = body.clone();
            async move {
                seen.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(uri.path().to_string());
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, paths, task })
    }

    /// Base URL with a trailing slash, e.g. `http://127.0.0.1:40123/v4/latest/`.
    pub fn url(&self, prefix: &str) -> String {
        format!("http://{}/{}", self.addr, prefix)
    }

    /// Paths requested so far.
    pub fn paths(&self) -> Vec<String> {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// In-memory sink for formatted `tracing` output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// A subscriber writing every event at any level into this sink.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }

    /// Everything captured so far.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A document with the three elements the orchestrator looks for.
pub struct LoadingPage {
    /// The document itself.
    pub document: Arc<MemoryDocument>,
    /// `#initial-loading-text`.
    pub status_text: Arc<MemoryElement>,
    /// `#initial-loading-screen`.
    pub screen: Arc<MemoryElement>,
    /// `#root`, initially empty.
    pub mount: Arc<MemoryElement>,
}

impl LoadingPage {
    /// Builds the page with `initial_text` in the status element.
    pub fn new(initial_text: &str) -> Self {
        let document = Arc::new(MemoryDocument::new());
        let status_text = document.insert(STATUS_TEXT_ID, initial_text);
        let screen = document.insert(LOADING_SCREEN_ID, "");
        let mount = document.insert(MOUNT_POINT_ID, "");
        Self {
            document,
            status_text,
            screen,
            mount,
        }
    }
}

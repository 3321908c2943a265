//! Debug server
//!
//! HTTP boundary around the breakpoint registry. A paused client holds a
//! `POST /break` request open; the request completes when the breakpoint is
//! resumed.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::breakpoints::PauseRegistry;
use crate::routes;
use crate::state::AppState;

/// HTTP server that handles client breakpoint connections
pub struct DebugServer {
    state: AppState,
}

impl DebugServer {
    pub fn new(registry: Arc<dyn PauseRegistry>) -> Self {
        Self {
            state: AppState::new(registry),
        }
    }

    /// Build the full router
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::breakpoints::router())
            .nest("/health", routes::health::router())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn run<F>(self, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Every paused caller is released at shutdown, including callers whose
    /// entry was replaced, so none of them holds the shutdown open.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let registry = Arc::clone(self.state.registry());
        let app = self.router();

        tracing::info!("Debug server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                let released = registry.release_all();
                if released > 0 {
                    tracing::info!(count = released, "Released pending breakpoints for shutdown");
                }
            })
            .await?;

        tracing::info!("Debug server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::breakpoints::BreakpointStore;
    use tokio::sync::oneshot;

    /// A debug server running on an ephemeral local port
    pub struct RunningServer {
        pub addr: SocketAddr,
        pub registry: Arc<BreakpointStore>,
        stop: Option<oneshot::Sender<()>>,
        task: tokio::task::JoinHandle<std::io::Result<()>>,
    }

    impl RunningServer {
        pub async fn start() -> Self {
            let registry = Arc::new(BreakpointStore::new());
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (stop, stopped) = oneshot::channel::<()>();

            let server = DebugServer::new(registry.clone());
            let task = tokio::spawn(server.serve(listener, async move {
                let _ = stopped.await;
            }));

            Self {
                addr,
                registry,
                stop: Some(stop),
                task,
            }
        }

        pub fn url(&self) -> String {
            format!("http://{}", self.addr)
        }

        pub async fn shutdown(mut self) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
            self.task.await.unwrap().unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RunningServer;
    use crate::breakpoints::{BreakpointContext, PauseRegistry};
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_releases_pending_breakpoints() {
        let server = RunningServer::start().await;
        let url = format!("{}/break", server.url());

        let paused = tokio::spawn(async move {
            reqwest::Client::new()
                .post(url)
                .json(&BreakpointContext::new("bp-shutdown", "T", "m"))
                .send()
                .await
                .map(|r| r.status())
        });

        while server.registry.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let registry = server.registry.clone();
        server.shutdown().await;

        assert!(registry.is_empty());
        assert!(paused.await.unwrap().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let server = RunningServer::start().await;

        let body: serde_json::Value = reqwest::get(format!("{}/health", server.url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["activeBreakpoints"], 0);
        server.shutdown().await;
    }
}

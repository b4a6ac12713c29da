//! HTTP server runtime.
//!
//! # Responsibilities
//! - Wrap the configured router with request tracing
//! - Serve it on a bound listener
//! - Stop gracefully on the shutdown broadcast

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

/// HTTP server for a configured router.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(router: Router) -> Self {
        Self {
            router: router.layer(TraceLayer::new_for_http()),
        }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

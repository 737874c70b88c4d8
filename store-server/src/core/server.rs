//! HTTP server bootstrap

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::core::{Config, ServerState};

/// HTTP server wrapper
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Build the router and serve until shutdown
    pub async fn run(self) -> anyhow::Result<()> {
        let app = api::router()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, app).await?;
        Ok(())
    }
}

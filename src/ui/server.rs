//! Axum web server wiring
//!
//! Exposes the three role WebSocket endpoints and the status API, and
//! optionally serves the operator frontend as static files. CORS is open
//! for development consoles on other origins.

use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::relay::Relay;
use crate::ui::{handlers, websocket};

/// State shared by all handlers
pub struct AppState {
    pub relay: Arc<Relay>,
    pub started_at: DateTime<Utc>,
}

/// HTTP/WebSocket front end of the relay
pub struct WebServer {
    config: ServerConfig,
    relay: Arc<Relay>,
}

impl WebServer {
    pub fn new(config: ServerConfig, relay: Arc<Relay>) -> Self {
        Self { config, relay }
    }

    /// Build the axum application
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState {
            relay: self.relay.clone(),
            started_at: Utc::now(),
        });

        let mut app = Router::new()
            .route("/api/status", get(handlers::get_status))
            .route("/ws/player", get(websocket::player_ws))
            .route("/ws/controller", get(websocket::controller_ws))
            .route("/ws/master", get(websocket::master_ws))
            .with_state(state)
            .layer(CorsLayer::permissive());

        if let Some(dir) = &self.config.frontend_dir {
            let index = dir.join("index.html");
            app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
        }

        app
    }

    /// Bind and serve until the process exits
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::BindFailed {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("Web server listening on {}", addr);

        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Terminated(e.to_string()))
    }

    /// Run the server on a background task
    pub fn start_background(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                tracing::error!("Web server failed: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_status_route() {
        let server = WebServer::new(ServerConfig::default(), Arc::new(Relay::new()));
        let app = server.router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["players_connected"], 0);
        assert_eq!(value["data"]["master_active"], false);
        assert_eq!(value["data"]["status"], "online");
    }
}

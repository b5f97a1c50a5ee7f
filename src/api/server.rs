//! API server using Axum
//!
//! Serves the proxy check endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{CheckerError, Result};
use crate::probe::Probe;

use super::middleware::cors_layer;
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub probe: Arc<dyn Probe>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, probe: Arc<dyn Probe>) -> Self {
        Self {
            config: Arc::new(config),
            probe,
            started_at: Instant::now(),
        }
    }
}

/// API server
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Config, probe: Arc<dyn Probe>) -> Self {
        Self {
            state: AppState::new(config, probe),
        }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        let api = &self.state.config.api;
        let cors = cors_layer(&api.cors_origins);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TimeoutLayer::new(Duration::from_secs(api.request_timeout.max(1))))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = self.state.config.api_addr().parse().map_err(|_| {
            CheckerError::InvalidConfig(format!(
                "Invalid API server address: {}",
                self.state.config.api_addr()
            ))
        })?;

        let router = self.build_router();

        info!(
            "API server listening on {} (probe: {})",
            addr,
            self.state.probe.name()
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| CheckerError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{test_config, MockProbe};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_check_with_layers() {
        let probe = Arc::new(MockProbe::dead(Some(64500)));
        let server = ApiServer::new(test_config(), probe.clone());

        let response = server
            .build_router()
            .oneshot(
                Request::builder()
                    .uri("/check?ip=1.2.3.4:8080")
                    .header("Origin", "https://checker.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap()
                .to_str()
                .unwrap(),
            "*"
        );
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_router_unknown_route() {
        let server = ApiServer::new(test_config(), Arc::new(MockProbe::failing("unused")));

        let response = server
            .build_router()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_rejects_bad_address() {
        let mut config = test_config();
        config.api.host = "not an address".to_string();
        let server = ApiServer::new(config, Arc::new(MockProbe::failing("unused")));

        let (_tx, rx) = watch::channel(false);
        let err = server.run(rx).await.unwrap_err();
        assert!(matches!(err, CheckerError::InvalidConfig(_)));
    }
}

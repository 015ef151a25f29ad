//! HTTP server for Sharebox.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::{FileStorage, QuotaGuard};
use crate::{Database, Result, ShareboxError};

use super::handlers::AppState;
use super::middleware::{JwtState, RateLimitState};
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server from the loaded config and an open database.
    pub fn new(config: &Config, db: Arc<Database>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ShareboxError::Config(format!("invalid server address: {e}")))?;

        let storage = FileStorage::new(&config.files.storage_path)?;
        tracing::info!("File storage initialized at: {}", config.files.storage_path);

        let app_state = AppState::new(
            db,
            storage,
            QuotaGuard::from_config(&config.files),
            config.auth.clone(),
        );

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&config.auth.jwt_secret)),
            rate_limit: Arc::new(
                RateLimitState::new(config.server.login_rate_limit)
                    .with_trust_proxy_headers(config.server.trust_proxy_headers),
            ),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router without binding a socket.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            self.rate_limit.clone(),
            &self.cors_origins,
        )
    }

    async fn bind(self) -> std::io::Result<(TcpListener, Router)> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;

        self.rate_limit.clone().start_cleanup_task();
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Run the web server until the shutdown future resolves.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let (listener, router) = self.bind().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Useful for tests that bind to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

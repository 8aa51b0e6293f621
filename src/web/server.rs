//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::SessionVerifier;
use crate::config::Config;
use crate::mail::Mailer;
use crate::{Database, Result, VerigateError};

use super::handlers::AppState;
use super::middleware::{RateLimitState, SessionState};
use super::router::{create_health_router, create_router};

/// Serves the API on the configured address.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    session_state: Arc<SessionState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    pub fn new(config: &Config, db: Database, mailer: Arc<dyn Mailer>) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| VerigateError::Config(format!("invalid server address: {}", e)))?;

        let verifier = SessionVerifier::from_config(&config.session);
        if !verifier.is_configured() {
            tracing::warn!("No session secret configured; all authenticated requests will be rejected");
        }

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(db, config, mailer)),
            session_state: Arc::new(SessionState::new(
                Arc::new(verifier),
                config.session.cookie_name.clone(),
            )),
            rate_limit: Arc::new(RateLimitState::new(config.server.auth_rate_limit)),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The full application router, as served.
    pub fn router(&self) -> axum::Router {
        create_router(
            self.app_state.clone(),
            self.session_state.clone(),
            self.rate_limit.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router, SocketAddr)> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        self.rate_limit.clone().start_cleanup_task();
        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, router, local_addr))
    }

    /// Serve until the process exits.
    pub async fn run(self) -> Result<()> {
        let (listener, router, _) = self.bind().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// Serve in the background and return the bound address.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

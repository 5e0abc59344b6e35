//! HTTP server using Axum
//!
//! Serves the demo endpoints and the `/ws` push channel.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::{Config, ServerConfig};
use crate::error::{AppError, Result};
use crate::metrics::Metrics;
use crate::realtime::ConnectionRegistry;
use crate::store::StoreHandle;

use super::routes;

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: StoreHandle,
    pub registry: ConnectionRegistry,
    pub metrics: Metrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        store: StoreHandle,
        registry: ConnectionRegistry,
        metrics: Metrics,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            metrics,
            started_at: Instant::now(),
        }
    }
}

/// HTTP server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new HTTP server
    pub fn new(state: AppState) -> Self {
        Self {
            config: state.config.server.clone(),
            state,
        }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the listening socket
    pub fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                AppError::InvalidConfig(format!(
                    "invalid listen address {}:{}",
                    self.config.host, self.config.port
                ))
            })?;

        bind_reusable(addr)
    }

    /// Serve on an already bound listener until `shutdown` flips
    #[instrument(skip_all)]
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;

        info!("HTTP server shut down");
        Ok(())
    }
}

/// Router with the outer layers applied
pub fn build_router(state: AppState) -> Router {
    routes::create_router(state)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Bind with SO_REUSEADDR and, on unix, SO_REUSEPORT
fn bind_reusable(addr: SocketAddr) -> Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    socket.set_reuseaddr(true)?;
    #[cfg(unix)]
    socket.set_reuseport(true)?;

    socket.bind(addr)?;
    Ok(socket.listen(1024)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_reusable_allows_second_listener() {
        let first = bind_reusable("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();

        #[cfg(unix)]
        {
            let second = bind_reusable(addr).unwrap();
            assert_eq!(second.local_addr().unwrap(), addr);
        }
        #[cfg(not(unix))]
        let _ = addr;
    }
}

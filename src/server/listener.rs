//! Watch party server listener
//!
//! Serves `/viewer` and `/controller` WebSocket endpoints over plaintext or
//! TLS and runs the coordinator alongside.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::config::ServerConfig;
use super::socket::SessionShared;
use super::{controller, viewer};
use crate::coordinator::{Coordinator, CoordinatorHandle};
use crate::dispatch::ViewerHub;
use crate::error::Result;
use crate::sync::SyncConfig;

/// Watch party server
pub struct WatchPartyServer {
    config: ServerConfig,
    coordinator: Coordinator,
    handle: CoordinatorHandle,
    listener: Handle,
}

impl WatchPartyServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let hub = ViewerHub::new(config.kick_grace);
        let sync = SyncConfig::default().epsilon(config.epsilon);
        let (coordinator, handle) = Coordinator::new(hub, sync, config.event_capacity);

        Self {
            config,
            coordinator,
            handle,
            listener: Handle::new(),
        }
    }

    /// Handle for sending events to this server's coordinator
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.handle
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Resolves to the bound address once the server is listening
    pub fn listening(&self) -> impl Future<Output = Option<SocketAddr>> {
        let listener = self.listener.clone();
        async move { listener.listening().await }
    }

    /// Run the server until `shutdown` resolves
    ///
    /// On shutdown every open connection is told to reconnect and closed;
    /// this returns once they are gone or the shutdown grace has passed.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let WatchPartyServer {
            config,
            coordinator,
            handle,
            listener,
        } = self;

        let coordinator_task = tokio::spawn(coordinator.run());

        let (stop_tx, stop_rx) = watch::channel(false);
        let (alive_tx, mut alive_rx) = mpsc::channel::<()>(1);
        let app = router(SessionShared {
            coordinator: handle,
            shutdown: stop_rx,
            alive: alive_tx,
        });

        let server = serve(config.clone(), app, listener.clone());
        tokio::pin!(server);

        tracing::info!(
            addr = %config.bind_addr,
            scheme = config.scheme(),
            "Watch party server listening"
        );

        let (result, deadline) = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                let deadline = Instant::now() + config.shutdown_grace;
                stop_tx.send_replace(true);
                listener.graceful_shutdown(Some(config.shutdown_grace));
                (server.await, deadline)
            }
            result = &mut server => {
                stop_tx.send_replace(true);
                (result, Instant::now() + config.shutdown_grace)
            }
        };

        // Sessions hold `alive` until their socket is closed; one grace
        // period covers both the listener and the sessions
        if tokio::time::timeout_at(deadline, alive_rx.recv())
            .await
            .is_err()
        {
            tracing::warn!("Connections still open after shutdown grace");
        }

        coordinator_task.abort();
        tracing::info!("Watch party server stopped");
        result
    }
}

fn router(shared: SessionShared) -> Router {
    Router::new()
        .route("/viewer", get(viewer_upgrade))
        .route("/controller", get(controller_upgrade))
        .with_state(shared)
}

async fn serve(config: ServerConfig, app: Router, listener: Handle) -> Result<()> {
    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    match config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            axum_server::bind_rustls(config.bind_addr, rustls)
                .handle(listener)
                .serve(service)
                .await?;
        }
        None => {
            axum_server::bind(config.bind_addr)
                .handle(listener)
                .serve(service)
                .await?;
        }
    }
    Ok(())
}

async fn viewer_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(shared): State<SessionShared>,
) -> Response {
    ws.on_upgrade(move |socket| viewer::run(socket, peer, shared))
}

async fn controller_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(shared): State<SessionShared>,
) -> Response {
    ws.on_upgrade(move |socket| controller::run(socket, peer, shared))
}

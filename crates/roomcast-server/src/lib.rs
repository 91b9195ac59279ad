//! Roomcast production server.
//!
//! Production glue around [`roomcast_core`]'s sans-IO room logic: axum serves
//! the WebSocket endpoint, each room runs as a single actor task processing
//! commands serially, and [`SystemEnv`] supplies real time and randomness.
//!
//! # Architecture
//!
//! - `RoomDriver` (core): lifecycle handler and broadcast engine, pure logic
//! - `room`: actor that executes driver actions and implements hibernation
//!   (drop the driver, keep the sockets, resume from attachments)
//! - `router`: room-name-to-actor resolution
//! - `session`: per-socket frame pumping
//!
//! # Endpoint
//!
//! `GET /rooms/{room}` with `Upgrade: websocket` joins the named room. A
//! request without the upgrade header is answered 426, a non-GET request 405,
//! both with plain-text bodies and no room state touched. Clients send raw
//! text frames; the server fans each one out to every member of the room as a
//! JSON envelope tagged with sender identity and timestamp.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod room;
mod router;
mod session;
mod system_env;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{FromRequestParts, Path, Request, State, ws::WebSocketUpgrade},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
pub use config::RuntimeConfig;
pub use error::ServerError;
use roomcast_core::{NegotiationError, SocketId, UpgradeRequest, env::Environment};
use router::RoomMap;
pub use system_env::SystemEnv;
use tokio::sync::mpsc;

/// Shared state for request handlers.
#[derive(Clone)]
struct AppState {
    env: SystemEnv,
    rooms: Arc<RoomMap<SystemEnv>>,
    send_queue: usize,
}

/// Build the relay's router.
pub fn app(config: &RuntimeConfig) -> Router {
    let env = SystemEnv::new();
    let state = AppState {
        rooms: Arc::new(RoomMap::new(env.clone(), config.hibernate_after)),
        env,
        send_queue: config.send_queue,
    };

    Router::new()
        .route("/rooms/{room}", any(room_handler))
        .with_state(state)
}

/// Production roomcast server.
///
/// Wraps the router with a bound TCP listener. Construct with
/// [`Server::bind`], then [`Server::run`] until shutdown.
pub struct Server {
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Server {
    /// Create and bind a new server.
    pub async fn bind(config: RuntimeConfig) -> Result<Self, ServerError> {
        if config.send_queue == 0 {
            return Err(ServerError::Config(
                "send queue capacity must be nonzero".to_owned(),
            ));
        }

        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Transport(format!("failed to bind '{}': {e}", config.bind_address))
            })?;

        Ok(Self {
            listener,
            router: app(&config),
        })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Transport(format!("failed to get local address: {e}")))
    }

    /// Serve connections until shutdown or an I/O error.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router)
            .await
            .map_err(ServerError::from)
    }
}

/// Handle any request to `/rooms/{room}`.
///
/// Negotiation happens against the raw method and `Upgrade` header so
/// rejections carry the relay's own status codes and bodies, not the
/// framework's. Only after the room accepts the connection does the WebSocket
/// handshake complete.
async fn room_handler(
    Path(room): Path<String>,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let method = request.method().as_str().to_owned();
    let upgrade_header = request
        .headers()
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let negotiation = UpgradeRequest::new(&method, upgrade_header.as_deref());
    if let Err(error) = negotiation.negotiate() {
        return negotiation_response(&error);
    }

    let (mut parts, _body) = request.into_parts();
    let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::debug!(room, error = %rejection, "websocket handshake rejected");
            return (StatusCode::BAD_REQUEST, "Malformed WebSocket handshake").into_response();
        }
    };

    let socket = SocketId::new(state.env.random_u64());
    let (outbound_tx, outbound_rx) = mpsc::channel(state.send_queue);
    let handle = state.rooms.resolve(&room).await;

    match handle
        .accept(socket, method, upgrade_header, outbound_tx)
        .await
    {
        Some(Ok(())) => upgrade
            .on_upgrade(move |ws| session::run(ws, socket, handle, outbound_rx))
            .into_response(),
        Some(Err(error)) => negotiation_response(&error),
        None => {
            tracing::warn!(room, "room actor unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Room unavailable").into_response()
        }
    }
}

fn negotiation_response(error: &NegotiationError) -> Response {
    match error {
        NegotiationError::UpgradeRequired => {
            (StatusCode::UPGRADE_REQUIRED, "Expected Upgrade: websocket").into_response()
        }
        NegotiationError::MethodNotAllowed(_) => {
            (StatusCode::METHOD_NOT_ALLOWED, "Expected GET").into_response()
        }
    }
}

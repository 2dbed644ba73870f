use std::future::IntoFuture;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::watch;

use crate::{ClientRegistry, TransportError, WireMessage};

/// Time allowed for in-flight sends once shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Time to wait for the server thread before giving up on it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Listening endpoint for the broadcast server.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub host: String,
    pub port: u16,
}

/// Owning handle for the websocket server.
///
/// The server runs an accept loop on its own thread with a current-thread
/// runtime, independent of the transcription worker. There is no process-wide
/// server state; dropping the handle without [`BroadcastServer::shutdown`]
/// leaves the thread to die with the process.
pub struct BroadcastServer {
    registry: ClientRegistry,
    shutdown: watch::Sender<bool>,
    done: std::sync::mpsc::Receiver<()>,
    thread: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl BroadcastServer {
    /// Bind and start serving. Bind failures surface synchronously as
    /// [`TransportError::Bind`].
    pub fn start(config: &BroadcastConfig) -> crate::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = std::net::TcpListener::bind(&addr).map_err(|source| {
            TransportError::Bind {
                addr: addr.clone(),
                source,
            }
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        let registry = ClientRegistry::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let thread_registry = registry.clone();
        let thread = std::thread::Builder::new()
            .name("broadcast-server".into())
            .spawn(move || serve_blocking(listener, thread_registry, shutdown_rx, done_tx))
            .map_err(|e| TransportError::ServerStart(e.to_string()))?;

        tracing::info!(%local_addr, "broadcast server listening");

        Ok(Self {
            registry,
            shutdown: shutdown_tx,
            done: done_rx,
            thread: Some(thread),
            local_addr,
        })
    }

    /// Registry handle for publishing from the transcription worker.
    pub fn registry(&self) -> ClientRegistry {
        self.registry.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serialize and fan out one message to current subscribers.
    pub fn publish(&self, message: &WireMessage) {
        self.registry.publish(message);
    }

    /// Stop accepting, give in-flight sends a bounded grace period, then
    /// force-close whatever is left. Never blocks longer than
    /// `SHUTDOWN_TIMEOUT`; a timeout is logged, not retried.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        match self.done.recv_timeout(SHUTDOWN_TIMEOUT) {
            Ok(()) => {
                if let Some(thread) = self.thread.take() {
                    let _ = thread.join();
                }
                tracing::info!("broadcast server stopped");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = SHUTDOWN_TIMEOUT.as_millis() as u64,
                    "broadcast server did not stop in time, abandoning thread"
                );
            }
        }
    }
}

fn serve_blocking(
    listener: std::net::TcpListener,
    registry: ClientRegistry,
    mut shutdown: watch::Receiver<bool>,
    done: std::sync::mpsc::Sender<()>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to build broadcast runtime");
            let _ = done.send(());
            return;
        }
    };

    runtime.block_on(async {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "failed to adopt broadcast listener");
                return;
            }
        };

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .with_state(registry.clone());

        tokio::select! {
            result = axum::serve(listener, app).into_future() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "broadcast server failed");
                }
            }
            _ = shutdown.changed() => {
                // Closing the registry ends every connection forwarder; the
                // grace period lets their final sends drain before the
                // runtime is torn down.
                registry.close_all();
                tokio::time::sleep(SHUTDOWN_GRACE).await;
            }
        }
    });

    // Dropping the runtime force-closes any connection still open.
    drop(runtime);
    let _ = done.send(());
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(registry): State<ClientRegistry>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_loop(socket, registry))
}

async fn client_loop(socket: WebSocket, registry: ClientRegistry) {
    let (mut sink, mut stream) = socket.split();

    let ack = match WireMessage::connected().to_json() {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode connection ack");
            return;
        }
    };
    if sink.send(Message::Text(ack)).await.is_err() {
        return;
    }

    let (id, mut rx) = registry.register();

    loop {
        tokio::select! {
            outgoing = rx.recv() => match outgoing {
                Some(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                // Subscribers have nothing to say; only closure matters.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    registry.unregister(id);
}

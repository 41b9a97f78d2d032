//! HTTP server implementation.
//!
//! The server owns the TCP listener and the connection tasks. Each accepted
//! connection is served by hyper's HTTP/1.1 implementation on its own task;
//! every request on it goes through the shared [`Dispatcher`].
//!
//! Binding and serving are separate steps so callers (and tests) can learn
//! the actual local address before traffic starts:
//!
//! ```rust,no_run
//! # use hostinfo_server::{Dispatcher, Server, ServerConfig, ShutdownSignal};
//! # async fn run(dispatcher: Dispatcher) -> Result<(), hostinfo_server::ServerError> {
//! let server = Server::builder(dispatcher)
//!     .config(ServerConfig::builder().port(0).build())
//!     .build();
//!
//! let bound = server.bind().await?;
//! println!("listening on {}", bound.local_addr());
//!
//! let shutdown = ShutdownSignal::new();
//! bound.serve(shutdown).await
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::response::HttpResponse;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bound listener has no usable local address.
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// The hostinfo HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Creates a server with the given configuration and dispatcher.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Creates a server builder around a dispatcher.
    #[must_use]
    pub fn builder(dispatcher: Dispatcher) -> ServerBuilder {
        ServerBuilder::new(dispatcher)
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the listener without accepting connections yet.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind((self.config.host(), self.config.port()))
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        tracing::info!(%local_addr, "server listening");

        Ok(BoundServer {
            listener,
            local_addr,
            config: self.config,
            dispatcher: self.dispatcher,
        })
    }

    /// Binds and serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds and serves until `shutdown` is triggered.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        self.bind().await?.serve(shutdown).await
    }
}

/// A server whose listener is bound but not yet accepting.
#[derive(Debug)]
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl BoundServer {
    /// Returns the address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until `shutdown` is triggered, then waits up to
    /// the configured shutdown timeout for open connections to finish.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(dispatcher, stream, shutdown).await {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        drop(self.listener);

        let timeout = self.config.shutdown_timeout();
        let active = tracker.active_connections();
        if active > 0 {
            tracing::info!(active, ?timeout, "waiting for connections to close");
        }

        if tokio::time::timeout(timeout, tracker.wait_for_drain())
            .await
            .is_err()
        {
            tracing::warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

async fn handle_connection(
    dispatcher: Arc<Dispatcher>,
    stream: TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            let request = req.map(|_| ());
            Ok::<HttpResponse, Infallible>(dispatcher.dispatch(&request).await)
        }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Builder for [`Server`].
#[derive(Debug)]
pub struct ServerBuilder {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl ServerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher,
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server::new(self.config, self.dispatcher)
    }
}

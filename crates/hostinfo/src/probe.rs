//! Host introspection.
//!
//! [`HostProbe`] is the seam between the reference handlers and the
//! operating system. [`SystemProbe`] asks the OS; tests substitute their own
//! implementations.

use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::UdpSocket;

/// Default destination used to discover the outbound interface.
pub const DEFAULT_PROBE_TARGET: &str = "8.8.8.8:80";

/// A host lookup failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The OS refused to report the hostname.
    #[error("hostname lookup failed: {0}")]
    Hostname(#[source] std::io::Error),

    /// The hostname is not valid UTF-8.
    #[error("hostname is not valid UTF-8: {0:?}")]
    NonUtf8Hostname(OsString),

    /// The outbound address could not be determined.
    #[error("outbound address lookup via {target} failed: {source}")]
    OutboundIp {
        /// Destination the socket was pointed at.
        target: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Answers questions about the machine the service runs on.
#[async_trait]
pub trait HostProbe: Send + Sync + 'static {
    /// Returns the machine's configured name.
    async fn hostname(&self) -> Result<String, ProbeError>;

    /// Returns the local address the OS would use for outbound traffic.
    async fn outbound_ip(&self) -> Result<IpAddr, ProbeError>;
}

/// Probe backed by the operating system.
///
/// The outbound address is found by pointing an unbound UDP socket at
/// `target` and reading back the local address the kernel picked. UDP
/// `connect` only sets the default peer, so no packet leaves the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemProbe {
    target: SocketAddr,
}

impl SystemProbe {
    /// Creates a probe that routes towards `target`.
    #[must_use]
    pub const fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    /// Returns the routing target.
    #[must_use]
    pub const fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80))
    }
}

#[async_trait]
impl HostProbe for SystemProbe {
    async fn hostname(&self) -> Result<String, ProbeError> {
        hostname::get()
            .map_err(ProbeError::Hostname)?
            .into_string()
            .map_err(ProbeError::NonUtf8Hostname)
    }

    async fn outbound_ip(&self) -> Result<IpAddr, ProbeError> {
        let wrap = |source| ProbeError::OutboundIp {
            target: self.target,
            source,
        };

        let unspecified = match self.target {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };

        let socket = UdpSocket::bind(SocketAddr::new(unspecified, 0))
            .await
            .map_err(wrap)?;
        socket.connect(self.target).await.map_err(wrap)?;
        let local = socket.local_addr().map_err(wrap)?;

        Ok(local.ip())
    }
}

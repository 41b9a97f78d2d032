//! Reference handlers for the hostinfo contract.

use std::sync::Arc;

use async_trait::async_trait;
use hostinfo_core::{BoundParams, Handler, HandlerResult, RequestContext};
use hostinfo_server::HandlerRegistry;

use crate::probe::HostProbe;

/// Operation id of `GET /hostname`.
pub const GET_HOSTNAME: &str = "getHostname";

/// Operation id of `GET /ip`.
pub const GET_IP: &str = "getIP";

/// Message returned when the hostname cannot be read.
pub const HOSTNAME_FAILURE_MESSAGE: &str = "failed to retrieve hostname";

/// Message returned when the outbound address cannot be determined.
pub const OUTBOUND_IP_FAILURE_MESSAGE: &str = "failed to retrieve outbound ip address";

/// Serves `getHostname`.
#[derive(Clone)]
pub struct HostnameHandler {
    probe: Arc<dyn HostProbe>,
}

impl HostnameHandler {
    /// Creates the handler around a probe.
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Handler for HostnameHandler {
    async fn handle(&self, ctx: &RequestContext, _params: BoundParams) -> HandlerResult {
        match self.probe.hostname().await {
            Ok(name) => HandlerResult::success(&name),
            Err(e) => {
                tracing::warn!(request_id = %ctx.request_id(), error = %e, "hostname probe failed");
                HandlerResult::failure(500, HOSTNAME_FAILURE_MESSAGE)
            }
        }
    }
}

/// Serves `getIP`.
#[derive(Clone)]
pub struct OutboundIpHandler {
    probe: Arc<dyn HostProbe>,
}

impl OutboundIpHandler {
    /// Creates the handler around a probe.
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Handler for OutboundIpHandler {
    async fn handle(&self, ctx: &RequestContext, _params: BoundParams) -> HandlerResult {
        match self.probe.outbound_ip().await {
            Ok(ip) => HandlerResult::success(&ip.to_string()),
            Err(e) => {
                tracing::warn!(request_id = %ctx.request_id(), error = %e, "outbound ip probe failed");
                HandlerResult::failure(500, OUTBOUND_IP_FAILURE_MESSAGE)
            }
        }
    }
}

/// Registers both reference handlers against `probe`.
pub fn registry(probe: Arc<dyn HostProbe>) -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers.register(GET_HOSTNAME, HostnameHandler::new(Arc::clone(&probe)));
    handlers.register(GET_IP, OutboundIpHandler::new(probe));
    handlers
}

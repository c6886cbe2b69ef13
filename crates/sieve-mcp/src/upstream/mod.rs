//! Upstream MCP servers: connection seam, rmcp-backed client, and registry

pub mod client;
pub mod registry;

use std::fmt;

use async_trait::async_trait;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use sieve_config::McpServerType;

use crate::error::McpError;

pub use client::RmcpConnector;
pub use registry::UpstreamRegistry;

/// Opens connections to upstream servers
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    /// Connect to and initialize one server
    async fn connect(&self, name: &str, server_type: &McpServerType) -> Result<Box<dyn UpstreamConnection>, McpError>;
}

/// An established connection to one upstream server
///
/// Implementations report upstream-side call failures as
/// [`McpError::UpstreamInvocation`] carrying the server's own message.
#[async_trait]
pub trait UpstreamConnection: Send + Sync {
    /// List every tool the server exposes
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError>;

    /// Call a tool by its local name
    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError>;

    /// Release the underlying transport; later calls fail
    async fn close(&self) -> Result<(), McpError>;
}

/// Lifecycle state of an upstream server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamStatus {
    /// Connection attempt in progress
    Connecting,
    /// Handshake completed, calls are forwarded
    Ready,
    /// Connection attempt failed; terminal for this session
    Failed(String),
    /// Released at shutdown
    Closed,
}

impl UpstreamStatus {
    /// Whether calls may be forwarded
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

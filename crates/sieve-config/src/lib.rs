#![allow(clippy::must_use_candidate)]

pub mod discovery;
mod duration;
pub mod embeddings;
mod env;
mod legacy;
mod loader;
pub mod mcp;
pub mod telemetry;
pub mod upstreams;

use serde::Deserialize;

pub use discovery::*;
pub use embeddings::*;
pub use mcp::*;
pub use telemetry::TelemetryConfig;
pub use upstreams::*;

/// Top-level Sieve configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Upstream MCP server configuration
    #[serde(default)]
    pub mcp: McpConfig,
    /// Discovery tool and active view settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Connection and call limits shared by all upstreams
    #[serde(default)]
    pub upstreams: UpstreamsConfig,
    /// Scoring oracle used to rank tools
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

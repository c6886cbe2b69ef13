use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Top-level MCP configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// Upstream MCP server configurations keyed by name
    ///
    /// The name doubles as the namespace prefix for every tool the
    /// server exposes, so it must not contain the discovery separator.
    #[serde(default)]
    pub servers: IndexMap<String, McpServerConfig>,
}

impl McpConfig {
    /// Iterate over servers that are not disabled
    pub fn enabled_servers(&self) -> impl Iterator<Item = (&String, &McpServerConfig)> {
        self.servers.iter().filter(|(_, server)| server.enabled)
    }
}

/// Configuration for a single upstream MCP server
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServerConfig {
    /// Server transport type
    #[serde(rename = "type")]
    pub server_type: McpServerType,
    /// Set to false to keep the entry in the file without connecting to it
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum concurrent calls forwarded to this server
    ///
    /// The default of 1 serializes calls. Raise it only for transports
    /// known to pipeline requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-server override of `upstreams.call_timeout`
    #[serde(default, deserialize_with = "crate::duration::deserialize_opt")]
    pub call_timeout: Option<Duration>,
}

impl McpServerConfig {
    /// Enabled server with default limits
    pub const fn new(server_type: McpServerType) -> Self {
        Self {
            server_type,
            enabled: true,
            max_in_flight: 1,
            call_timeout: None,
        }
    }
}

/// MCP server transport types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpServerType {
    /// STDIO subprocess
    Stdio(StdioConfig),
    /// HTTP with SSE
    Sse(HttpConfig),
    /// HTTP with streamable protocol
    StreamableHttp(HttpConfig),
}

impl McpServerType {
    /// Short transport label for logs
    pub const fn transport_name(&self) -> &'static str {
        match self {
            Self::Stdio(_) => "stdio",
            Self::Sse(_) => "sse",
            Self::StreamableHttp(_) => "streamable_http",
        }
    }
}

/// STDIO transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StdioConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Server URL
    pub url: Url,
    /// Authentication configuration
    #[serde(default)]
    pub auth: Option<McpAuthConfig>,
}

/// MCP server authentication
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpAuthConfig {
    /// Static bearer token
    Token { token: SecretString },
}

const fn default_enabled() -> bool {
    true
}

const fn default_max_in_flight() -> usize {
    1
}

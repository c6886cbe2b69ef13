//! Legacy JSON configuration in the `mcpServers` layout used by desktop MCP clients

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{Config, DiscoveryConfig, McpConfig, McpServerConfig, McpServerType, StdioConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyConfig {
    mcp_servers: IndexMap<String, LegacyServer>,
    #[serde(default, rename = "top_k")]
    top_k: Option<usize>,
    #[serde(default, rename = "embedding_model")]
    embedding_model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyServer {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Map a legacy JSON document onto the native configuration
///
/// Every legacy server is a STDIO subprocess. Local sentence-transformer
/// models have no counterpart here, so `embedding_model` is ignored and the
/// lexical embedder is used.
pub fn from_json(raw: &str) -> anyhow::Result<Config> {
    let legacy: LegacyConfig =
        serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("failed to parse JSON config: {e}"))?;

    if let Some(model) = legacy.embedding_model {
        tracing::warn!(model = %model, "embedding_model is not supported in JSON configs, using lexical embeddings");
    }

    let servers = legacy
        .mcp_servers
        .into_iter()
        .map(|(name, server)| {
            let server_type = McpServerType::Stdio(StdioConfig {
                command: server.command,
                args: server.args,
                env: server.env,
            });
            (name, McpServerConfig::new(server_type))
        })
        .collect();

    let mut discovery = DiscoveryConfig::default();
    if let Some(top_k) = legacy.top_k {
        discovery.top_k = top_k;
        discovery.max_active_tools = discovery.max_active_tools.max(top_k);
    }

    Ok(Config {
        mcp: McpConfig { servers },
        discovery,
        ..Config::default()
    })
}

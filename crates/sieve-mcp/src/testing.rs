//! Fake upstreams shared by unit tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use sieve_config::{DiscoveryConfig, McpServerConfig, McpServerType, StdioConfig, UpstreamsConfig};
use sieve_embeddings::LexicalEmbedder;
use sieve_telemetry::metrics::McpMetrics;

use crate::catalog::Catalog;
use crate::catalog::tests::tool;
use crate::error::McpError;
use crate::index::RelevanceIndex;
use crate::router::Router;
use crate::upstream::{UpstreamConnection, UpstreamConnector, UpstreamRegistry};

/// Upstream whose tools echo their name and arguments
///
/// `tool_error` answers with an error result and `explode` fails at the
/// protocol level.
pub(crate) struct EchoConnection {
    tools: Vec<Tool>,
}

#[async_trait]
impl UpstreamConnection for EchoConnection {
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        match name {
            "tool_error" => Ok(CallToolResult::error(vec![Content::text("tool reported a failure")])),
            "explode" => Err(McpError::UpstreamInvocation {
                server: String::new(),
                tool: name.to_owned(),
                message: "upstream exploded".to_owned(),
            }),
            _ => {
                let arguments = serde_json::Value::Object(arguments.unwrap_or_default());
                Ok(CallToolResult::success(vec![Content::text(format!("{name} {arguments}"))]))
            }
        }
    }

    async fn close(&self) -> Result<(), McpError> {
        Ok(())
    }
}

/// Serves `fs` and refuses `gh`
pub(crate) struct ScenarioConnector;

#[async_trait]
impl UpstreamConnector for ScenarioConnector {
    async fn connect(&self, name: &str, _server_type: &McpServerType) -> Result<Box<dyn UpstreamConnection>, McpError> {
        if name != "fs" {
            return Err(McpError::ConnectionFailed {
                server: name.to_owned(),
                reason: "connection refused".to_owned(),
            });
        }

        Ok(Box::new(EchoConnection {
            tools: vec![
                tool("read_file", "Read the complete contents of a file from disk"),
                tool("list_directory", "List the files and subdirectories in a directory on disk"),
                tool("tool_error", "Always answers with an error result"),
                tool("explode", "Fails at the protocol level"),
            ],
        }))
    }
}

pub(crate) fn servers() -> IndexMap<String, McpServerConfig> {
    ["fs", "gh"]
        .into_iter()
        .map(|name| {
            let server_type = McpServerType::Stdio(StdioConfig {
                command: format!("mcp-{name}"),
                args: Vec::new(),
                env: HashMap::new(),
            });
            (name.to_owned(), McpServerConfig::new(server_type))
        })
        .collect()
}

pub(crate) fn discovery() -> DiscoveryConfig {
    DiscoveryConfig {
        top_k: 2,
        max_active_tools: 3,
        separator: "::".to_owned(),
        tool_name: "search_tools".to_owned(),
    }
}

/// Router over a ready `fs` and a failed `gh`
pub(crate) async fn router() -> Router {
    let registry = UpstreamRegistry::connect_all(&servers(), &UpstreamsConfig::default(), &ScenarioConnector)
        .await
        .unwrap();
    let catalog = Catalog::build(&registry, "::").await;
    let index = RelevanceIndex::build(&catalog, Arc::new(LexicalEmbedder::new(512))).await;

    Router::new(discovery(), catalog, index, Arc::new(registry), McpMetrics::default())
}

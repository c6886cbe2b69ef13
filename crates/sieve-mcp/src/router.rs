use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use sieve_config::DiscoveryConfig;
use sieve_telemetry::metrics::McpMetrics;
use tokio::sync::Mutex;

use crate::catalog::{Catalog, Resolution, ToolDescriptor};
use crate::error::McpError;
use crate::index::{RelevanceIndex, ToolMatch};
use crate::upstream::UpstreamRegistry;
use crate::view::{ActiveView, ViewSnapshot};

const DISCOVERY_DESCRIPTION: &str = "Search the available tools by describing what you want to do. \
     The best matching tools replace the previously listed ones; list tools again to see their parameters.";

/// Arguments accepted by the discovery tool
///
/// Keys other than these are ignored.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchToolsArgs {
    /// What you are trying to do, in plain words
    pub query: String,
    /// How many tools to return
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Where an invocation goes, resolved once per call
#[derive(Debug)]
pub enum Target<'a> {
    Discovery,
    Tool(&'a Arc<ToolDescriptor>),
    /// Known server that is not ready
    Unavailable { server: &'a str },
    Unknown,
}

/// Result of one dispatch
#[derive(Debug)]
pub struct Dispatched {
    pub result: CallToolResult,
    /// Set when the call replaced the active view
    pub view_changed: bool,
}

/// Sends every invocation to the discovery path or to an upstream server
pub struct Router {
    discovery: DiscoveryConfig,
    catalog: Catalog,
    index: RelevanceIndex,
    view: ActiveView,
    registry: Arc<UpstreamRegistry>,
    /// Single writer for the active view
    search_lock: Mutex<()>,
    metrics: McpMetrics,
}

impl Router {
    pub fn new(
        discovery: DiscoveryConfig,
        catalog: Catalog,
        index: RelevanceIndex,
        registry: Arc<UpstreamRegistry>,
        metrics: McpMetrics,
    ) -> Self {
        let view = ActiveView::new(discovery_tool(&discovery.tool_name), discovery.max_active_tools);

        Self {
            discovery,
            catalog,
            index,
            view,
            registry,
            search_lock: Mutex::new(()),
            metrics,
        }
    }

    pub fn view(&self) -> &ActiveView {
        &self.view
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<UpstreamRegistry> {
        &self.registry
    }

    /// Decide where a call named `name` goes
    pub fn target<'a>(&'a self, name: &'a str) -> Target<'a> {
        if name == self.discovery.tool_name {
            return Target::Discovery;
        }

        match self.catalog.resolve(name) {
            Resolution::Tool(descriptor) => Target::Tool(descriptor),
            Resolution::Unindexed { server, .. } if !self.is_ready(server) => Target::Unavailable { server },
            Resolution::Unindexed { .. } | Resolution::NotFound => Target::Unknown,
        }
    }

    /// Handle one invocation
    ///
    /// Failures come back as error results, never as `Err`, so the client
    /// always gets a structured answer.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> Dispatched {
        let outcome = match self.target(name) {
            Target::Discovery => self.search(arguments).await.map(|result| (result, true)),
            Target::Tool(descriptor) => self.forward(descriptor, arguments).await.map(|result| (result, false)),
            Target::Unavailable { server } => Err(McpError::UpstreamUnavailable {
                server: server.to_owned(),
            }),
            Target::Unknown => Err(McpError::UnknownTool { tool: name.to_owned() }),
        };

        match outcome {
            Ok((result, view_changed)) => Dispatched { result, view_changed },
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "tool call rejected");
                Dispatched {
                    result: e.into_call_result(),
                    view_changed: false,
                }
            }
        }
    }

    async fn search(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = self.run_search(arguments).await;

        let outcome = match result {
            Ok(_) => "success",
            Err(ref e) => e.error_type(),
        };
        self.metrics.record_search(outcome, start);

        result
    }

    async fn run_search(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let args: SearchToolsArgs = serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
            .map_err(|e| McpError::InvalidArguments(e.to_string()))?;

        let query = args.query.trim();
        if query.is_empty() {
            return Err(McpError::InvalidArguments("query must not be empty".to_owned()));
        }

        let k = args
            .top_k
            .unwrap_or(self.discovery.top_k)
            .clamp(1, self.discovery.max_active_tools);

        let _writer = self.search_lock.lock().await;

        let matches = self.index.query(query, k).await?;
        let snapshot = self
            .view
            .apply_matches(matches.iter().map(|m| Arc::clone(&m.descriptor)).collect());

        tracing::info!(query, matches = matches.len(), version = snapshot.version, "discovery search");

        Ok(search_result(&matches, &snapshot))
    }

    async fn forward(&self, descriptor: &ToolDescriptor, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let server = descriptor.server.as_str();
        let timeout = self
            .registry
            .call_timeout(server)
            .ok_or_else(|| McpError::UpstreamUnavailable {
                server: server.to_owned(),
            })?;

        let start = Instant::now();
        let result = self
            .registry
            .invoke(server, &descriptor.local_name, arguments, timeout)
            .await;

        let outcome = match result {
            Ok(ref r) if r.is_error == Some(true) => "tool_error",
            Ok(_) => "success",
            Err(ref e) => e.error_type(),
        };
        self.metrics.record_tool_call(server, outcome, start);

        tracing::debug!(server, tool = %descriptor.local_name, outcome, "forwarded tool call");

        result
    }

    fn is_ready(&self, server: &str) -> bool {
        self.registry.status(server).is_some_and(|status| status.is_ready())
    }
}

/// Advertised descriptor of the discovery tool
pub fn discovery_tool(name: &str) -> Tool {
    let schema = match serde_json::to_value(schemars::schema_for!(SearchToolsArgs)) {
        Ok(serde_json::Value::Object(mut schema)) => {
            schema.remove("$schema");
            schema
        }
        _ => JsonObject::new(),
    };

    Tool::new(name.to_owned(), DISCOVERY_DESCRIPTION, Arc::new(schema))
}

/// Summarize matches by name and short description
///
/// Parameter schemas are left out; the client sees them on the next
/// tool listing.
fn search_result(matches: &[ToolMatch], snapshot: &ViewSnapshot) -> CallToolResult {
    let mut text = if matches.is_empty() {
        "No tools matched the query.".to_owned()
    } else {
        format!("Found {} tools. They are now available:", matches.len())
    };

    let mut summaries = Vec::with_capacity(matches.len());
    for m in matches {
        let description = m.descriptor.short_description();
        let _ = write!(text, "\n- {} (score: {:.3}): {description}", m.descriptor.id, m.score);
        summaries.push(serde_json::json!({
            "name": m.descriptor.id,
            "description": description,
            "score": m.score,
        }));
    }

    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(serde_json::json!({
        "matches": summaries,
        "version": snapshot.version,
    }));
    result
}

use std::time::Duration;

use indexmap::IndexMap;
use rmcp::model::{CallToolResult, Content};
use sieve_embeddings::EmbeddingsError;
use thiserror::Error;

/// MCP subsystem errors
///
/// Only [`McpError::AllUpstreamsUnavailable`] is fatal, and only at
/// startup. Every other variant is scoped to one server, one tool or one
/// request and ends up in front of the client as a structured tool error.
#[derive(Debug, Error)]
pub enum McpError {
    /// No configured server reached the ready state
    #[error("all upstream MCP servers are unavailable")]
    AllUpstreamsUnavailable {
        /// Failure reason per server name
        failures: IndexMap<String, String>,
    },

    /// Connecting to a single server failed
    #[error("failed to connect to {server}: {reason}")]
    ConnectionFailed { server: String, reason: String },

    /// Listing the tools of a ready server failed
    #[error("failed to fetch tools from {server}: {reason}")]
    CatalogFetch { server: String, reason: String },

    /// Requested tool is not in the catalog
    #[error("tool not found: {tool}")]
    UnknownTool { tool: String },

    /// Tool belongs to a server that is not ready
    #[error("server unavailable: {server}")]
    UpstreamUnavailable { server: String },

    /// The server reported a failure for the call
    #[error("tool '{tool}' failed on {server}: {message}")]
    UpstreamInvocation {
        server: String,
        tool: String,
        message: String,
    },

    /// The server did not answer within the call timeout
    #[error("tool '{tool}' on {server} timed out after {timeout:?}")]
    Timeout {
        server: String,
        tool: String,
        timeout: Duration,
    },

    /// Arguments to the discovery tool were malformed
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Scoring oracle failed
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingsError),

    /// Transport-level connection or communication error
    #[error("transport error: {0}")]
    Transport(String),
}

impl McpError {
    /// Machine-readable error type
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::AllUpstreamsUnavailable { .. } | Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::ConnectionFailed { .. } | Self::Transport(_) => "transport_error",
            Self::CatalogFetch { .. } => "catalog_fetch_error",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::UpstreamInvocation { .. } => "upstream_error",
            Self::Timeout { .. } => "timeout",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::Embedding(_) => "embedding_error",
        }
    }

    /// Message safe to expose to the client
    pub fn client_message(&self) -> String {
        match self {
            Self::UnknownTool { tool } => format!("Unknown tool: {tool}"),
            Self::UpstreamUnavailable { server } => format!("MCP server '{server}' is not available"),
            // upstream messages are forwarded verbatim
            Self::UpstreamInvocation { message, .. } => message.clone(),
            Self::Timeout { tool, timeout, .. } => {
                format!("tool '{tool}' did not respond within {}s", timeout.as_secs_f64())
            }
            Self::InvalidArguments(msg) => format!("Error: {msg}"),
            Self::Embedding(_) => "failed to rank tools for this query".to_owned(),
            Self::AllUpstreamsUnavailable { .. }
            | Self::ConnectionFailed { .. }
            | Self::CatalogFetch { .. }
            | Self::Transport(_) => "failed to communicate with MCP server".to_owned(),
        }
    }

    /// Render as a tool result flagged as an error
    ///
    /// The text block carries the client message; `structured_content`
    /// carries the same message next to the error type.
    pub fn into_call_result(self) -> CallToolResult {
        let message = self.client_message();
        let mut result = CallToolResult::error(vec![Content::text(message.clone())]);
        result.structured_content = Some(serde_json::json!({
            "error": {
                "type": self.error_type(),
                "message": message,
            }
        }));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_is_verbatim() {
        let err = McpError::UpstreamInvocation {
            server: "gh".to_owned(),
            tool: "create_issue".to_owned(),
            message: "403: resource not accessible by integration".to_owned(),
        };
        assert_eq!(err.client_message(), "403: resource not accessible by integration");
        assert_eq!(err.error_type(), "upstream_error");
    }

    #[test]
    fn call_result_is_flagged_and_structured() {
        let result = McpError::UnknownTool {
            tool: "nope__tool".to_owned(),
        }
        .into_call_result();

        assert_eq!(result.is_error, Some(true));
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["error"]["type"], "unknown_tool");
        assert_eq!(structured["error"]["message"], "Unknown tool: nope__tool");
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = McpError::Timeout {
            server: "fs".to_owned(),
            tool: "read_file".to_owned(),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.client_message(), "tool 'read_file' did not respond within 1.5s");
    }
}

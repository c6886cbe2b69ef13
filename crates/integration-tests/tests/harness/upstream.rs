//! In-process stand-ins for upstream MCP servers

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::json;
use sieve_config::McpServerType;
use sieve_mcp::{McpError, UpstreamConnection, UpstreamConnector};

/// A call as the upstream received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub server: String,
    pub tool: String,
    pub arguments: Option<JsonObject>,
}

/// Connector over a fixed set of mock servers
///
/// A server registered without tools refuses to connect. Calling `fail`
/// on any server produces an upstream error; calling `sleep` never returns.
#[derive(Clone, Default)]
pub struct MockUpstreams {
    servers: IndexMap<String, Option<Vec<Tool>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    closed: Arc<Mutex<Vec<String>>>,
}

impl MockUpstreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, name: &str, tools: Vec<Tool>) -> Self {
        self.servers.insert(name.to_owned(), Some(tools));
        self
    }

    pub fn with_failing_server(mut self, name: &str) -> Self {
        self.servers.insert(name.to_owned(), None);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamConnector for MockUpstreams {
    async fn connect(&self, name: &str, _server_type: &McpServerType) -> Result<Box<dyn UpstreamConnection>, McpError> {
        match self.servers.get(name) {
            Some(Some(tools)) => Ok(Box::new(MockConnection {
                server: name.to_owned(),
                tools: tools.clone(),
                calls: Arc::clone(&self.calls),
                closed: Arc::clone(&self.closed),
            })),
            _ => Err(McpError::ConnectionFailed {
                server: name.to_owned(),
                reason: "no such mock server".to_owned(),
            }),
        }
    }
}

struct MockConnection {
    server: String,
    tools: Vec<Tool>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    closed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl UpstreamConnection for MockConnection {
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        self.calls.lock().unwrap().push(RecordedCall {
            server: self.server.clone(),
            tool: name.to_owned(),
            arguments: arguments.clone(),
        });

        match name {
            "fail" => Err(McpError::UpstreamInvocation {
                server: self.server.clone(),
                tool: name.to_owned(),
                message: "permission denied: /root".to_owned(),
            }),
            "sleep" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CallToolResult::success(Vec::new()))
            }
            _ => {
                let arguments = serde_json::Value::Object(arguments.unwrap_or_default());
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "{}/{name} {arguments}",
                    self.server
                ))]))
            }
        }
    }

    async fn close(&self) -> Result<(), McpError> {
        self.closed.lock().unwrap().push(self.server.clone());
        Ok(())
    }
}

/// Tool with string parameters described by `params`
pub fn tool(name: &str, description: &str, params: &[(&str, &str)]) -> Tool {
    let properties: serde_json::Map<_, _> = params
        .iter()
        .map(|(param, desc)| ((*param).to_owned(), json!({ "type": "string", "description": desc })))
        .collect();
    let required: Vec<_> = params.iter().map(|(param, _)| *param).collect();

    let schema = json!({ "type": "object", "properties": properties, "required": required });
    let serde_json::Value::Object(schema) = schema else {
        unreachable!("schema literal is an object")
    };

    Tool::new(name.to_owned(), description.to_owned(), Arc::new(schema))
}

pub fn filesystem_tools() -> Vec<Tool> {
    vec![
        tool(
            "read_file",
            "Read the complete contents of a file from disk",
            &[("path", "Absolute path of the file")],
        ),
        tool(
            "list_directory",
            "List the files and subdirectories in a directory on disk",
            &[("path", "Directory to list")],
        ),
        tool(
            "write_file",
            "Create or overwrite a file with new content",
            &[("path", "Absolute path of the file"), ("content", "Text to write")],
        ),
        tool("fail", "Always fails", &[]),
        tool("sleep", "Never answers", &[]),
    ]
}

pub fn github_tools() -> Vec<Tool> {
    vec![
        tool(
            "create_issue",
            "Create a new issue in a GitHub repository",
            &[("repo", "Repository in owner/name form"), ("title", "Issue title")],
        ),
        tool(
            "list_pull_requests",
            "List open pull requests for a repository",
            &[("repo", "Repository in owner/name form")],
        ),
    ]
}

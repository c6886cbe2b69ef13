use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::ServiceError;
use rmcp::model::{CallToolRequestParam, CallToolResult, JsonObject, Tool};
use rmcp::service::{RoleClient, RunningService, ServiceExt as _};
use rmcp::transport::TokioChildProcess;
use sieve_config::{HttpConfig, McpAuthConfig, McpServerType, StdioConfig};
use tokio::sync::Mutex;

use super::{UpstreamConnection, UpstreamConnector};
use crate::error::McpError;

/// Connector for real MCP servers over STDIO, SSE or streamable HTTP
#[derive(Debug, Default, Clone, Copy)]
pub struct RmcpConnector;

#[async_trait]
impl UpstreamConnector for RmcpConnector {
    async fn connect(&self, name: &str, server_type: &McpServerType) -> Result<Box<dyn UpstreamConnection>, McpError> {
        let client = McpClient::connect(name, server_type).await?;
        Ok(Box::new(client))
    }
}

/// Connected MCP upstream client wrapping a running rmcp service
pub struct McpClient {
    /// `None` once the connection has been closed
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    server_name: String,
}

impl McpClient {
    /// Connect to an upstream MCP server
    pub async fn connect(name: &str, server_type: &McpServerType) -> Result<Self, McpError> {
        let service = match server_type {
            McpServerType::Stdio(config) => Self::connect_stdio(config).await,
            McpServerType::Sse(config) => Self::connect_sse(config).await,
            McpServerType::StreamableHttp(config) => Self::connect_streamable_http(config).await,
        }
        .map_err(|reason| McpError::ConnectionFailed {
            server: name.to_owned(),
            reason,
        })?;

        if let Some(info) = service.peer_info() {
            tracing::debug!(
                server = name,
                upstream = %info.server_info.name,
                version = %info.server_info.version,
                "upstream handshake complete"
            );
        }

        tracing::info!(server = name, transport = server_type.transport_name(), "connected to MCP server");

        Ok(Self {
            service: Mutex::new(Some(service)),
            server_name: name.to_owned(),
        })
    }

    async fn connect_stdio(config: &StdioConfig) -> Result<RunningService<RoleClient, ()>, String> {
        let mut cmd = tokio::process::Command::new(&config.command);
        cmd.args(&config.args);
        cmd.envs(&config.env);

        let transport = TokioChildProcess::new(cmd).map_err(|e| format!("failed to spawn process: {e}"))?;

        ().serve(transport).await.map_err(|e| format!("STDIO handshake failed: {e}"))
    }

    async fn connect_sse(config: &HttpConfig) -> Result<RunningService<RoleClient, ()>, String> {
        use rmcp::transport::SseClientTransport;
        use rmcp::transport::sse_client::SseClientConfig;

        let sse_config = SseClientConfig {
            sse_endpoint: Arc::from(config.url.as_str()),
            ..Default::default()
        };

        let client = build_reqwest_client(config.auth.as_ref())?;

        let transport = SseClientTransport::start_with_client(client, sse_config)
            .await
            .map_err(|e| format!("SSE connection failed: {e}"))?;

        ().serve(transport).await.map_err(|e| format!("SSE handshake failed: {e}"))
    }

    async fn connect_streamable_http(config: &HttpConfig) -> Result<RunningService<RoleClient, ()>, String> {
        use rmcp::transport::StreamableHttpClientTransport;
        use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

        let mut transport_config = StreamableHttpClientTransportConfig::with_uri(config.url.as_str());

        if let Some(McpAuthConfig::Token { ref token }) = config.auth {
            use secrecy::ExposeSecret;
            transport_config = transport_config.auth_header(format!("Bearer {}", token.expose_secret()));
        }

        let transport = StreamableHttpClientTransport::with_client(reqwest::Client::new(), transport_config);

        ().serve(transport)
            .await
            .map_err(|e| format!("StreamableHTTP handshake failed: {e}"))
    }

    fn closed(&self) -> McpError {
        McpError::Transport(format!("connection to {} is closed", self.server_name))
    }

    /// Get the server name
    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}

#[async_trait]
impl UpstreamConnection for McpClient {
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(|| self.closed())?;

        service.list_all_tools().await.map_err(|e| McpError::CatalogFetch {
            server: self.server_name.clone(),
            reason: e.to_string(),
        })
    }

    async fn call_tool(&self, name: &str, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        // Clone the peer so the lock is not held for the whole call; the
        // registry decides how many calls may be in flight.
        let peer = {
            let guard = self.service.lock().await;
            guard.as_ref().ok_or_else(|| self.closed())?.peer().clone()
        };

        peer.call_tool(CallToolRequestParam {
            name: Cow::Owned(name.to_owned()),
            arguments,
        })
        .await
        .map_err(|e| McpError::UpstreamInvocation {
            server: self.server_name.clone(),
            tool: name.to_owned(),
            message: upstream_message(e),
        })
    }

    async fn close(&self) -> Result<(), McpError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        service
            .cancel()
            .await
            .map_err(|e| McpError::Transport(format!("shutdown of {} failed: {e}", self.server_name)))?;
        Ok(())
    }
}

/// Extract the upstream's own message from an rmcp service error
fn upstream_message(error: ServiceError) -> String {
    match error {
        ServiceError::McpError(data) => data.message.into_owned(),
        other => other.to_string(),
    }
}

/// Build a reqwest client with optional auth headers
fn build_reqwest_client(auth: Option<&McpAuthConfig>) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder();

    if let Some(McpAuthConfig::Token { token }) = auth {
        use secrecy::ExposeSecret;
        let mut headers = reqwest::header::HeaderMap::new();
        let val = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| format!("invalid auth token: {e}"))?;
        headers.insert(reqwest::header::AUTHORIZATION, val);
        builder = builder.default_headers(headers);
    }

    builder.build().map_err(|e| format!("failed to build HTTP client: {e}"))
}

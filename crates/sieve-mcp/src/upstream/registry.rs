use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::join_all;
use indexmap::IndexMap;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use sieve_config::{McpServerConfig, UpstreamsConfig};
use tokio::sync::Semaphore;

use super::{UpstreamConnection, UpstreamConnector, UpstreamStatus};
use crate::error::McpError;

/// One configured upstream server
struct Upstream {
    status: RwLock<UpstreamStatus>,
    /// Present only for servers that reached [`UpstreamStatus::Ready`]
    connection: Option<Box<dyn UpstreamConnection>>,
    /// Bounds calls in flight; one permit serializes calls
    permits: Semaphore,
    call_timeout: Duration,
}

impl Upstream {
    fn status(&self) -> UpstreamStatus {
        self.status.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_status(&self, status: UpstreamStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// Owns every upstream connection for the lifetime of the session
pub struct UpstreamRegistry {
    upstreams: IndexMap<String, Upstream>,
}

impl UpstreamRegistry {
    /// Connect to all given servers concurrently
    ///
    /// Waits for every attempt to settle. Failures are recorded per server
    /// and only become an error when no server at all is ready.
    pub async fn connect_all<'a>(
        servers: impl IntoIterator<Item = (&'a String, &'a McpServerConfig)>,
        limits: &UpstreamsConfig,
        connector: &dyn UpstreamConnector,
    ) -> Result<Self, McpError> {
        let attempts = servers.into_iter().map(|(name, config)| async move {
            tracing::debug!(server = %name, status = %UpstreamStatus::Connecting, "connecting to MCP server");

            let outcome = match tokio::time::timeout(
                limits.connect_timeout,
                connector.connect(name, &config.server_type),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(McpError::ConnectionFailed {
                    server: name.clone(),
                    reason: format!("timed out after {:?}", limits.connect_timeout),
                }),
            };

            (name, config, outcome)
        });

        let mut upstreams = IndexMap::new();

        for (name, config, outcome) in join_all(attempts).await {
            let (status, connection) = match outcome {
                Ok(connection) => (UpstreamStatus::Ready, Some(connection)),
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "failed to connect to MCP server, skipping");
                    (UpstreamStatus::Failed(failure_reason(e)), None)
                }
            };

            upstreams.insert(
                name.clone(),
                Upstream {
                    status: RwLock::new(status),
                    connection,
                    permits: Semaphore::new(config.max_in_flight.max(1)),
                    call_timeout: config.call_timeout.unwrap_or(limits.call_timeout),
                },
            );
        }

        let registry = Self { upstreams };

        if registry.ready_servers().is_empty() {
            return Err(McpError::AllUpstreamsUnavailable {
                failures: registry.failures(),
            });
        }

        tracing::info!(
            ready = registry.ready_servers().len(),
            failed = registry.failures().len(),
            "upstream connections settled"
        );

        Ok(registry)
    }

    /// Names of every configured server, in configuration order
    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.upstreams.keys().map(String::as_str)
    }

    /// Names of servers currently ready
    pub fn ready_servers(&self) -> Vec<&str> {
        self.upstreams
            .iter()
            .filter(|(_, upstream)| upstream.status().is_ready())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Failure reason per server that could not connect
    pub fn failures(&self) -> IndexMap<String, String> {
        self.upstreams
            .iter()
            .filter_map(|(name, upstream)| match upstream.status() {
                UpstreamStatus::Failed(reason) => Some((name.clone(), reason)),
                _ => None,
            })
            .collect()
    }

    /// Current status of a server, `None` if it was never configured
    pub fn status(&self, server: &str) -> Option<UpstreamStatus> {
        self.upstreams.get(server).map(Upstream::status)
    }

    /// Configured call timeout for a server
    pub fn call_timeout(&self, server: &str) -> Option<Duration> {
        self.upstreams.get(server).map(|upstream| upstream.call_timeout)
    }

    /// Fetch the tool list of a ready server
    pub async fn list_tools(&self, server: &str) -> Result<Vec<Tool>, McpError> {
        let (upstream, connection) = self.ready(server)?;

        let _permit = upstream
            .permits
            .acquire()
            .await
            .map_err(|_| unavailable(server))?;

        connection.list_tools().await.map_err(|e| match e {
            McpError::CatalogFetch { .. } => e,
            other => McpError::CatalogFetch {
                server: server.to_owned(),
                reason: other.to_string(),
            },
        })
    }

    /// Forward a tool call to a ready server
    ///
    /// The timeout covers waiting for a free slot as well as the call itself.
    /// Hitting it drops the in-flight request but leaves the connection up.
    pub async fn invoke(
        &self,
        server: &str,
        tool: &str,
        arguments: Option<JsonObject>,
        timeout: Duration,
    ) -> Result<CallToolResult, McpError> {
        let (upstream, connection) = self.ready(server)?;

        let call = async {
            let _permit = upstream
                .permits
                .acquire()
                .await
                .map_err(|_| unavailable(server))?;
            connection.call_tool(tool, arguments).await
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(McpError::UpstreamInvocation { message, .. })) => Err(McpError::UpstreamInvocation {
                server: server.to_owned(),
                tool: tool.to_owned(),
                message,
            }),
            Ok(Err(e @ McpError::UpstreamUnavailable { .. })) => Err(e),
            Ok(Err(other)) => Err(McpError::UpstreamInvocation {
                server: server.to_owned(),
                tool: tool.to_owned(),
                message: other.to_string(),
            }),
            Err(_) => {
                tracing::warn!(server, tool, ?timeout, "upstream tool call timed out");
                Err(McpError::Timeout {
                    server: server.to_owned(),
                    tool: tool.to_owned(),
                    timeout,
                })
            }
        }
    }

    /// Release every connection
    ///
    /// A failure to release one server is logged and does not stop the
    /// others from being released. Returns the failures.
    pub async fn close(&self) -> IndexMap<String, McpError> {
        let releases = self.upstreams.iter().map(|(name, upstream)| async move {
            let was_ready = upstream.status().is_ready();
            upstream.permits.close();
            if was_ready {
                upstream.set_status(UpstreamStatus::Closed);
            }

            let result = match upstream.connection {
                Some(ref connection) if was_ready => connection.close().await,
                _ => Ok(()),
            };
            (name, result)
        });

        let mut failures = IndexMap::new();
        for (name, result) in join_all(releases).await {
            match result {
                Ok(()) => tracing::debug!(server = %name, "released MCP server"),
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "failed to release MCP server");
                    failures.insert(name.clone(), e);
                }
            }
        }
        failures
    }

    fn ready(&self, server: &str) -> Result<(&Upstream, &dyn UpstreamConnection), McpError> {
        let upstream = self.upstreams.get(server).ok_or_else(|| unavailable(server))?;

        match upstream.connection {
            Some(ref connection) if upstream.status().is_ready() => Ok((upstream, connection.as_ref())),
            _ => Err(unavailable(server)),
        }
    }
}

fn unavailable(server: &str) -> McpError {
    McpError::UpstreamUnavailable {
        server: server.to_owned(),
    }
}

fn failure_reason(error: McpError) -> String {
    match error {
        McpError::ConnectionFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}

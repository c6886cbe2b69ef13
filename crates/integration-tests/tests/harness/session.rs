//! A Sieve session driven by a real MCP client over an in-memory pipe

use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{CallToolRequestParam, CallToolResult, ClientRequest, Request, Tool};
use rmcp::service::{NotificationContext, PeerRequestOptions, RequestHandle, RunningService};
use rmcp::{ClientHandler, RoleClient, ServiceExt as _};
use sieve_config::Config;
use sieve_embeddings::LexicalEmbedder;
use sieve_mcp::Sieve;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::upstream::MockUpstreams;

/// Client handler that forwards `tools/list_changed` into a channel
#[derive(Clone)]
struct NotifyingClient {
    tx: mpsc::UnboundedSender<()>,
}

impl ClientHandler for NotifyingClient {
    async fn on_tool_list_changed(&self, _context: NotificationContext<RoleClient>) {
        let _ = self.tx.send(());
    }
}

/// A running session with a connected client
pub struct TestSession {
    sieve: Sieve,
    client: RunningService<RoleClient, NotifyingClient>,
    notifications: mpsc::UnboundedReceiver<()>,
    server: JoinHandle<anyhow::Result<()>>,
}

impl TestSession {
    /// Start Sieve against the mock upstreams and complete the MCP handshake
    pub async fn start(config: Config, upstreams: &MockUpstreams) -> anyhow::Result<Self> {
        let sieve = Sieve::start(&config, upstreams, Arc::new(LexicalEmbedder::new(512))).await?;

        let (client_io, server_io) = tokio::io::duplex(64 * 1024);

        let session = sieve.session();
        let server = tokio::spawn(async move {
            let running = session.serve(server_io).await?;
            running.waiting().await?;
            Ok::<_, anyhow::Error>(())
        });

        let (tx, notifications) = mpsc::unbounded_channel();
        let client = NotifyingClient { tx }.serve(client_io).await?;

        Ok(Self {
            sieve,
            client,
            notifications,
            server,
        })
    }

    pub async fn list_tools(&self) -> Vec<Tool> {
        self.client.list_all_tools().await.unwrap()
    }

    pub async fn tool_names(&self) -> Vec<String> {
        self.list_tools().await.into_iter().map(|t| t.name.into_owned()).collect()
    }

    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> CallToolResult {
        self.client
            .call_tool(CallToolRequestParam {
                name: name.to_owned().into(),
                arguments: arguments.as_object().cloned(),
            })
            .await
            .unwrap()
    }

    /// Send a call without waiting for its result
    ///
    /// The returned handle can cancel the request, which sends
    /// `notifications/cancelled` to the server.
    pub async fn start_call(&self, name: &str, arguments: serde_json::Value) -> RequestHandle<RoleClient> {
        let request = ClientRequest::CallToolRequest(Request::new(CallToolRequestParam {
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
        }));

        self.client
            .send_cancellable_request(request, PeerRequestOptions::no_options())
            .await
            .unwrap()
    }

    /// Wait for the next `tools/list_changed` notification
    pub async fn expect_notification(&mut self) {
        tokio::time::timeout(Duration::from_secs(5), self.notifications.recv())
            .await
            .expect("no tools/list_changed notification within 5s")
            .expect("notification channel closed");
    }

    /// Number of notifications received and not yet consumed
    pub fn pending_notifications(&mut self) -> usize {
        let mut count = 0;
        while self.notifications.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    pub fn sieve(&self) -> &Sieve {
        &self.sieve
    }

    /// Disconnect the client and release the upstreams
    pub async fn close(self) {
        self.client.cancel().await.unwrap();
        let _ = self.server.await;
        self.sieve.shutdown().await;
    }
}

/// Concatenated text content of a result
pub fn text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| c.as_text().map(|t| t.text.clone()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `error.type` from a structured error result
pub fn error_type(result: &CallToolResult) -> Option<String> {
    let structured = result.structured_content.as_ref()?;
    structured["error"]["type"].as_str().map(str::to_owned)
}

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};

use crate::router::Router;

/// Client-facing MCP server for one session
///
/// Listing reads the current view snapshot. Calls go through the router;
/// a call that replaced the view is followed by a `tools/list_changed`
/// notification, sent before the call's own result.
#[derive(Clone)]
pub struct SieveSession {
    router: Arc<Router>,
}

impl SieveSession {
    pub const fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl ServerHandler for SieveSession {
    fn get_info(&self) -> ServerInfo {
        let discovery = self.router.view().discovery_tool().name.clone();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            server_info: Implementation {
                name: "sieve".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Implementation::from_build_env()
            },
            instructions: Some(format!(
                "Only a few tools are listed at a time. Call `{discovery}` with a description of the task to \
                 load the most relevant tools, then list tools again to see them."
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let snapshot = self.router.view().current();
        tracing::debug!(version = snapshot.version, tools = snapshot.tools.len(), "listing tools");

        Ok(ListToolsResult::with_all_items(snapshot.tools.clone()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let dispatched = tokio::select! {
            dispatched = self.router.dispatch(&request.name, request.arguments) => dispatched,
            () = context.ct.cancelled() => {
                tracing::debug!(tool = %request.name, "tool call cancelled by client");
                // the client has abandoned this request, the reply goes unread
                return Err(ErrorData::internal_error("request cancelled", None));
            }
        };

        if dispatched.view_changed
            && let Err(e) = context.peer.notify_tool_list_changed().await
        {
            tracing::warn!(error = %e, "failed to send tool list change notification");
        }

        Ok(dispatched.result)
    }
}

//! MCP core of Sieve
//!
//! Connects to the configured upstream servers, catalogs their tools under
//! namespaced ids and serves a single client a bounded view of them: the
//! discovery tool plus the matches of the latest search.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod catalog;
pub mod error;
pub mod index;
pub mod router;
pub mod session;
pub mod upstream;
pub mod view;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use sieve_config::Config;
use sieve_embeddings::Embedder;
use sieve_telemetry::metrics::McpMetrics;

pub use catalog::{Catalog, ToolDescriptor};
pub use error::McpError;
pub use index::RelevanceIndex;
pub use router::Router;
pub use session::SieveSession;
pub use upstream::{RmcpConnector, UpstreamConnection, UpstreamConnector, UpstreamRegistry, UpstreamStatus};
pub use view::ActiveView;

/// A started proxy: upstreams connected, catalog and index built
pub struct Sieve {
    router: Arc<Router>,
}

impl Sieve {
    /// Connect every enabled server and build the catalog and index
    ///
    /// Fails only when no server could be reached.
    pub async fn start(
        config: &Config,
        connector: &dyn UpstreamConnector,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, McpError> {
        let registry = UpstreamRegistry::connect_all(config.mcp.enabled_servers(), &config.upstreams, connector).await?;

        for (server, reason) in registry.failures() {
            tracing::warn!(server = %server, reason = %reason, "MCP server unavailable for this session");
        }

        let catalog = Catalog::build(&registry, &config.discovery.separator).await;
        let index = RelevanceIndex::build(&catalog, embedder).await;

        tracing::info!(
            servers = registry.ready_servers().len(),
            tools = catalog.len(),
            indexed = index.len(),
            "MCP subsystem initialized"
        );

        let router = Router::new(
            config.discovery.clone(),
            catalog,
            index,
            Arc::new(registry),
            McpMetrics::default(),
        );

        Ok(Self {
            router: Arc::new(router),
        })
    }

    /// Protocol handler for the client session
    pub fn session(&self) -> SieveSession {
        SieveSession::new(Arc::clone(&self.router))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Release every upstream connection
    pub async fn shutdown(&self) {
        let failures = self.router.registry().close().await;
        if failures.is_empty() {
            tracing::info!("all upstream connections released");
        } else {
            tracing::warn!(failed = failures.len(), "some upstream connections were not released cleanly");
        }
    }
}

use std::sync::Arc;

use arc_swap::ArcSwap;
use rmcp::model::Tool;

use crate::catalog::ToolDescriptor;

/// Immutable state of the view at one version
#[derive(Debug)]
pub struct ViewSnapshot {
    pub version: u64,
    /// Discovery tool first, then the matches
    pub tools: Vec<Tool>,
    pub matches: Vec<Arc<ToolDescriptor>>,
}

/// The bounded set of tools currently advertised to the client
///
/// Readers load a snapshot and never see a half-applied update. Writers
/// replace the whole snapshot; callers are expected to serialize writes.
pub struct ActiveView {
    discovery: Tool,
    max_matches: usize,
    current: ArcSwap<ViewSnapshot>,
}

impl ActiveView {
    /// Start at version 0 with only the discovery tool
    pub fn new(discovery: Tool, max_matches: usize) -> Self {
        let initial = ViewSnapshot {
            version: 0,
            tools: vec![discovery.clone()],
            matches: Vec::new(),
        };

        Self {
            discovery,
            max_matches,
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn current(&self) -> Arc<ViewSnapshot> {
        self.current.load_full()
    }

    /// Replace the matches and bump the version
    ///
    /// Matches beyond the cap are dropped. The version moves even when the
    /// new matches equal the old ones.
    pub fn apply_matches(&self, mut matches: Vec<Arc<ToolDescriptor>>) -> Arc<ViewSnapshot> {
        matches.truncate(self.max_matches);

        let mut tools = Vec::with_capacity(matches.len() + 1);
        tools.push(self.discovery.clone());
        tools.extend(matches.iter().map(|descriptor| descriptor.tool.clone()));

        let mut installed = None;
        self.current.rcu(|previous| {
            let next = Arc::new(ViewSnapshot {
                version: previous.version + 1,
                tools: tools.clone(),
                matches: matches.clone(),
            });
            installed = Some(Arc::clone(&next));
            next
        });

        let snapshot = installed.unwrap_or_else(|| self.current());
        tracing::debug!(version = snapshot.version, matches = snapshot.matches.len(), "active view replaced");
        snapshot
    }

    pub fn discovery_tool(&self) -> &Tool {
        &self.discovery
    }
}

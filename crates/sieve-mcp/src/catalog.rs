use std::borrow::Cow;
use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use rmcp::model::{JsonObject, Tool};

use crate::upstream::UpstreamRegistry;

/// Longest description shown in discovery summaries
const SHORT_DESCRIPTION_LEN: usize = 120;

/// One upstream tool under its namespaced id
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// `server` + separator + `local_name`, unique across the catalog
    pub id: String,
    /// Name of the upstream server that owns the tool
    pub server: String,
    /// Name the upstream server knows the tool by
    pub local_name: String,
    /// Tool description, empty when the upstream gave none
    pub description: String,
    /// Tool as advertised to the client, renamed to `id`
    pub tool: Tool,
}

impl ToolDescriptor {
    fn new(server: &str, separator: &str, upstream_tool: Tool) -> Self {
        let local_name = upstream_tool.name.to_string();
        let id = format!("{server}{separator}{local_name}");
        let description = upstream_tool.description.as_deref().unwrap_or_default().to_owned();

        Self {
            tool: Tool {
                name: Cow::Owned(id.clone()),
                ..upstream_tool
            },
            id,
            server: server.to_owned(),
            local_name,
            description,
        }
    }

    /// Parameter schema as the upstream published it
    pub fn input_schema(&self) -> &JsonObject {
        &self.tool.input_schema
    }

    /// First line of the description, cut at a word boundary
    pub fn short_description(&self) -> String {
        let line = self.description.lines().next().unwrap_or_default().trim();
        if line.chars().count() <= SHORT_DESCRIPTION_LEN {
            return line.to_owned();
        }

        let cut: String = line.chars().take(SHORT_DESCRIPTION_LEN).collect();
        let cut = cut.rsplit_once(' ').map_or(cut.as_str(), |(head, _)| head);
        format!("{}...", cut.trim_end())
    }
}

/// Outcome of resolving a namespaced id
#[derive(Debug)]
pub enum Resolution<'a> {
    /// The id names a catalogued tool
    Tool(&'a Arc<ToolDescriptor>),
    /// The id carries a known server prefix but no such tool was catalogued
    ///
    /// Happens when the server failed, or when it is ready and simply has no
    /// tool by that name. The caller tells the two apart by server status.
    Unindexed { server: &'a str, tool: &'a str },
    /// The id matches no server at all
    NotFound,
}

/// Every tool discovered at startup, keyed by namespaced id
///
/// Built once and read-only afterwards. Insertion order follows server
/// configuration order and then each server's own listing order.
pub struct Catalog {
    separator: String,
    /// All configured servers, including the ones that never became ready
    servers: Vec<String>,
    tools: IndexMap<String, Arc<ToolDescriptor>>,
}

impl Catalog {
    /// Fetch tool listings from every ready server and namespace them
    ///
    /// Listings are fetched concurrently. A server whose listing fails is
    /// left out; the rest still make up the catalog.
    pub async fn build(registry: &UpstreamRegistry, separator: &str) -> Self {
        let fetches = registry.ready_servers().into_iter().map(|server| async move {
            match registry.list_tools(server).await {
                Ok(tools) => Some((server.to_owned(), tools)),
                Err(e) => {
                    tracing::warn!(server, error = %e, "failed to fetch tools, server hidden from catalog");
                    None
                }
            }
        });
        let listings = join_all(fetches).await.into_iter().flatten();

        let catalog = Self::from_listings(separator, registry.servers(), listings);

        tracing::info!(tools = catalog.len(), "capability catalog built");

        catalog
    }

    /// Build from listings that were already fetched
    ///
    /// `servers` is every configured server name, ready or not, so that ids
    /// of failed servers still resolve to their server.
    pub fn from_listings<S, L>(separator: &str, servers: S, listings: L) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        L: IntoIterator<Item = (String, Vec<Tool>)>,
    {
        let mut tools = IndexMap::new();

        for (server, listing) in listings {
            let mut added = 0_usize;

            for upstream_tool in listing {
                let local_name = upstream_tool.name.as_ref();

                if local_name.is_empty() {
                    tracing::warn!(server = %server, "rejecting tool with empty name");
                    continue;
                }

                if local_name.contains(separator) {
                    tracing::warn!(
                        server = %server,
                        tool = local_name,
                        separator,
                        "rejecting tool whose name contains the namespace separator"
                    );
                    continue;
                }

                if starts_with_separator_tail(local_name, separator) {
                    tracing::warn!(
                        server = %server,
                        tool = local_name,
                        separator,
                        "rejecting tool whose id could collide with another server's namespace"
                    );
                    continue;
                }

                let descriptor = ToolDescriptor::new(&server, separator, upstream_tool);
                if tools.contains_key(&descriptor.id) {
                    tracing::warn!(server = %server, tool = %descriptor.local_name, "rejecting duplicate tool name");
                    continue;
                }

                tools.insert(descriptor.id.clone(), Arc::new(descriptor));
                added += 1;
            }

            tracing::debug!(server = %server, tools = added, "catalogued server tools");
        }

        Self {
            separator: separator.to_owned(),
            servers: servers.into_iter().map(Into::into).collect(),
            tools,
        }
    }

    /// Resolve a namespaced id back to its server and local name
    ///
    /// Matches against the known server names instead of splitting at the
    /// first or last separator, so the split is never ambiguous.
    pub fn resolve<'a>(&'a self, id: &'a str) -> Resolution<'a> {
        if let Some(descriptor) = self.tools.get(id) {
            return Resolution::Tool(descriptor);
        }

        self.servers
            .iter()
            .filter_map(|server| {
                let tool = id.strip_prefix(server.as_str())?.strip_prefix(self.separator.as_str())?;
                Some((server.as_str(), tool))
            })
            .max_by_key(|(server, _)| server.len())
            .map_or(Resolution::NotFound, |(server, tool)| Resolution::Unindexed { server, tool })
    }

    /// Look up a descriptor by namespaced id
    pub fn get(&self, id: &str) -> Option<&Arc<ToolDescriptor>> {
        self.tools.get(id)
    }

    /// Descriptors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ToolDescriptor>> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

/// Whether `local_name` opens with a proper suffix of `separator`
///
/// With `__`, server `a` with tool `_x` and server `a_` with tool `x` would
/// both map to `a___x`. Refusing such local names keeps ids from different
/// servers apart.
fn starts_with_separator_tail(local_name: &str, separator: &str) -> bool {
    separator
        .char_indices()
        .skip(1)
        .any(|(i, _)| local_name.starts_with(&separator[i..]))
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use serde_json::json;
    use sieve_config::{McpServerType, UpstreamsConfig};

    use super::*;
    use crate::error::McpError;
    use crate::testing;
    use crate::upstream::{UpstreamConnection, UpstreamConnector, UpstreamStatus};

    pub(crate) fn tool(name: &str, description: &str) -> Tool {
        let schema = json!({
            "type": "object",
            "properties": { "path": { "type": "string", "description": "Path to operate on" } }
        });
        let serde_json::Value::Object(schema) = schema else {
            unreachable!()
        };
        Tool::new(name.to_owned(), description.to_owned(), Arc::new(schema))
    }

    fn catalog(servers: &[&str], listings: Vec<(&str, Vec<Tool>)>) -> Catalog {
        Catalog::from_listings(
            "::",
            servers.iter().copied(),
            listings.into_iter().map(|(server, tools)| (server.to_owned(), tools)),
        )
    }

    #[test]
    fn namespaces_tools_in_order() {
        let catalog = catalog(
            &["fs", "gh"],
            vec![
                ("fs", vec![tool("read_file", "Read a file"), tool("list_directory", "List a directory")]),
                ("gh", vec![tool("create_issue", "Create an issue")]),
            ],
        );

        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["fs::read_file", "fs::list_directory", "gh::create_issue"]);

        let descriptor = catalog.get("fs::read_file").unwrap();
        assert_eq!(descriptor.tool.name, "fs::read_file");
        assert_eq!(descriptor.local_name, "read_file");
        assert_eq!(descriptor.server, "fs");
        assert!(descriptor.input_schema().contains_key("properties"));
    }

    #[test]
    fn rejects_separator_in_local_name_but_keeps_server() {
        let catalog = catalog(
            &["fs"],
            vec![("fs", vec![tool("a::b", "ambiguous"), tool("read_file", "Read a file")])],
        );

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("fs::a::b").is_none());
        assert!(catalog.get("fs::read_file").is_some());
    }

    #[test]
    fn first_duplicate_wins() {
        let catalog = catalog(
            &["fs"],
            vec![("fs", vec![tool("read_file", "first"), tool("read_file", "second"), tool("", "nameless")])],
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("fs::read_file").unwrap().description, "first");
    }

    #[test]
    fn resolution_distinguishes_failed_server_from_unknown() {
        let catalog = catalog(&["fs", "gh"], vec![("fs", vec![tool("read_file", "Read a file")])]);

        assert!(matches!(catalog.resolve("fs::read_file"), Resolution::Tool(d) if d.local_name == "read_file"));
        assert!(matches!(
            catalog.resolve("gh::create_issue"),
            Resolution::Unindexed { server: "gh", tool: "create_issue" }
        ));
        assert!(matches!(
            catalog.resolve("fs::write_file"),
            Resolution::Unindexed { server: "fs", tool: "write_file" }
        ));
        assert!(matches!(catalog.resolve("read_file"), Resolution::NotFound));
        assert!(matches!(catalog.resolve("nope::read_file"), Resolution::NotFound));
    }

    #[test]
    fn resolution_prefers_longest_server_prefix() {
        let catalog = Catalog::from_listings(
            "_",
            ["git", "git_hub"],
            [("git_hub".to_owned(), vec![tool("create", "Create an issue")])],
        );

        assert!(matches!(
            catalog.resolve("git_hub_list"),
            Resolution::Unindexed { server: "git_hub", tool: "list" }
        ));
        assert!(matches!(catalog.resolve("git_hub_create"), Resolution::Tool(d) if d.server == "git_hub"));
    }

    #[test]
    fn ids_never_straddle_server_boundaries() {
        let catalog = Catalog::from_listings(
            "__",
            ["a", "a_"],
            [
                ("a".to_owned(), vec![tool("_x", "Shadows a_"), tool("y", "Plain")]),
                ("a_".to_owned(), vec![tool("x", "Owned by a_")]),
            ],
        );

        let ids: Vec<_> = catalog.iter().map(|d| (d.id.as_str(), d.server.as_str())).collect();
        assert_eq!(ids, [("a__y", "a"), ("a___x", "a_")]);
        assert!(matches!(catalog.resolve("a___x"), Resolution::Tool(d) if d.server == "a_"));
        assert!(matches!(
            catalog.resolve("a___z"),
            Resolution::Unindexed { server: "a_", tool: "z" }
        ));
    }

    #[test]
    fn separator_tail_detection() {
        assert!(starts_with_separator_tail("_x", "__"));
        assert!(starts_with_separator_tail(":x", "::"));
        assert!(starts_with_separator_tail("+x", "-+"));
        assert!(!starts_with_separator_tail("-x", "-+"));
        assert!(!starts_with_separator_tail("x_", "__"));
        assert!(!starts_with_separator_tail("_x", "_"));
    }

    /// Connects every server; only `fs` can list its tools
    struct ListingConnector;

    struct ListingConnection {
        tools: Option<Vec<Tool>>,
    }

    #[async_trait]
    impl UpstreamConnection for ListingConnection {
        async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
            self.tools
                .clone()
                .ok_or_else(|| McpError::Transport("listing refused".to_owned()))
        }

        async fn call_tool(&self, _name: &str, _arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
            Ok(CallToolResult::success(Vec::new()))
        }

        async fn close(&self) -> Result<(), McpError> {
            Ok(())
        }
    }

    #[async_trait]
    impl UpstreamConnector for ListingConnector {
        async fn connect(&self, name: &str, _server_type: &McpServerType) -> Result<Box<dyn UpstreamConnection>, McpError> {
            Ok(Box::new(ListingConnection {
                tools: (name == "fs").then(|| vec![tool("read_file", "Read a file")]),
            }))
        }
    }

    #[tokio::test]
    async fn failed_listing_hides_only_that_server() {
        let registry = UpstreamRegistry::connect_all(&testing::servers(), &UpstreamsConfig::default(), &ListingConnector)
            .await
            .unwrap();

        let catalog = Catalog::build(&registry, "::").await;

        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["fs::read_file"]);
        assert_eq!(registry.status("gh"), Some(UpstreamStatus::Ready));
        assert!(matches!(
            catalog.resolve("gh::create_issue"),
            Resolution::Unindexed { server: "gh", tool: "create_issue" }
        ));
    }

    #[test]
    fn short_description_cuts_at_word_boundary() {
        let long = format!("{}\nsecond line", "word ".repeat(40));
        let catalog = catalog(&["fs"], vec![("fs", vec![tool("read_file", &long)])]);
        let short = catalog.get("fs::read_file").unwrap().short_description();

        assert!(short.ends_with("word..."));
        assert!(short.chars().count() <= SHORT_DESCRIPTION_LEN + 3);
        assert!(!short.contains("second"));
    }
}

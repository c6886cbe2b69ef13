use serde::Deserialize;

/// Discovery tool and active view settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Matches returned by a search when the client does not ask for a count
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Hard cap on tools exposed next to the discovery tool
    #[serde(default = "default_max_active_tools")]
    pub max_active_tools: usize,
    /// Delimiter placed between server name and tool name
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Name under which the discovery tool is advertised
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_active_tools: default_max_active_tools(),
            separator: default_separator(),
            tool_name: default_tool_name(),
        }
    }
}

const fn default_top_k() -> usize {
    5
}

const fn default_max_active_tools() -> usize {
    20
}

fn default_separator() -> String {
    "__".to_owned()
}

fn default_tool_name() -> String {
    "search_tools".to_owned()
}

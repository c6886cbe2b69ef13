use std::path::Path;

use crate::{Config, EmbeddingsConfig};

impl Config {
    /// Load configuration from a file
    ///
    /// TOML is the native format. A `.json` file is read as a legacy
    /// `mcpServers` document. Either way, `{{ env.VAR }}` placeholders are
    /// expanded first and the result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            crate::legacy::from_json(&expanded)?
        } else {
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no upstream is enabled, a server name would
    /// produce ambiguous namespaced tool names, or a limit is out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_discovery()?;
        self.validate_servers()?;
        self.validate_embeddings()?;
        Ok(())
    }

    fn validate_discovery(&self) -> anyhow::Result<()> {
        let discovery = &self.discovery;

        if discovery.separator.is_empty() {
            anyhow::bail!("discovery.separator must not be empty");
        }
        if discovery.tool_name.trim().is_empty() {
            anyhow::bail!("discovery.tool_name must not be empty");
        }
        if discovery.tool_name.contains(&discovery.separator) {
            anyhow::bail!(
                "discovery.tool_name '{}' must not contain the tool separator '{}'",
                discovery.tool_name,
                discovery.separator
            );
        }
        if discovery.top_k == 0 {
            anyhow::bail!("discovery.top_k must be at least 1");
        }
        if discovery.max_active_tools == 0 {
            anyhow::bail!("discovery.max_active_tools must be at least 1");
        }
        if discovery.top_k > discovery.max_active_tools {
            anyhow::bail!(
                "discovery.top_k ({}) cannot exceed discovery.max_active_tools ({})",
                discovery.top_k,
                discovery.max_active_tools
            );
        }

        Ok(())
    }

    fn validate_servers(&self) -> anyhow::Result<()> {
        if self.mcp.enabled_servers().next().is_none() {
            anyhow::bail!("at least one enabled MCP server must be configured under [mcp.servers]");
        }

        let separator = self.discovery.separator.as_str();
        for (name, server) in &self.mcp.servers {
            if name.trim().is_empty() {
                anyhow::bail!("MCP server names must not be empty");
            }
            if name.contains(separator) {
                anyhow::bail!("MCP server '{name}' must not contain the tool separator '{separator}'");
            }
            if server.max_in_flight == 0 {
                anyhow::bail!("MCP server '{name}' must allow at least one call in flight");
            }
        }

        Ok(())
    }

    fn validate_embeddings(&self) -> anyhow::Result<()> {
        match &self.embeddings {
            EmbeddingsConfig::Openai(openai) if openai.model.trim().is_empty() => {
                anyhow::bail!("embeddings.model must not be empty");
            }
            EmbeddingsConfig::Lexical(lexical) if lexical.dimensions == 0 => {
                anyhow::bail!("embeddings.dimensions must be at least 1");
            }
            _ => Ok(()),
        }
    }
}

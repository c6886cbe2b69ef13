//! Programmatic configuration builder for integration tests

use std::collections::HashMap;
use std::time::Duration;

use sieve_config::{Config, McpServerConfig, McpServerType, StdioConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Defaults everywhere, no servers yet
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Add a stdio server; the command is never run by the mock connector
    pub fn with_server(mut self, name: &str) -> Self {
        let server_type = McpServerType::Stdio(StdioConfig {
            command: format!("mcp-{name}"),
            args: Vec::new(),
            env: HashMap::new(),
        });
        self.config
            .mcp
            .servers
            .insert(name.to_owned(), McpServerConfig::new(server_type));
        self
    }

    pub fn with_top_k(mut self, top_k: usize, max_active_tools: usize) -> Self {
        self.config.discovery.top_k = top_k;
        self.config.discovery.max_active_tools = max_active_tools;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.config.upstreams.call_timeout = timeout;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Config {
        self.config.validate().expect("test configuration is valid");
        self.config
    }
}

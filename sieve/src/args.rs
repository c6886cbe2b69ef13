use std::path::PathBuf;

use clap::Parser;

/// Sieve MCP proxy
#[derive(Debug, Parser)]
#[command(
    name = "sieve",
    about = "MCP proxy that exposes a searchable, bounded set of upstream tools",
    version
)]
pub struct Args {
    /// Path to the configuration file (TOML, or legacy `mcpServers` JSON)
    #[arg(short, long, default_value = "sieve.toml", env = "SIEVE_CONFIG")]
    pub config: PathBuf,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info", env = "SIEVE_LOG")]
    pub log_level: String,
}

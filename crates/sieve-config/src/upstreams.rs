use std::time::Duration;

use serde::Deserialize;

/// Connection and call limits shared by all upstream servers
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamsConfig {
    /// Upper bound on a single connection attempt, including the handshake
    #[serde(default = "default_connect_timeout", with = "crate::duration")]
    pub connect_timeout: Duration,
    /// Upper bound on a single forwarded tool call
    #[serde(default = "default_call_timeout", with = "crate::duration")]
    pub call_timeout: Duration,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            call_timeout: default_call_timeout(),
        }
    }
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_call_timeout() -> Duration {
    Duration::from_secs(60)
}

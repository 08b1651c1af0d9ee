use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub identity: IdentityConfig,
    pub transport: TransportConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Log file; relative paths are placed in the log directory. `None` logs to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityConfig {
    pub local_address: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            local_address: "sip:me@localhost".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportConfig {
    pub echo_replies: bool,
    pub latency_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            echo_replies: true,
            latency_ms: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    pub delivery_timeout_ms: u64,
    pub history_page_size: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: 5_000,
            history_page_size: 50,
        }
    }
}

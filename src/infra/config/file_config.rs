use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{AppConfig, ChatConfig, IdentityConfig, LogConfig, TransportConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub identity: Option<FileIdentityConfig>,
    pub transport: Option<FileTransportConfig>,
    pub chat: Option<FileChatConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(identity) = self.identity {
            identity.merge_into(&mut config.identity);
        }

        if let Some(transport) = self.transport {
            transport.merge_into(&mut config.transport);
        }

        if let Some(chat) = self.chat {
            chat.merge_into(&mut config.chat);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileIdentityConfig {
    pub local_address: Option<String>,
}

impl FileIdentityConfig {
    fn merge_into(self, config: &mut IdentityConfig) {
        if let Some(local_address) = self.local_address {
            config.local_address = local_address;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTransportConfig {
    pub echo_replies: Option<bool>,
    pub latency_ms: Option<u64>,
}

impl FileTransportConfig {
    fn merge_into(self, config: &mut TransportConfig) {
        if let Some(echo_replies) = self.echo_replies {
            config.echo_replies = echo_replies;
        }

        if let Some(latency_ms) = self.latency_ms {
            config.latency_ms = latency_ms;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileChatConfig {
    pub delivery_timeout_ms: Option<u64>,
    pub history_page_size: Option<usize>,
}

impl FileChatConfig {
    fn merge_into(self, config: &mut ChatConfig) {
        if let Some(timeout_ms) = self.delivery_timeout_ms {
            config.delivery_timeout_ms = timeout_ms;
        }

        if let Some(page_size) = self.history_page_size {
            config.history_page_size = page_size;
        }
    }
}

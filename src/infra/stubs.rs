use anyhow::Result;

use crate::infra::{config::AppConfig, contracts::ConfigAdapter};

/// Config source that always yields defaults with a fast, non-echoing transport.
#[derive(Debug, Clone, Default)]
pub struct StubConfigAdapter;

impl ConfigAdapter for StubConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::default();
        config.transport.latency_ms = 0;
        config.transport.echo_replies = false;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_config_disables_transport_latency() {
        let config = StubConfigAdapter.load().expect("stub config must load");

        assert_eq!(config.transport.latency_ms, 0);
        assert_eq!(config.logging, AppConfig::default().logging);
    }
}

use std::{path::Path, sync::Arc, time::Duration};

use crate::{
    domain::address::PeerAddress,
    engine::{history::HistoryStore, local::LocalEngine, transport::LoopbackTransport},
    infra::{
        self,
        config::{AppConfig, FileConfigAdapter},
        contracts::ConfigAdapter,
        error::AppError,
    },
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = FileConfigAdapter::new(config_path)
        .load()
        .map_err(AppError::Other)?;
    let log_guard = infra::logging::init(&config.logging)?;

    Ok(build_context(config)?.with_log_guard(log_guard))
}

pub(crate) fn build_context(config: AppConfig) -> Result<AppContext, AppError> {
    let local = PeerAddress::parse(&config.identity.local_address).map_err(|source| {
        AppError::InvalidIdentity {
            address: config.identity.local_address.clone(),
            source,
        }
    })?;

    let transport = LoopbackTransport::new(
        config.transport.echo_replies,
        Duration::from_millis(config.transport.latency_ms),
    );
    let engine = LocalEngine::start(local, Box::new(transport), HistoryStore::default())?;

    Ok(AppContext::new(config, Arc::new(engine)))
}

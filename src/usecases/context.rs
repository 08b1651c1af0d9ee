use std::sync::Arc;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{engine::local::LocalEngine, infra::config::AppConfig, usecases::registry::ChatRooms};

pub struct AppContext {
    pub config: AppConfig,
    pub engine: Arc<LocalEngine>,
    pub rooms: ChatRooms,
    log_guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("file_logging", &self.log_guard.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn new(config: AppConfig, engine: Arc<LocalEngine>) -> Self {
        let rooms = ChatRooms::new(engine.clone());
        Self {
            config,
            engine,
            rooms,
            log_guard: None,
        }
    }

    pub fn with_log_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self.log_guard = guard;
        self
    }
}

use std::path::PathBuf;

use crate::infra::error::AppError;

const APP_DIR_NAME: &str = "sipchat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl StorageLayout {
    pub fn resolve() -> Result<Self, AppError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::StoragePathResolution {
                details: "unable to resolve user config directory".into(),
            })?
            .join(APP_DIR_NAME);

        let log_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|base| base.join(APP_DIR_NAME).join("logs"))
            .unwrap_or_else(|| config_dir.join("logs"));

        Ok(Self {
            config_dir,
            log_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Resolves a configured log file name against the log directory.
    pub fn log_file(&self, configured: &std::path::Path) -> PathBuf {
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.log_dir.join(configured)
        }
    }
}

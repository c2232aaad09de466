//! Estado compartido de la aplicación

use crate::config::EnvironmentConfig;
use crate::repositories::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repositories: Repositories,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, repositories: Repositories) -> Self {
        Self {
            config,
            repositories,
        }
    }
}

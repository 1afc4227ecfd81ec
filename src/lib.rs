pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    attempt_service::AttemptService, platform_client::PlatformApi,
    session_service::SessionService,
};

#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<dyn PlatformApi>,
    pub sessions: SessionService,
    pub attempts: AttemptService,
    pub guest_code_ttl_hours: i64,
}

impl AppState {
    pub fn new(config: &Config, platform: Arc<dyn PlatformApi>) -> Self {
        let sessions = SessionService::new(config.jwt_secret.clone(), config.session_ttl_hours);
        let attempts = AttemptService::new(platform.clone());

        Self {
            platform,
            sessions,
            attempts,
            guest_code_ttl_hours: config.guest_code_ttl_hours,
        }
    }
}

use crate::config::Config;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};

/// Shared resources threaded through every scraper, parser and
/// reconciliation task: one pooled database connection and one pooled
/// HTTP client, both cheap to clone (`DatabaseConnection` and `Client`
/// are themselves `Arc`-backed internally).
///
/// Unlike a long-lived server, this pipeline runs one batch and exits, so
/// resources live in an explicit context passed down to workers rather
/// than behind a global static.
#[derive(Clone)]
pub struct AppContext {
    pub db: DatabaseConnection,
    pub http: Client,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .expect("Unable to build HTTP client");

        Self {
            db,
            http,
            config: Arc::new(config),
        }
    }

    pub fn cache_dir(&self) -> &str {
        &self.config.cache_dir
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}

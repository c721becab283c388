//! Client for the database holding aggregation tables.

use crate::config::ClickHouseConfig;
use crate::error::{ClientError, Result};
use clickhouse::Client;
use tracing::info;

/// Handle to the database holding the aggregation tables.
///
/// Cheap to clone; every clone shares the underlying HTTP client.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Rejects an empty URL; nothing is sent to the server here.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("url must not be empty".to_string()));
        }

        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }
}

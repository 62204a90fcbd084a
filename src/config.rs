use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info};

use crate::error::{ClientError, Result};
use crate::message::Destination;

const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct Config {
    pub directory_path: PathBuf,
    pub destination: Destination,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let directory_path = env::var("CHATLINK_DIRECTORY").map_err(|e| {
            error!("Failed to load CHATLINK_DIRECTORY from environment: {}", e);
            e
        })?;

        let user_id = env::var("CHATLINK_USER_ID").ok();
        let group_id = env::var("CHATLINK_GROUP_ID").ok();
        let destination =
            Destination::from_ids(user_id.as_deref(), group_id.as_deref()).map_err(|e| {
                error!("Set exactly one of CHATLINK_USER_ID or CHATLINK_GROUP_ID: {}", e);
                e
            })?;

        let poll_interval = match env::var("CHATLINK_POLL_INTERVAL_MS") {
            Ok(raw) => parse_poll_interval(&raw).inspect_err(|e| {
                error!("Invalid CHATLINK_POLL_INTERVAL_MS: {}", e);
            })?,
            Err(_) => Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        };

        info!("Configuration loaded successfully");
        debug!("User directory: {}", directory_path);
        debug!(
            "Default destination: {} {}",
            destination.thread_type(),
            destination.id()
        );
        debug!("Poll interval: {:?}", poll_interval);

        Ok(Self {
            directory_path: PathBuf::from(directory_path),
            destination,
            poll_interval,
        })
    }
}

fn parse_poll_interval(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ClientError::Config(format!(
            "poll interval must be a positive number of milliseconds, got {raw:?}"
        ))),
    }
}

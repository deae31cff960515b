use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store_url: String,
    pub bind_addr: SocketAddr,
    pub heartbeat_interval_secs: u64,
    pub abandoned_after_secs: u64,
    pub session_log_page_size: i64,
    pub identity_path: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store_url = env::var("PRESENCE_STORE_URL")
            .unwrap_or_else(|_| "postgres://localhost/wardboard".to_string());

        let bind_addr: SocketAddr = env::var("PRESENCE_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8087".to_string())
            .parse()
            .map_err(|_| anyhow!("Invalid PRESENCE_BIND_ADDR value"))?;

        let heartbeat_interval_secs = env::var("PRESENCE_HEARTBEAT_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let abandoned_after_secs = env::var("PRESENCE_ABANDONED_AFTER_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let session_log_page_size = env::var("PRESENCE_SESSION_LOG_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        let identity_path = env::var("PRESENCE_IDENTITY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".wardboard/session-id"));

        // Idle only means the user stopped interacting; abandoned means the
        // process is gone. The thresholds must keep that ordering.
        if abandoned_after_secs <= heartbeat_interval_secs * 2 {
            return Err(anyhow!(
                "PRESENCE_ABANDONED_AFTER_SECS ({}) must exceed twice the heartbeat interval ({})",
                abandoned_after_secs,
                heartbeat_interval_secs
            ));
        }

        Ok(Config {
            store_url,
            bind_addr,
            heartbeat_interval_secs,
            abandoned_after_secs,
            session_log_page_size,
            identity_path,
        })
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn abandoned_after(&self) -> Duration {
        Duration::from_secs(self.abandoned_after_secs)
    }
}

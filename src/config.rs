use std::{env, path::PathBuf, time::Duration};

use crate::workflow::TransitionPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub transition_policy: TransitionPolicy,
    pub chatbot_delay: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "static/uploads".to_string());
        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .unwrap_or(24);
        let transition_policy = match env::var("ORDER_TRANSITIONS") {
            Ok(raw) => raw.parse::<TransitionPolicy>()?,
            Err(_) => TransitionPolicy::default(),
        };
        let chatbot_delay = env::var("CHATBOT_DELAY_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(1));

        Ok(Self {
            host,
            port,
            data_dir: data_dir.into(),
            upload_dir: upload_dir.into(),
            jwt_secret,
            token_ttl_hours,
            transition_policy,
            chatbot_delay,
        })
    }

    /// Settings for tests and tools that run against a throwaway directory.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, jwt_secret: impl Into<String>) -> Self {
        let data_dir = data_dir.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: data_dir.join("uploads"),
            data_dir,
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 24,
            transition_policy: TransitionPolicy::default(),
            chatbot_delay: Duration::ZERO,
        }
    }
}

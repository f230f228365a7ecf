use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::actions::ImportRetry;

/// Runtime configuration, from flags or the environment. The backend is
/// injected; nothing is discovered at runtime.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Base URL of the console backend, e.g. https://console.example.com/multicloud
    #[arg(long, env = "CONSOLE_BACKEND_URL")]
    pub backend_url: Url,

    /// Bearer token for the backend session
    #[arg(long, env = "CONSOLE_BACKEND_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Listener for the diagnostics server
    #[arg(long, env = "CONSOLE_BIND_ADDR", default_value = "0.0.0.0:8443")]
    pub bind_addr: SocketAddr,

    /// Seconds between session liveness probes
    #[arg(long, env = "CONSOLE_SESSION_INTERVAL", default_value_t = 30)]
    pub session_interval_secs: u64,

    /// Milliseconds between polls for a generated import secret
    #[arg(long, default_value_t = 500)]
    pub import_poll_millis: u64,

    /// Import secret polls before giving up
    #[arg(long, default_value_t = 20)]
    pub import_poll_attempts: u32,
}

impl Config {
    pub fn session_interval(&self) -> Duration {
        Duration::from_secs(self.session_interval_secs)
    }

    pub fn import_retry(&self) -> ImportRetry {
        ImportRetry {
            interval: Duration::from_millis(self.import_poll_millis),
            attempts: self.import_poll_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_require_the_backend_url() {
        let config = Config::try_parse_from([
            "hub-console-sync",
            "--backend-url",
            "https://console.example.com/multicloud",
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8443");
        assert_eq!(config.session_interval(), Duration::from_secs(30));
        assert_eq!(config.import_retry().attempts, 20);
        assert!(config.token.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "hub-console-sync",
            "--backend-url",
            "https://console.example.com",
            "--bind-addr",
            "127.0.0.1:9000",
            "--session-interval-secs",
            "5",
        ])
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.session_interval(), Duration::from_secs(5));
    }
}

use crate::constants::{HOST, HTTP_PORT, KEEPALIVE_PORT};
use tokio::time::Duration;

/// Connection details and timing tunables for a [`YiDashcam`](crate::YiDashcam).
///
/// The settle and poll values are empirical: the firmware needs some time after
/// a mode switch before it accepts configuration writes.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub host: String,
    pub http_port: u16,
    pub keepalive_port: u16,
    pub http_timeout: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
    pub mode_settle: Duration,
    pub record_poll: Duration,
    pub record_poll_limit: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            http_port: HTTP_PORT,
            keepalive_port: KEEPALIVE_PORT,
            http_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(10),
            keepalive_timeout: Duration::from_secs(10),
            mode_settle: Duration::from_secs(2),
            record_poll: Duration::from_millis(100),
            record_poll_limit: 50,
        }
    }
}

impl ClientSettings {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_keepalive_port(mut self, port: u16) -> Self {
        self.keepalive_port = port;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_keepalive_timeout(mut self, timeout: Duration) -> Self {
        self.keepalive_timeout = timeout;
        self
    }

    pub fn with_mode_settle(mut self, settle: Duration) -> Self {
        self.mode_settle = settle;
        self
    }

    pub fn with_record_poll(mut self, poll: Duration, limit: u32) -> Self {
        self.record_poll = poll;
        self.record_poll_limit = limit;
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.http_port)
    }
}

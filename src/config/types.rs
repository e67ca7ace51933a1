use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Prospector
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Stop accepting new URLs after this many seconds (0 disables)
    #[serde(rename = "stop-after-seconds", default = "default_ttl_seconds")]
    pub stop_after_seconds: u64,

    /// Abort in-flight fetches after this many seconds (0 disables).
    /// Takes precedence over `stop_after_seconds` when non-zero.
    #[serde(rename = "cancel-after-seconds", default = "default_ttl_seconds")]
    pub cancel_after_seconds: u64,

    /// Per-request timeout
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl CrawlerConfig {
    pub fn stop_after(&self) -> Duration {
        Duration::from_secs(self.stop_after_seconds)
    }

    pub fn cancel_after(&self) -> Duration {
        Duration::from_secs(self.cancel_after_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 10,
            stop_after_seconds: default_ttl_seconds(),
            cancel_after_seconds: default_ttl_seconds(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Mailbox probing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Host name announced in EHLO/HELO
    #[serde(rename = "helo-host", default = "default_helo_host")]
    pub helo_host: String,

    /// Envelope sender used for MAIL FROM
    #[serde(rename = "from-address", default = "default_from_address")]
    pub from_address: String,

    /// SMTP port on the mail exchanger
    #[serde(rename = "smtp-port", default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(rename = "connect-timeout-seconds", default = "default_mail_timeout")]
    pub connect_timeout_seconds: u64,

    /// Timeout for each SMTP command/reply exchange
    #[serde(rename = "command-timeout-seconds", default = "default_mail_timeout")]
    pub command_timeout_seconds: u64,
}

impl MailConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            helo_host: default_helo_host(),
            from_address: default_from_address(),
            smtp_port: default_smtp_port(),
            connect_timeout_seconds: default_mail_timeout(),
            command_timeout_seconds: default_mail_timeout(),
        }
    }
}

/// Batch crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Upper bound for a single crawl inside a batch (0 disables)
    #[serde(rename = "crawl-timeout-seconds", default = "default_crawl_timeout")]
    pub crawl_timeout_seconds: u64,
}

impl BatchConfig {
    pub fn crawl_timeout(&self) -> Option<Duration> {
        (self.crawl_timeout_seconds > 0).then(|| Duration::from_secs(self.crawl_timeout_seconds))
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            crawl_timeout_seconds: default_crawl_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the single-instance lock file
    #[serde(rename = "lock-path", default = "default_lock_path")]
    pub lock_path: String,
}

fn default_ttl_seconds() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    10
}

fn default_helo_host() -> String {
    "localhost".to_string()
}

fn default_from_address() -> String {
    "probe@localhost.localdomain".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_mail_timeout() -> u64 {
    10
}

fn default_crawl_timeout() -> u64 {
    120
}

fn default_lock_path() -> String {
    "./prospector.lock".to_string()
}

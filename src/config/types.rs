use serde::Deserialize;

/// Default mirror address
const DEFAULT_BASE_URL: &str = "https://nitter.net";

/// Default browser-shaped user agent sent with every request
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15";

/// Main configuration structure for Magpie
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the built-in defaults, so running without a config file works.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mirror: MirrorConfig,
    pub pacing: PacingConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror: MirrorConfig::default(),
            pacing: PacingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Mirror address and request-shape configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Base address of the mirror
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Optional referer rotation pool; one entry is picked per request
    pub referers: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            referers: Vec::new(),
        }
    }
}

/// Request pacing and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Base delay between page requests (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Upper bound of the random component added to the base delay
    /// (milliseconds); 0 disables jitter
    #[serde(rename = "jitter-ms")]
    pub jitter_ms: u64,

    /// Cooldown before retrying a rate-limited request (seconds)
    #[serde(rename = "rate-limit-cooldown-secs")]
    pub rate_limit_cooldown_secs: u64,

    /// Additional attempts after a transient transport failure
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Delay between transient-failure attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 2000,
            jitter_ms: 1000,
            rate_limit_cooldown_secs: 30,
            retry_attempts: 2,
            retry_delay_ms: 2000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the persisted JSON collection
    #[serde(rename = "collection-path")]
    pub collection_path: String,

    /// Optional directory receiving one raw HTML file per fetched page
    #[serde(rename = "archive-dir")]
    pub archive_dir: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            collection_path: "posts.json".to_string(),
            archive_dir: None,
        }
    }
}

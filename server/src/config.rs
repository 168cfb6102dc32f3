use {
    anyhow::Result,
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    std::{
        fs,
        time::Duration,
    },
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the auction server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file containing the engine tunables
    #[arg(long = "config")]
    #[arg(env = "BIDHUB_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// How often the lifecycle sweeper re-evaluates auction statuses.
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub sweep_interval: Duration,

    /// Time-to-live of leading-bid entries in the fast-path cache. Bounds
    /// staleness after an auction ends; reads fall back to the ledger.
    #[serde(with = "humantime_serde", default = "default_leading_bid_ttl")]
    pub leading_bid_ttl: Duration,

    #[serde(default)]
    pub bid_rate_limit: BidRateLimitConfig,

    #[serde(default)]
    pub websocket: WebsocketConfig,
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_leading_bid_ttl() -> Duration {
    Duration::from_secs(3600)
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BidRateLimitConfig {
    /// Maximum bid attempts per user within the window.
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub window:       Duration,
}

impl Default for BidRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window:       Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WebsocketConfig {
    /// Header to read the requester ip from, for the per-ip connection cap.
    pub requester_ip_header_name: String,
    pub max_connections_per_ip:   usize,
    pub broadcast_channel_size:   usize,
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            requester_ip_header_name: "X-Forwarded-For".to_string(),
            max_connections_per_ip:   10,
            broadcast_channel_size:   1000,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}

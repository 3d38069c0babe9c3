// Configuration management for zroute
// Supports CLI arguments, config file (TOML), and environment variables

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

use crate::error::{ZrouteError, ZrouteResult};

/// Default zserv socket of the Zebra daemon
pub const DEFAULT_ZSERV_PATH: &str = "/var/run/quagga/zserv.api";

/// Add or delete static IPv4 routes through the Zebra routing daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "zroute")]
#[command(version = concat!("v", env!("CARGO_PKG_VERSION")), about, long_about = None)]
#[command(disable_version_flag = true)]
#[command(override_usage = "zroute [OPTIONS] {add|del} (default | [-net|-host] TARGET[/LEN] [netmask MASK]) [gw GATEWAY] [dev IFNAME] [metric METRIC]")]
pub struct CliArgs {
    /// Verbose output, traces the exchange with the daemon and echoes its replies
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Display version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Path to configuration file
    #[arg(short, long, env = "ZROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Daemon endpoint: unix:PATH, PATH, tcp:HOST:PORT or IP:PORT
    #[arg(long, env = "ZROUTE_DAEMON")]
    pub daemon: Option<String>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, env = "ZROUTE_LOG")]
    pub log_level: Option<String>,

    /// Route command followed by its keyword/value pairs
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub tokens: Vec<String>,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Daemon connection settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Route defaults
    #[serde(default)]
    pub route: RouteConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// zserv endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// zserv header version (1-3)
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouteConfig {
    /// Metric used when the command has no `metric` keyword
    #[serde(default)]
    pub default_metric: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_endpoint() -> String {
    format!("unix:{DEFAULT_ZSERV_PATH}")
}
fn default_protocol_version() -> u8 {
    2
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            endpoint: default_endpoint(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Where the Zebra daemon listens for zclient connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl FromStr for DaemonEndpoint {
    type Err = ZrouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix:") {
            return Ok(DaemonEndpoint::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp:") {
            return Ok(DaemonEndpoint::Tcp(addr.to_string()));
        }
        if s.starts_with('/') {
            return Ok(DaemonEndpoint::Unix(PathBuf::from(s)));
        }
        if s.parse::<std::net::SocketAddr>().is_ok() {
            return Ok(DaemonEndpoint::Tcp(s.to_string()));
        }
        Err(ZrouteError::Config(format!("unrecognized daemon endpoint: {s}")))
    }
}

impl fmt::Display for DaemonEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonEndpoint::Unix(path) => write!(f, "unix:{}", path.display()),
            DaemonEndpoint::Tcp(addr) => write!(f, "tcp:{addr}"),
        }
    }
}

/// Merged configuration from all sources, passed explicitly to parser, encoder and session
#[derive(Debug, Clone)]
pub struct Config {
    pub verbose: bool,
    pub log_level: Level,
    pub endpoint: DaemonEndpoint,
    pub protocol_version: u8,
    pub default_metric: u32,
    /// Config file the values were read from, if any
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbose: false,
            log_level: Level::WARN,
            endpoint: DaemonEndpoint::Unix(PathBuf::from(DEFAULT_ZSERV_PATH)),
            protocol_version: default_protocol_version(),
            default_metric: 0,
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load(cli_args: &CliArgs) -> ZrouteResult<Self> {
        let (config_file, source) = if let Some(config_path) = &cli_args.config {
            (read_config_file(config_path)?, Some(config_path.clone()))
        } else {
            // Try loading from default locations
            let default_paths = vec![
                PathBuf::from("/etc/quagga/zroute.toml"),
                PathBuf::from("zroute.toml"),
            ];

            let mut loaded = None;
            for path in default_paths {
                if path.exists() {
                    loaded = Some((read_config_file(&path)?, path));
                    break;
                }
            }

            match loaded {
                Some((file, path)) => (file, Some(path)),
                None => (ConfigFile::default(), None),
            }
        };

        let mut config = Self::merge(cli_args, config_file)?;
        config.source = source;
        Ok(config)
    }

    /// Merge configuration (CLI args override config file)
    pub fn merge(cli_args: &CliArgs, config_file: ConfigFile) -> ZrouteResult<Self> {
        let endpoint: DaemonEndpoint = cli_args
            .daemon
            .as_deref()
            .unwrap_or(&config_file.daemon.endpoint)
            .parse()?;

        let protocol_version = config_file.daemon.protocol_version;
        if !(1..=3).contains(&protocol_version) {
            return Err(ZrouteError::Config(format!(
                "unsupported zserv protocol version: {protocol_version}"
            )));
        }

        let log_level = match &cli_args.log_level {
            Some(level) => parse_log_level(level)?,
            None => parse_log_level(&config_file.logging.level)?,
        };
        // Verbose never lowers an explicitly chosen trace level
        let log_level = if cli_args.verbose && log_level != Level::TRACE {
            Level::DEBUG
        } else {
            log_level
        };

        Ok(Config {
            verbose: cli_args.verbose,
            log_level,
            endpoint,
            protocol_version,
            default_metric: config_file.route.default_metric,
            source: None,
        })
    }
}

fn read_config_file(path: &Path) -> ZrouteResult<ConfigFile> {
    let config_content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config_file = toml::from_str::<ConfigFile>(&config_content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config_file)
}

fn parse_log_level(level_str: &str) -> ZrouteResult<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(ZrouteError::Config(format!("Invalid log level: {}", level_str))),
    }
}

//! Configuration file management for triplan.
//!
//! Provides a TOML-based config file at `~/.config/triplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use triplan_core::itinerary::{Extractor, HeaderPattern, PlaceRule, PlaceTable, Segmenter};
use triplan_core::planner::HttpTripPlanner;
use triplan_db::config::DbConfig;

pub const DEFAULT_PLANNER_URL: &str = "http://localhost:50051";
pub const DEFAULT_PLANNER_TIMEOUT_SECS: u64 = 250;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8085;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

/// Every section may be omitted; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub planner: PlannerSection,
    pub server: ServerSection,
    pub itinerary: ItinerarySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSection {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_PLANNER_URL.to_string(),
            timeout_secs: DEFAULT_PLANNER_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
    pub allowed_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

/// Header day words and the place keyword table. An empty `places` list
/// means the built-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItinerarySection {
    pub day_words: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub places: Vec<PlaceRule>,
}

impl Default for ItinerarySection {
    fn default() -> Self {
        Self {
            day_words: HeaderPattern::DEFAULT_DAY_WORDS
                .iter()
                .map(|w| (*w).to_string())
                .collect(),
            places: Vec::new(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the triplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/triplan` or `~/.config/triplan`.
/// The platform-specific `dirs::config_dir()` is not used (it returns
/// `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("triplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("triplan")
}

/// Return the path to the triplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(&config_path(), config)
}

/// Write `config` to `path`. Sets file permissions to 0600 on Unix.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct TriplanConfig {
    pub db_config: DbConfig,
    pub planner_url: String,
    pub planner_timeout: Duration,
    pub bind: String,
    pub port: u16,
    pub allowed_origin: String,
    pub itinerary: ItinerarySection,
}

impl TriplanConfig {
    /// Resolve against the process environment and the config file, if any.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file_config = load_config().ok();
        Self::resolve_with(cli, file_config, |key| std::env::var(key).ok())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli.database_url` > `TRIPLAN_DATABASE_URL` > `DB_*` parts >
    ///   `database.url`
    /// - Planner URL: `TRIPLAN_PLANNER_URL` > `AI_SERVICE_ADDR` > `planner.url`
    /// - Port: `cli.port` > `PORT` > `server.port`
    pub fn resolve_with(
        cli: &CliOverrides,
        file_config: Option<ConfigFile>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_config = match &cli.database_url {
            Some(url) => DbConfig::new(url.clone()),
            None => DbConfig::from_lookup(&env)
                .unwrap_or_else(|| DbConfig::new(file.database.url.clone())),
        };

        let planner_url = env("TRIPLAN_PLANNER_URL")
            .or_else(|| env("AI_SERVICE_ADDR"))
            .map(with_scheme)
            .unwrap_or(file.planner.url);

        let port = match (cli.port, env("PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => file.server.port,
        };

        if file.planner.timeout_secs == 0 {
            bail!("planner.timeout_secs must be at least 1");
        }

        Ok(Self {
            db_config,
            planner_url,
            planner_timeout: Duration::from_secs(file.planner.timeout_secs),
            bind: cli.bind.clone().unwrap_or(file.server.bind),
            port,
            allowed_origin: file.server.allowed_origin,
            itinerary: file.itinerary,
        })
    }

    /// Build the itinerary extractor from the `[itinerary]` section.
    pub fn extractor(&self) -> Result<Extractor> {
        let header = HeaderPattern::new(&self.itinerary.day_words)
            .context("invalid itinerary.day_words")?;
        let places = if self.itinerary.places.is_empty() {
            PlaceTable::builtin()
        } else {
            PlaceTable::new(self.itinerary.places.clone())
        };
        Ok(Extractor::new(Segmenter::new(header, places)))
    }

    pub fn planner(&self) -> HttpTripPlanner {
        HttpTripPlanner::new(self.planner_url.clone()).with_timeout(self.planner_timeout)
    }
}

/// `AI_SERVICE_ADDR` is conventionally a bare `host:port`.
fn with_scheme(addr: String) -> String {
    if addr.contains("://") {
        addr
    } else {
        format!("http://{addr}")
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

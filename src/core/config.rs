//! # Configuration
//!
//! Provider endpoints and session behavior, layered as
//! defaults → config file → env vars → CLI flags.
//!
//! The file lives at `~/.stepnav/config.toml`. On first run a fully
//! commented template is written there listing every key.

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::instruction::InstructionTemplate;
use crate::core::state::{AdvancePolicy, SessionSettings};
use crate::services::TravelMode;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StepnavConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub nominatim: NominatimConfig,
    #[serde(default)]
    pub osrm: OsrmConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub advance_policy: Option<AdvancePolicy>,
    pub instruction_template: Option<InstructionTemplate>,
    pub travel_mode: Option<TravelMode>,
    pub arrival_message: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NominatimConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OsrmConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_USER_AGENT: &str = concat!("stepnav/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_ARRIVAL_MESSAGE: &str = "You have arrived at your destination";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub advance_policy: AdvancePolicy,
    pub instruction_template: InstructionTemplate,
    pub travel_mode: TravelMode,
    pub arrival_message: String,
    pub log_level: LevelFilter,
    pub nominatim_base_url: String,
    pub osrm_base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ResolvedConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            advance_policy: self.advance_policy,
            template: self.instruction_template,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.stepnav/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".stepnav").join("config.toml"))
}

/// Load config from `~/.stepnav/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `StepnavConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<StepnavConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(StepnavConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(StepnavConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: StepnavConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Writes the commented template to `path`. Failures are logged only.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# stepnav configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# advance_policy = "permissive"        # "permissive" or "strict_ordered"
# instruction_template = "original"    # "original" or "unified"
# travel_mode = "driving"              # "driving", "walking", "cycling"
# arrival_message = "You have arrived at your destination"
# log_level = "debug"

# [nominatim]
# base_url = "https://nominatim.openstreetmap.org"   # Or STEPNAV_NOMINATIM_URL
# user_agent = "stepnav/0.1.0 (you@example.com)"     # Or STEPNAV_USER_AGENT

# [osrm]
# base_url = "https://router.project-osrm.org"       # Or STEPNAV_OSRM_URL

# [http]
# timeout_secs = 15
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_policy` comes from the `--policy` flag (None = not specified).
pub fn resolve(config: &StepnavConfig, cli_policy: Option<AdvancePolicy>) -> ResolvedConfig {
    // Policy: CLI → config → default
    let advance_policy = cli_policy
        .or(config.general.advance_policy)
        .unwrap_or_default();

    // Nominatim URL: env → config → default
    let nominatim_base_url = std::env::var("STEPNAV_NOMINATIM_URL")
        .ok()
        .or_else(|| config.nominatim.base_url.clone())
        .unwrap_or_else(|| DEFAULT_NOMINATIM_BASE_URL.to_string());

    // OSRM URL: env → config → default
    let osrm_base_url = std::env::var("STEPNAV_OSRM_URL")
        .ok()
        .or_else(|| config.osrm.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OSRM_BASE_URL.to_string());

    // User agent: env → config → default
    let user_agent = std::env::var("STEPNAV_USER_AGENT")
        .ok()
        .or_else(|| config.nominatim.user_agent.clone())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    ResolvedConfig {
        advance_policy,
        instruction_template: config.general.instruction_template.unwrap_or_default(),
        travel_mode: config.general.travel_mode.unwrap_or_default(),
        arrival_message: config
            .general
            .arrival_message
            .clone()
            .unwrap_or_else(|| DEFAULT_ARRIVAL_MESSAGE.to_string()),
        log_level: resolve_log_level(config.general.log_level.as_deref()),
        nominatim_base_url,
        osrm_base_url,
        user_agent,
        timeout: Duration::from_secs(config.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}

/// Parses a level name, falling back to `Debug` on anything unrecognized.
fn resolve_log_level(level: Option<&str>) -> LevelFilter {
    match level {
        Some(name) => name.parse().unwrap_or_else(|_| {
            warn!("Unknown log level '{}', using debug", name);
            LevelFilter::Debug
        }),
        None => LevelFilter::Debug,
    }
}

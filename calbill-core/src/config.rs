//! calbill configuration.
//!
//! Loaded from `~/.config/calbill/config.toml` with environment variables
//! prefixed `CALBILL_` layered on top (`__` separates nested keys, e.g.
//! `CALBILL_BILLY__API_TOKEN`). The config is passed explicitly to whatever
//! needs it; nothing reads it from global state.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalBillError, CalBillResult};

static DEFAULT_DATA_DIR: &str = "~/.calbill";
const STORE_FILE: &str = "store.json";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_billing_system() -> String {
    "billy".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_lookback_days() -> i64 {
    30
}

/// Which billing system to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingSystemKind {
    Economic,
    Billy,
}

impl BillingSystemKind {
    pub fn from_key(key: &str) -> CalBillResult<Self> {
        match key {
            "economic" => Ok(BillingSystemKind::Economic),
            "billy" => Ok(BillingSystemKind::Billy),
            other => Err(CalBillError::UnsupportedSystem(other.to_string())),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            BillingSystemKind::Economic => "economic",
            BillingSystemKind::Billy => "billy",
        }
    }
}

impl FromStr for BillingSystemKind {
    type Err = CalBillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EconomicConfig {
    #[serde(default)]
    pub app_secret_token: String,
    #[serde(default)]
    pub agreement_grant_token: String,
    /// Override for the REST API root (tests, proxies)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillyConfig {
    #[serde(default)]
    pub api_token: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSourceKind {
    #[default]
    Google,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub source: CalendarSourceKind,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default)]
    pub access_token: String,
    /// How far back to look for events
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Event file for the `file` source
    pub path: Option<PathBuf>,
    pub base_url: Option<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            source: CalendarSourceKind::default(),
            calendar_id: default_calendar_id(),
            access_token: String::new(),
            lookback_days: default_lookback_days(),
            path: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Billing system used when a command doesn't name one
    #[serde(default = "default_billing_system")]
    pub billing_system: String,

    #[serde(default)]
    pub economic: EconomicConfig,

    #[serde(default)]
    pub billy: BillyConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            billing_system: default_billing_system(),
            economic: EconomicConfig::default(),
            billy: BillyConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Config {
    pub fn config_path() -> CalBillResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalBillError::Config("Could not determine config directory".into()))?
            .join("calbill");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first
    /// if no config file exists.
    pub fn load() -> CalBillResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    /// Load from `path` (optional) plus the environment.
    pub fn load_from(path: &Path) -> CalBillResult<Self> {
        ConfigBuilder::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("CALBILL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CalBillError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalBillError::Config(e.to_string()))
    }

    /// Tilde-expanded data directory.
    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_path().join(STORE_FILE)
    }

    /// Tilde-expanded event file for the `file` calendar source.
    pub fn events_path(&self) -> CalBillResult<PathBuf> {
        let path = self.calendar.path.as_ref().ok_or_else(|| {
            CalBillError::Config("calendar.path must be set when calendar.source = \"file\"".into())
        })?;
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        Ok(PathBuf::from(expanded))
    }

    /// The billing system named by `key`, or the configured default.
    pub fn billing_kind(&self, key: Option<&str>) -> CalBillResult<BillingSystemKind> {
        BillingSystemKind::from_key(key.unwrap_or(&self.billing_system))
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> CalBillResult<()> {
        let contents = format!(
            "\
# calbill configuration

# Where the appointment store lives:
# data_dir = \"{DEFAULT_DATA_DIR}\"

# Billing system used by default (\"billy\" or \"economic\"):
# billing_system = \"billy\"

# [billy]
# api_token = \"...\"

# [economic]
# app_secret_token = \"...\"
# agreement_grant_token = \"...\"

# [calendar]
# source = \"google\"        # or \"file\"
# calendar_id = \"primary\"
# access_token = \"...\"
# lookback_days = 30
# path = \"~/events.json\"   # for source = \"file\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalBillError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalBillError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

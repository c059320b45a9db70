//! Palette configuration.
//!
//! Precedence (lowest to highest): built-in defaults, `<data_dir>/palette.toml`,
//! `FOLIO_*` environment variables, command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::model::types::SessionIdentity;
use crate::search::debounce::DEFAULT_DEBOUNCE;
use crate::search::dispatch::DEFAULT_MIN_QUERY_LEN;

pub const CONFIG_FILE: &str = "palette.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Quiet period before a keystroke burst becomes a lookup.
    pub debounce_ms: u64,
    /// Minimum trimmed query length before a lookup is dispatched.
    pub min_query_len: usize,
    /// Maximum results per category returned by the store.
    pub per_category_limit: usize,
    /// Delay between opening the palette and accepting typed input.
    pub focus_delay_ms: u64,
    /// Rows between the trigger's bottom edge and the popover.
    pub popover_offset: u16,
    /// Popover never gets narrower than this many columns.
    pub popover_min_width: u16,
    pub tick_ms: u64,
    /// How often the lookup worker probes the store for changes.
    pub watch_interval_ms: u64,
    pub identity: Option<String>,
    /// Command used to open external links; falls back to the platform opener.
    pub browser: Option<String>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            per_category_limit: 5,
            focus_delay_ms: 50,
            popover_offset: 1,
            popover_min_width: 48,
            tick_ms: 30,
            watch_interval_ms: 1_000,
            identity: None,
            browser: None,
        }
    }
}

impl PaletteConfig {
    /// Defaults, then `<data_dir>/palette.toml`, then the environment.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let mut cfg = Self::from_file(&data_dir.join(CONFIG_FILE))?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Read a TOML config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&body).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| dotenvy::var(key).ok());
    }

    /// Apply `FOLIO_*` overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("FOLIO_DEBOUNCE_MS")
            && let Ok(ms) = val.parse()
        {
            self.debounce_ms = ms;
        }

        if let Some(val) = lookup("FOLIO_MIN_QUERY_LEN")
            && let Ok(n) = val.parse()
        {
            self.min_query_len = n;
        }

        if let Some(val) = lookup("FOLIO_PER_CATEGORY_LIMIT")
            && let Ok(n) = val.parse()
        {
            self.per_category_limit = n;
        }

        if let Some(val) = lookup("FOLIO_FOCUS_DELAY_MS")
            && let Ok(ms) = val.parse()
        {
            self.focus_delay_ms = ms;
        }

        if let Some(val) = lookup("FOLIO_IDENTITY") {
            self.identity = Some(val);
        }

        if let Some(val) = lookup("FOLIO_BROWSER") {
            self.browser = Some(val);
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(10))
    }

    pub fn session_identity(&self) -> Option<SessionIdentity> {
        self.identity.clone().and_then(SessionIdentity::new)
    }
}

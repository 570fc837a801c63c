//! Process-level settings.

use std::env;

/// Environment variable naming the backend to bind to.
pub const BACKEND_ENV: &str = "OFGDB_BACKEND";
/// Environment variable enabling debug logging (`1`, `true`, `yes`).
pub const DEBUG_ENV: &str = "OFGDB_DEBUG";
pub const DEFAULT_BACKEND: &str = "memory";

/// How [`crate::Dispatch`] picks a backend name when it has none bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelector {
    /// Read the named environment variable on every attempt, falling back to
    /// [`DEFAULT_BACKEND`] when it is unset or blank.
    Env(String),
    Fixed(String),
}

impl BackendSelector {
    /// Lowercased, trimmed backend name.
    pub fn resolve(&self) -> String {
        let raw = match self {
            BackendSelector::Env(var) => env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            BackendSelector::Fixed(name) => name.clone(),
        };
        raw.trim().to_ascii_lowercase()
    }
}

impl Default for BackendSelector {
    fn default() -> Self {
        BackendSelector::Env(BACKEND_ENV.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendSelector,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend: BackendSelector::default(),
            debug: env::var(DEBUG_ENV).map_or(false, |v| parse_flag(&v)),
        }
    }

    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = BackendSelector::Fixed(name.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

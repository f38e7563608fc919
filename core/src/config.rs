//! Process settings and logging setup.
//!
//! Settings are read once at startup into a typed struct. Only binaries
//! call [`init_logging`]; the library itself just emits `tracing` events.

use tracing_subscriber::EnvFilter;

/// Environment variable enabling debug logging (`1`, `true`, `yes`, `on`).
pub const DEBUG_ENV: &str = "COMMAND_TREE_DEBUG";
/// Environment variable holding an explicit `EnvFilter` directive.
pub const LOG_ENV: &str = "COMMAND_TREE_LOG";

const DEFAULT_FILTER: &str = "warn";
const DEBUG_FILTER: &str = "command_tree_core=debug,info";

/// Typed process settings.
///
/// # Examples
///
/// ```
/// use command_tree_core::Settings;
///
/// let settings = Settings::from_lookup(|key| match key {
///     "COMMAND_TREE_DEBUG" => Some("1".to_string()),
///     _ => None,
/// });
/// assert!(settings.debug);
/// assert_eq!(settings.filter_directive(), "command_tree_core=debug,info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Raise the default log level to debug.
    pub debug: bool,
    /// Explicit filter directive; overrides `debug`.
    pub log_filter: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let debug = lookup(DEBUG_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let log_filter = lookup(LOG_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self { debug, log_filter }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The `EnvFilter` directive these settings select.
    pub fn filter_directive(&self) -> &str {
        match (&self.log_filter, self.debug) {
            (Some(filter), _) => filter.as_str(),
            (None, true) => DEBUG_FILTER,
            (None, false) => DEFAULT_FILTER,
        }
    }
}

/// Installs a stderr `fmt` subscriber for `settings`.
///
/// An invalid directive falls back to the default filter. Calling this twice
/// is harmless; the second subscriber is not installed.
pub fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_new(settings.filter_directive())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

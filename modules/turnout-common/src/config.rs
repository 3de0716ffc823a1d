use std::env;

/// Simulator configuration loaded from environment variables.
/// Everything has a sensible default; nothing is required.
#[derive(Debug, Clone)]
pub struct Config {
    /// Period of the recurring severity tick.
    pub tick_interval_ms: u64,
    /// Per-tick chance of emitting one cosmetic call-update event.
    pub call_update_probability: f64,
    /// Severity assigned to incidents created without one.
    pub default_severity: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5000,
            call_update_probability: 0.1,
            default_severity: 50,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    /// Panics with a clear message on unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval_ms: env::var("TICK_INTERVAL_MS")
                .map(|v| v.parse().expect("TICK_INTERVAL_MS must be a number"))
                .unwrap_or(defaults.tick_interval_ms),
            call_update_probability: env::var("CALL_UPDATE_PROBABILITY")
                .map(|v| v.parse().expect("CALL_UPDATE_PROBABILITY must be a number"))
                .unwrap_or(defaults.call_update_probability),
            default_severity: env::var("DEFAULT_SEVERITY")
                .map(|v| v.parse().expect("DEFAULT_SEVERITY must be a number"))
                .unwrap_or(defaults.default_severity),
        }
    }
}

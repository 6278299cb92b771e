//! Process-wide behaviour switches.

use std::sync::{PoisonError, RwLock};

/// Configuration for deferred values.
#[derive(Debug, Clone)]
pub struct PromiseConfig {
    /// Report a second settlement of a user-held seal as a fault instead of
    /// ignoring it. On by default in debug builds.
    pub strict_sealing: bool,

    /// Log at info level when a timeout fallback wins a race.
    pub log_timeouts: bool,
}

impl Default for PromiseConfig {
    fn default() -> Self {
        Self {
            strict_sealing: cfg!(debug_assertions),
            log_timeouts: true,
        }
    }
}

lazy_static::lazy_static! {
    static ref CONFIG: RwLock<PromiseConfig> = RwLock::new(PromiseConfig::default());
}

/// Install `config` for the whole process.
pub fn configure(config: PromiseConfig) {
    *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
}

/// The configuration currently in effect.
pub fn config() -> PromiseConfig {
    CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

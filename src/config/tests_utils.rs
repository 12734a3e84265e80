//! Shared test utilities for config module tests.

use std::sync::Mutex;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Every `MNEMOS_*` variable read by the environment layer.
pub const ENV_VARS: [&str; 10] = [
    "MNEMOS_DATABASE_PATH",
    "MNEMOS_EMBEDDING_PROVIDER",
    "MNEMOS_EMBEDDING_MODEL",
    "MNEMOS_EMBEDDING_BASE_URL",
    "MNEMOS_EMBEDDING_API_KEY",
    "MNEMOS_EMBEDDING_DIMENSIONS",
    "MNEMOS_MODEL_CACHE",
    "MNEMOS_REQUEST_TIMEOUT_SECS",
    "MNEMOS_SEARCH_LIMIT",
    "MNEMOS_MIN_SIMILARITY",
];

/// Clear every mnemos override so tests start from a known environment.
pub fn cleanup_env_vars() {
    for var in ENV_VARS {
        // SAFETY: callers hold ENV_MUTEX.
        unsafe { std::env::remove_var(var) };
    }
}

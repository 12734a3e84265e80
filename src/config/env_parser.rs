//! Environment variable parsing utilities for configuration.

use crate::errors::Error;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;

/// Read an environment variable, treating "unset" as `None`.
pub fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parse environment variable value or return error if empty/whitespace.
pub fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(value.trim().to_string())
}

/// Parse environment variable as a path, expanding tilde.
pub fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    let value = parse_env_string(name, value)?;
    Ok(paths::expand_tilde_path(&PathBuf::from(value)))
}

/// Parse environment variable as any `FromStr` value (numbers, providers).
pub fn parse_env_value<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = parse_env_string(name, value)?;
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

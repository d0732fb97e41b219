//! Credential Store
//!
//! This module handles loading and saving named Firebird connection profiles.
//! It is the credential provider behind the CLI: operations themselves only
//! ever see a resolved [`ConnectionParams`] bag.
//!
//! # Configuration Locations
//! - Local: `.fireflow/config.json` (team-shareable, per-project)
//! - Global: `~/.config/fireflow/connections.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Inline credentials in the job document (highest priority, handled by
//!    the caller)
//! 2. Local config file (`.fireflow/config.json`)
//! 3. Global config file (`~/.config/fireflow/connections.json`)
//!
//! Resolution that finds nothing fails fast with a no-credentials error.
//!
//! # Passwords
//! A profile may reference an environment variable via `password_env`
//! instead of storing the password in the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::driver::ConnectionParams;
use crate::error::{FireflowError, Result};

/// A stored connection profile
///
/// Wraps [`ConnectionParams`] with an optional environment-variable
/// reference for the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection parameters
    #[serde(flatten)]
    pub params: ConnectionParams,

    /// Environment variable name for the password (if not storing it directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    /// Resolve environment references and return ready-to-use parameters
    pub fn resolve(&self) -> Result<ConnectionParams> {
        let mut params = self.params.clone();

        if let Some(env_var) = &self.password_env {
            match std::env::var(env_var) {
                Ok(password) => params.password = Some(password),
                Err(_) => {
                    return Err(FireflowError::config_error(format!(
                        "Environment variable {env_var} not found for password"
                    )));
                }
            }
        }

        Ok(params)
    }
}

/// Connection registry (the on-disk config file format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionRegistry {
    /// Named connection profiles
    pub connections: HashMap<String, StoredConnection>,

    /// Name of the default profile (must exist in `connections`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ConnectionRegistry {
    /// Look up a profile by name, or the default profile when no name is given
    pub fn lookup(&self, name: Option<&str>) -> Option<&StoredConnection> {
        match name {
            Some(name) => self.connections.get(name),
            None => self.default.as_ref().and_then(|name| self.connections.get(name)),
        }
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.fireflow/config.json` (team-shareable)
    Local,
    /// Global config: `~/.config/fireflow/connections.json` (per-user)
    Global,
}

/// Get path to the local config file (`.fireflow/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        FireflowError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".fireflow").join("config.json"))
}

/// Get path to the global config file (`~/.config/fireflow/connections.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| FireflowError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("fireflow").join("connections.json"))
}

/// Load a connection registry from a config file
///
/// A missing file is an empty registry, not an error.
pub fn load_registry(path: &Path) -> Result<ConnectionRegistry> {
    if !path.exists() {
        return Ok(ConnectionRegistry::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| FireflowError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| FireflowError::config_error(format!("Invalid config file format: {e}")))
}

/// Save a connection registry to a config file, creating parent directories
pub fn save_registry(path: &Path, registry: &ConnectionRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            FireflowError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(registry)
        .map_err(|e| FireflowError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| FireflowError::config_error(format!("Could not write config file: {e}")))
}

/// Resolve a named (or default) profile against local then global registries
///
/// Fails fast with a no-credentials error when no source yields a profile.
pub fn resolve_connection(name: Option<&str>) -> Result<ConnectionParams> {
    let local = load_registry(&local_config_path()?)?;
    if let Some(stored) = local.lookup(name) {
        return stored.resolve();
    }

    let global = load_registry(&global_config_path()?)?;
    if let Some(stored) = global.lookup(name) {
        return stored.resolve();
    }

    Err(FireflowError::no_credentials(match name {
        Some(name) => format!("no connection profile named '{name}'"),
        None => "no default connection profile configured".to_string(),
    }))
}

/// Save one named profile into the chosen config file
pub fn save_connection(
    name: &str,
    connection: StoredConnection,
    location: ConfigLocation,
) -> Result<()> {
    let path = match location {
        ConfigLocation::Local => local_config_path()?,
        ConfigLocation::Global => global_config_path()?,
    };

    let mut registry = load_registry(&path)?;
    registry.connections.insert(name.to_string(), connection);
    if registry.default.is_none() {
        registry.default = Some(name.to_string());
    }

    save_registry(&path, &registry)
}

/// List profile names from both config files as (name, location) pairs
pub fn list_connections() -> Result<Vec<(String, ConfigLocation)>> {
    let mut names = Vec::new();

    let local = load_registry(&local_config_path()?)?;
    for name in local.connections.keys() {
        names.push((name.clone(), ConfigLocation::Local));
    }

    let global = load_registry(&global_config_path()?)?;
    for name in global.connections.keys() {
        names.push((name.clone(), ConfigLocation::Global));
    }

    names.sort();
    Ok(names)
}

//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DIGIREST_BASE_URL` is missing or a value is invalid, falls back to
//!    loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DIGIREST_BASE_URL`: API base URL (required)
//! - `DIGIREST_FORMAT`: Response format sent in `Accept`
//! - `DIGIREST_CONTENT_TYPE`: Request body content type
//! - `DIGIREST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `DIGIREST_IMMEDIATE_OUTPUT`: Stream responses to stdout (true/false)
//! - `DIGIREST_AUTH_URL`: OAuth token endpoint
//! - `DIGIREST_GRANT_TYPE`: `client_credentials`, `refresh_token` or
//!   `password`
//! - `DIGIREST_CLIENT_ID`, `DIGIREST_CLIENT_SECRET`
//! - `DIGIREST_REFRESH_TOKEN`
//! - `DIGIREST_USERNAME`, `DIGIREST_PASSWORD`
//! - `DIGIREST_ACCESS_TOKEN`: Pre-set access token
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./digirest.json` or `./digirest.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../digirest.{json,toml}`, `../config.{json,toml}` (parent directory)
//! 4. `../../digirest.{json,toml}`, `../../config.{json,toml}` (grandparent)

use std::path::{Path, PathBuf};

use digirest_domain::{ClientConfig, Credential, DigirestError, GrantType, Result};

const FILE_STEMS: [&str; 2] = ["digirest", "config"];
const FILE_EXTENSIONS: [&str; 2] = ["json", "toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DigirestError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value is outside its allow-list
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DigirestError::Config` if `DIGIREST_BASE_URL` is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let base_url = env_var("DIGIREST_BASE_URL")?;
    let mut config = ClientConfig { base_url: Some(base_url), ..ClientConfig::default() };

    if let Some(format) = env_opt("DIGIREST_FORMAT") {
        config.format = format.parse()?;
    }
    if let Some(content_type) = env_opt("DIGIREST_CONTENT_TYPE") {
        config.content_type = content_type.parse()?;
    }
    if let Some(timeout) = env_opt("DIGIREST_TIMEOUT_SECS") {
        config.timeout_secs = Some(timeout.parse::<u64>().map_err(|e| {
            DigirestError::Config(format!("Invalid DIGIREST_TIMEOUT_SECS: {e}"))
        })?);
    }
    config.immediate_output = env_bool("DIGIREST_IMMEDIATE_OUTPUT", false);
    config.credential = credential_from_env()?;

    Ok(config)
}

/// Credential block from `DIGIREST_*` variables, `None` when none are set
fn credential_from_env() -> Result<Option<Credential>> {
    let credential = Credential {
        auth_server_url: env_opt("DIGIREST_AUTH_URL"),
        grant_type: env_opt("DIGIREST_GRANT_TYPE")
            .map(|raw| raw.parse::<GrantType>())
            .transpose()?
            .unwrap_or_default(),
        client_id: env_opt("DIGIREST_CLIENT_ID"),
        client_secret: env_opt("DIGIREST_CLIENT_SECRET"),
        username: env_opt("DIGIREST_USERNAME"),
        password: env_opt("DIGIREST_PASSWORD"),
        refresh_token: env_opt("DIGIREST_REFRESH_TOKEN"),
        access_token: env_opt("DIGIREST_ACCESS_TOKEN"),
    };

    if credential == Credential::default() {
        return Ok(None);
    }
    Ok(Some(credential))
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DigirestError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DigirestError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DigirestError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DigirestError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, by file extension
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DigirestError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DigirestError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DigirestError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, then its parent and grandparent.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    candidate_paths(&cwd).into_iter().find(|path| path.exists())
}

fn candidate_paths(root: &Path) -> Vec<PathBuf> {
    [root.to_path_buf(), root.join(".."), root.join("../..")]
        .iter()
        .flat_map(|dir| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
        })
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        DigirestError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional environment variable; empty values count as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

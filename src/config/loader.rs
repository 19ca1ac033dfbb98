//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{EdiConfig, PostgreSQLConfig, StoreBackend};
use super::secret::secret_string;
use crate::domain::errors::EdiError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into EdiConfig
/// 4. Applies environment variable overrides (SRI_EDI_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced variable is not
/// set, TOML parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use sri_edi::config::loader::load_config;
///
/// let config = load_config("sri-edi.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EdiConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EdiError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EdiError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: EdiConfig = toml::from_str(&contents)
        .map_err(|e| EdiError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        EdiError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
pub(crate) fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| EdiError::Configuration(format!("Invalid substitution pattern: {}", e)))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{}}}", var_name), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|name| name == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(EdiError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the SRI_EDI_* prefix
///
/// Environment variables follow the pattern: SRI_EDI_<SECTION>_<KEY>,
/// for example SRI_EDI_APPLICATION_DRY_RUN or SRI_EDI_SIGNER_COMMAND.
fn apply_env_overrides(config: &mut EdiConfig) -> Result<()> {
    if let Ok(val) = std::env::var("SRI_EDI_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("SRI_EDI_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("SRI_EDI_STORE_BACKEND") {
        config.store.backend = match val.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "postgresql" => StoreBackend::PostgreSQL,
            other => {
                return Err(EdiError::Configuration(format!(
                    "Invalid SRI_EDI_STORE_BACKEND '{}'. Must be one of: memory, postgresql",
                    other
                )))
            }
        };
    }

    // A connection string alone is enough to enable the PostgreSQL section
    if let Ok(val) = std::env::var("SRI_EDI_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                let section: PostgreSQLConfig = toml::from_str("connection_string = \"\"")?;
                config.postgresql = Some(PostgreSQLConfig {
                    connection_string: secret_string(val),
                    ..section
                });
            }
        }
    }

    if let Ok(val) = std::env::var("SRI_EDI_SIGNER_COMMAND") {
        config.signer.command = Some(val);
    }
    if let Ok(val) = std::env::var("SRI_EDI_SIGNER_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.signer.timeout_seconds = timeout;
        }
    }

    if let Ok(val) = std::env::var("SRI_EDI_SOURCES_DIRECTORY") {
        config.sources.directory = val;
    }

    if let Ok(val) = std::env::var("SRI_EDI_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SRI_EDI_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("SRI_EDI_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, IngestConfig};
use super::secret::secret_string;
use crate::domain::errors::IngestError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Prefix of every override variable
pub const ENV_PREFIX: &str = "FHIR_INGEST_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`IngestConfig`]
/// 4. Applies environment variable overrides (`FHIR_INGEST_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`IngestError::Configuration`] if the file cannot be read, a
/// referenced variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use fhir_ingest::config::loader::load_config;
///
/// let config = load_config("fhir-ingest.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<IngestConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IngestError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        IngestError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: IngestConfig = toml::from_str(&contents)
        .map_err(|e| IngestError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        IngestError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(IngestError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

/// Applies environment variable overrides using the `FHIR_INGEST_*` prefix
///
/// Variables follow the pattern `FHIR_INGEST_<SECTION>_<KEY>`, for example
/// `FHIR_INGEST_POSTGRESQL_CONNECTION_STRING`.
fn apply_env_overrides(config: &mut IngestConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env("APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Some(val) = env("DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(IngestError::Configuration(format!(
                    "Invalid {ENV_PREFIX}DATABASE_TARGET '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }

    // PostgreSQL overrides; the connection string alone is enough to create the section
    if let Some(val) = env("POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql = Some(toml::from_str(&format!(
                    "connection_string = {}",
                    toml::Value::String(val)
                ))?)
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env("POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg.max_connections = max;
            }
        }
        if let Some(val) = env("POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            if let Ok(timeout) = val.parse() {
                pg.statement_timeout_seconds = timeout;
            }
        }
        if let Some(val) = env("POSTGRESQL_RUN_MIGRATIONS") {
            pg.run_migrations = val.parse().unwrap_or(true);
        }
    }

    // Ingest overrides
    if let Some(val) = env("INGEST_NATIONAL_ID_SYSTEM_MARKER") {
        config.ingest.national_id_system_marker = val;
    }

    // Logging overrides
    if let Some(val) = env("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Some(val) = env("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

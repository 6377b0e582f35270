//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CensusConfig;
use crate::domain::errors::CensusError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`CensusConfig`]
/// 4. Applies environment variable overrides (`CENSUS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsing fails, a referenced
/// environment variable is unset, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<CensusConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CensusError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CensusError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: CensusConfig = toml::from_str(&contents)
        .map_err(|e| CensusError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        CensusError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static pattern");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CensusError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `CENSUS_*` prefix
///
/// Variables follow the pattern `CENSUS_<SECTION>_<KEY>`, e.g.
/// `CENSUS_STORAGE_TIMEOUT_MS` or `CENSUS_POSTGRES_HOST`.
fn apply_env_overrides(config: &mut CensusConfig) {
    use crate::config::schema::StorageBackend;
    use secrecy::SecretString;

    if let Ok(val) = std::env::var("CENSUS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("CENSUS_STORAGE_BACKEND") {
        match val.to_lowercase().as_str() {
            "memory" => config.storage.backend = StorageBackend::Memory,
            "postgresql" => config.storage.backend = StorageBackend::Postgresql,
            other => tracing::warn!(value = other, "Ignoring unknown CENSUS_STORAGE_BACKEND"),
        }
    }
    if let Ok(val) = std::env::var("CENSUS_STORAGE_TIMEOUT_MS") {
        if let Ok(ms) = val.parse() {
            config.storage.timeout_ms = ms;
        }
    }
    if let Ok(val) = std::env::var("CENSUS_STORAGE_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.storage.max_attempts = attempts;
        }
    }

    if let Some(ref mut pg) = config.storage.postgresql {
        if let Ok(val) = std::env::var("CENSUS_POSTGRES_HOST") {
            pg.host = val;
        }
        if let Ok(val) = std::env::var("CENSUS_POSTGRES_PORT") {
            if let Ok(port) = val.parse() {
                pg.port = port;
            }
        }
        if let Ok(val) = std::env::var("CENSUS_POSTGRES_DBNAME") {
            pg.dbname = val;
        }
        if let Ok(val) = std::env::var("CENSUS_POSTGRES_USER") {
            pg.user = val;
        }
        if let Ok(val) = std::env::var("CENSUS_POSTGRES_PASSWORD") {
            pg.password = SecretString::new(val);
        }
    }

    if let Ok(val) = std::env::var("CENSUS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CENSUS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CENSUS_TEST_VAR", "test_value");
        let input = "password = \"${CENSUS_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("CENSUS_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CENSUS_MISSING_VAR");
        let input = "password = \"${CENSUS_MISSING_VAR}\"";
        assert!(substitute_env_vars(input).is_err());
    }

    #[test]
    fn test_substitution_skips_comments() {
        std::env::remove_var("CENSUS_COMMENTED_VAR");
        let input = "# password = \"${CENSUS_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
name = "census"
log_level = "debug"

[storage]
backend = "memory"
timeout_ms = 2500
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.storage.timeout_ms, 2500);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"storage = nonsense =").unwrap();
        temp_file.flush().unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }
}

//! Configuration loading and validation.
//!
//! Flow: locate file → read → substitute `${VAR}` references → parse YAML →
//! validate.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use super::defaults::SCHEMA_VERSION;
use super::error::ConfigError;
use super::schema::Config;
use crate::endpoint::GateEndpoint;

/// Configuration file search paths (in priority order).
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("CMDGATE_CONFIG") {
        paths.push(PathBuf::from(path));
    }

    // Priority 3: System default
    paths.push(PathBuf::from("/etc/cmdgate/config.yaml"));

    // Priority 4: Local default
    paths.push(PathBuf::from("./cmdgate.yaml"));

    paths
}

/// Find the first existing config file from the search paths.
pub fn find_config_file(explicit_path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    // Priority 1: Explicit path (CLI flag)
    if let Some(path) = explicit_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::ConfigFileNotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    let paths = default_config_paths();
    for path in &paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    Err(ConfigError::ConfigFileNotFound { searched: paths })
}

/// Load configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;

    if contents.trim().is_empty() {
        return Err(ConfigError::EmptyConfigFile);
    }

    let contents = substitute_env_vars(&contents)?;
    let config: Config = serde_saphyr::from_str(&contents)?;

    debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load and validate configuration.
pub fn load_and_validate(path: &Path) -> Result<Config, ConfigError> {
    let config = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Environment Variable Substitution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// SAFETY: .expect() on LazyLock with a compile-time literal regex pattern.
// The pattern is known-valid and tested by test_env_var_pattern_compiles().
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("BUG: ENV_VAR_PATTERN regex is invalid")
});

/// Substitute environment variables in a string.
///
/// # Syntax
/// - `${VAR}` - Required, fail if not set
/// - `${VAR:-default}` - Optional with default
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;

    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            },
        }
    });

    if let Some(var) = missing {
        return Err(ConfigError::MissingEnvVar {
            var,
            field: "configuration".to_string(),
        });
    }

    Ok(result.into_owned())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Validate a parsed configuration.
///
/// Checks, in order: schema version, endpoint, client limits, field names.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.schema != SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedSchemaVersion {
            version: config.schema,
        });
    }

    config.gate.endpoint.parse::<GateEndpoint>()?;
    config.gate.client_config().validate()?;
    config.fields.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const MINIMAL_CONFIG: &str = r#"
schema: 1
gate:
  endpoint: gate.example.com:8080/authorize
"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Verify the LazyLock regex compiles successfully.
    #[test]
    fn test_env_var_pattern_compiles() {
        let _ = &*ENV_VAR_PATTERN;
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(MINIMAL_CONFIG);
        let config = load_and_validate(file.path()).unwrap();
        assert_eq!(config.schema, 1);
        assert_eq!(config.gate.endpoint, "gate.example.com:8080/authorize");
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = write_config("  \n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::EmptyConfigFile)
        ));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let file = write_config("schema: 2\ngate:\n  endpoint: gate\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(ConfigError::UnsupportedSchemaVersion { version: 2 })
        ));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let file = write_config("schema: 1\ngate:\n  endpoint: \"  \"\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(ConfigError::EmptyEndpoint)
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_config("schema: 1\ngate:\n  endpoint: gate\n  timeout: 0s\n");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(ConfigError::ZeroTimeout { field: "timeout" })
        ));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let yaml = "schema: 1\ngate:\n  endpoint: gate\nfields:\n  response: CCSDS_FC\n";
        let file = write_config(yaml);
        assert!(matches!(
            load_and_validate(file.path()),
            Err(ConfigError::DuplicateFieldName { .. })
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        let file = write_config("schema: [1\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_explicit_path_not_found() {
        let result = find_config_file(Some(Path::new("/nonexistent/cmdgate.yaml")));
        match result {
            Err(ConfigError::ConfigFileNotFound { searched }) => {
                assert_eq!(searched, vec![PathBuf::from("/nonexistent/cmdgate.yaml")]);
            }
            other => panic!("Expected ConfigFileNotFound, got: {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        let file = write_config(MINIMAL_CONFIG);
        let original = std::env::var("CMDGATE_CONFIG").ok();
        // SAFETY: Test runs serially via #[serial], env var mutation is isolated
        unsafe {
            std::env::set_var("CMDGATE_CONFIG", file.path());
        }

        let found = find_config_file(None);

        // SAFETY: Test runs serially via #[serial], env var mutation is isolated
        unsafe {
            match original {
                Some(v) => std::env::set_var("CMDGATE_CONFIG", v),
                None => std::env::remove_var("CMDGATE_CONFIG"),
            }
        }
        assert_eq!(found.unwrap(), file.path());
    }

    #[test]
    #[serial]
    fn test_substitute_env_vars() {
        // SAFETY: Test runs serially via #[serial], env var mutation is isolated
        unsafe {
            std::env::set_var("CMDGATE_TEST_HOST", "gate.internal");
            std::env::remove_var("CMDGATE_TEST_UNSET");
        }

        let out = substitute_env_vars("endpoint: ${CMDGATE_TEST_HOST}:${CMDGATE_TEST_UNSET:-9000}")
            .unwrap();
        assert_eq!(out, "endpoint: gate.internal:9000");

        let err = substitute_env_vars("identity: ${CMDGATE_TEST_UNSET}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar { ref var, .. } if var == "CMDGATE_TEST_UNSET"));

        // SAFETY: Test runs serially via #[serial], env var mutation is isolated
        unsafe {
            std::env::remove_var("CMDGATE_TEST_HOST");
        }
    }
}

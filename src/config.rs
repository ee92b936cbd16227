use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref ALIAS_PREFIX_PATTERN: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,7}$").expect("alias prefix pattern is valid");
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Lowering configuration with validation
#[derive(Clone, Debug, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Prefix of generated alias bases (`j` gives `j1`, `j2`, ...)
    #[validate(custom(function = "validate_alias_prefix"))]
    pub alias_prefix: String,

    /// Join every backing table of an inheritance-mapped entity
    #[validate(custom(function = "validate_subclass_expansion"))]
    pub expand_all_subclass_tables: bool,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            alias_prefix: "j".to_string(),
            expand_all_subclass_tables: true,
        }
    }
}

fn validate_alias_prefix(prefix: &str) -> Result<(), ValidationError> {
    if ALIAS_PREFIX_PATTERN.is_match(prefix) {
        Ok(())
    } else {
        let mut error = ValidationError::new("alias_prefix");
        error.message = Some(
            "Alias prefix must be 1-8 ASCII alphanumerics starting with a letter".into(),
        );
        Err(error)
    }
}

fn validate_subclass_expansion(expand: &bool) -> Result<(), ValidationError> {
    if *expand {
        Ok(())
    } else {
        let mut error = ValidationError::new("expand_all_subclass_tables");
        error.message = Some("Need-based subclass table inclusion is not supported".into());
        Err(error)
    }
}

impl LoweringConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            alias_prefix: env::var("SQM_ALIAS_PREFIX").unwrap_or_else(|_| "j".to_string()),
            expand_all_subclass_tables: parse_env_var("SQM_EXPAND_ALL_SUBCLASS_TABLES", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            alias_prefix: cli.alias_prefix.unwrap_or(defaults.alias_prefix),
            expand_all_subclass_tables: cli
                .expand_all_subclass_tables
                .unwrap_or(defaults.expand_all_subclass_tables),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of this configuration (CLI wins)
    pub fn merge_cli(&mut self, cli: &CliConfig) -> Result<(), ConfigError> {
        if let Some(prefix) = &cli.alias_prefix {
            self.alias_prefix = prefix.clone();
        }
        if let Some(expand) = cli.expand_all_subclass_tables {
            self.expand_all_subclass_tables = expand;
        }
        self.validate()?;
        Ok(())
    }

    /// Resolve the effective configuration: defaults, then environment,
    /// then the fields the optional YAML file sets, then CLI overrides.
    pub fn load(yaml_path: Option<&std::path::Path>, cli: &CliConfig) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        if let Some(path) = yaml_path {
            config.merge_cli(&CliConfig::from_yaml_file(path)?)?;
        }
        config.merge_cli(cli)?;
        log::debug!("Effective lowering configuration: {:?}", config);
        Ok(config)
    }
}

/// Partial configuration: CLI arguments, or the fields a YAML file sets.
///
/// Unset fields leave the configuration they are merged into unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub alias_prefix: Option<String>,
    pub expand_all_subclass_tables: Option<bool>,
}

impl CliConfig {
    /// Read only the fields present in a YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

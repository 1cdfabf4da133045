#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline configuration.
//!
//! One TOML document covers the data files, the partitioner, the projector,
//! and the HTTP server. A copy of the defaults is baked into the binary via
//! [`include_str!`], so running without a config file behaves exactly like
//! running with `default.toml`.
//!
//! The config file is chosen by, in order: an explicit path (the CLI's
//! `--config` flag), the `CRIME_ORACLE_CONFIG` environment variable, then the
//! embedded default. `BIND_ADDR` and `PORT` override the `[server]` section
//! afterwards.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crime_oracle_hotspot::HotspotError;
use crime_oracle_hotspot_models::PartitionConfig;
use crime_oracle_projection::ProjectionError;
use crime_oracle_projection_models::ProjectionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The default configuration document.
pub const DEFAULT_CONFIG: &str = include_str!("../default.toml");

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CRIME_ORACLE_CONFIG";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the schema.
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[partition]` section is inconsistent.
    #[error("Invalid [partition] section: {0}")]
    Partition(#[from] HotspotError),

    /// The `[projection]` section is inconsistent.
    #[error("Invalid [projection] section: {0}")]
    Projection(#[from] ProjectionError),

    /// Any other invalid value.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Locations of the input tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DataConfig {
    /// Incident CSV.
    pub incidents: PathBuf,
    /// Police station CSV. Stations are skipped when unset.
    pub stations: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            incidents: PathBuf::from("data/incidents.csv"),
            stations: Some(PathBuf::from("data/police.csv")),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Applies `BIND_ADDR` / `PORT` style overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `port` is not a valid port number.
    pub fn apply_overrides(
        &mut self,
        bind_addr: Option<String>,
        port: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind_addr) = bind_addr.filter(|s| !s.is_empty()) {
            self.bind_addr = bind_addr;
        }
        if let Some(port) = port.filter(|s| !s.is_empty()) {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("PORT '{port}': {e}")))?;
        }
        Ok(())
    }
}

/// The whole pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OracleConfig {
    /// Input tables.
    pub data: DataConfig,
    /// Hotspot partitioner settings.
    pub partition: PartitionConfig,
    /// Risk projector settings.
    pub projection: ProjectionConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl OracleConfig {
    /// Checks every section for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crime_oracle_hotspot::validate_config(&self.partition)?;
        crime_oracle_projection::validate_config(&self.projection)?;

        if let crime_oracle_projection_models::BaselineSource::Fixed(counts) =
            &self.projection.baseline
            && counts.len() != self.partition.clusters
        {
            return Err(ConfigError::Invalid(format!(
                "projection.baseline has {} counts but partition.clusters is {}",
                counts.len(),
                self.partition.clusters
            )));
        }

        Ok(())
    }
}

/// Parses and validates a config document.
///
/// # Errors
///
/// Returns [`ConfigError`] if the document is malformed or inconsistent.
pub fn parse(document: &str) -> Result<OracleConfig, ConfigError> {
    let config: OracleConfig = toml::from_str(document)?;
    config.validate()?;
    Ok(config)
}

/// Picks the config file: `explicit`, else the value of
/// [`CONFIG_ENV_VAR`], else none (embedded default).
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, from_env: Option<OsString>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| from_env.filter(|s| !s.is_empty()).map(PathBuf::from))
}

/// Loads configuration for a process, then applies `BIND_ADDR` and `PORT`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the chosen file cannot be read, parsed, or
/// validated.
pub fn load(explicit: Option<&Path>) -> Result<OracleConfig, ConfigError> {
    let mut config = match resolve_path(explicit, std::env::var_os(CONFIG_ENV_VAR)) {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            let document = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            parse(&document)?
        }
        None => {
            log::debug!("Using embedded default config");
            parse(DEFAULT_CONFIG)?
        }
    };

    config.server.apply_overrides(
        std::env::var("BIND_ADDR").ok(),
        std::env::var("PORT").ok(),
    )?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_oracle_hotspot_models::NameOrder;
    use crime_oracle_projection_models::BaselineSource;

    #[test]
    fn embedded_default_matches_code_defaults() {
        let config = parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, OracleConfig::default());
    }

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(parse("").unwrap(), OracleConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse(
            r#"
            [partition]
            clusters = 3
            names = ["North", "Centre", "South"]
            name_order = "cluster_index"

            [projection]
            baseline = { fixed = [5, 6, 7] }
            "#,
        )
        .unwrap();

        assert_eq!(config.partition.clusters, 3);
        assert_eq!(config.partition.seed, 42);
        assert_eq!(config.partition.name_order, NameOrder::ClusterIndex);
        assert_eq!(config.projection.baseline, BaselineSource::Fixed(vec![5, 6, 7]));
        assert_eq!(config.projection.rules.len(), 4);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn explicit_rules_replace_the_default_table() {
        let config = parse(
            r#"
            [[projection.rules]]
            name = "festival"
            factor = 2.0
            when = { dates = ["2025-12-24", "2025-12-31"] }
            "#,
        )
        .unwrap();

        assert_eq!(config.projection.rules.len(), 1);
        assert_eq!(config.projection.rules[0].name, "festival");
    }

    #[test]
    fn malformed_rule_is_a_parse_error() {
        let err = parse(
            r#"
            [[projection.rules]]
            name = "broken"
            factor = 2.0
            when = { fortnights = [1] }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn name_count_mismatch_is_rejected() {
        let err = parse("[partition]\nclusters = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Partition(_)), "{err}");
    }

    #[test]
    fn unordered_projection_tiers_are_rejected() {
        let err = parse("[projection.tiers]\nmedium = 50\nhigh = 30\ncritical = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Projection(_)), "{err}");
    }

    #[test]
    fn fixed_baseline_must_cover_every_cluster() {
        let err = parse("[projection]\nbaseline = { fixed = [1, 2] }\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn explicit_path_beats_environment() {
        let explicit = Path::new("explicit.toml");
        assert_eq!(
            resolve_path(Some(explicit), Some(OsString::from("env.toml"))),
            Some(PathBuf::from("explicit.toml"))
        );
        assert_eq!(
            resolve_path(None, Some(OsString::from("env.toml"))),
            Some(PathBuf::from("env.toml"))
        );
        assert_eq!(resolve_path(None, Some(OsString::new())), None);
        assert_eq!(resolve_path(None, None), None);
    }

    #[test]
    fn server_overrides() {
        let mut server = ServerConfig::default();
        server
            .apply_overrides(Some("0.0.0.0".to_string()), Some("9000".to_string()))
            .unwrap();
        assert_eq!(server.bind_addr, "0.0.0.0");
        assert_eq!(server.port, 9000);

        let err = server
            .apply_overrides(None, Some("http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(server.port, 9000);
    }
}

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::pipeline::PipelineOptions;
use crate::transform::controller::DEFAULT_CONTROLLER_NAME;
use crate::transform::{FilterOptions, NamespacePolicy};

/// Top-level project configuration loaded from `.lbgen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LbgenConfig {
    pub input: String,
    /// Where `lbgen transform` writes the document; stdout when unset.
    pub output: Option<String>,
    /// Namespace prefix for schema/path rewriting and controller ids.
    pub namespace: Option<String>,
    pub filter: FilterOptions,
    pub naming: NamingConfig,
    pub cache: CacheConfig,
}

impl Default for LbgenConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: None,
            namespace: None,
            filter: FilterOptions::default(),
            naming: NamingConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl LbgenConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        let mut policy = NamespacePolicy::default();
        if let Some(ref reserved) = self.naming.reserved_prefixes {
            policy.reserved_prefixes = reserved.clone();
        }
        PipelineOptions {
            namespace: self.namespace.clone(),
            policy,
            filter: self.filter.clone(),
            default_controller: self.naming.default_controller.clone(),
        }
    }
}

/// Naming policy overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Controller name for paths before the first one that declares a name.
    pub default_controller: String,
    /// Replaces the built-in list of framework-reserved schema prefixes.
    pub reserved_prefixes: Option<Vec<String>>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            default_controller: DEFAULT_CONTROLLER_NAME.to_string(),
            reserved_prefixes: None,
        }
    }
}

/// Settings for `lbgen cache`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds passed to `@cache(...)`.
    pub ttl: u64,
    /// Key-value datasource backing the cache repository.
    pub datasource: Option<String>,
    /// LoopBack project root.
    pub project: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: 60,
            datasource: None,
            project: ".".to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".lbgen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<LbgenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: LbgenConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# lbgen configuration
input: openapi.yaml
# output: openapi.transformed.yaml   # stdout when unset

# Prefix schemas and paths so several APIs can share one LoopBack project.
# namespace: Api

filter:
  readonly: false       # drop post/put/patch/delete everywhere
  # Use either exclude or include, not both.
  # exclude:
  #   - pattern: "^/internal"
  #     verbs: [get, post]
  # include:
  #   - pattern: "^/widgets"
  #     verbs: [get]

naming:
  default_controller: OpenApi
  # reserved_prefixes: [loopback]

cache:
  ttl: 60
  # datasource: redis
  project: .
"#
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("namespace prefix must not be empty")]
    EmptyPrefix,

    #[error("schemas '{first}' and '{second}' would both be renamed to '{name}'")]
    SchemaCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("paths '{first}' and '{second}' would both be rewritten to '{template}'")]
    PathCollision {
        template: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("include and exclude rules cannot be combined")]
    ConflictingRules,

    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed filter rule '{0}', expected <pattern>=<verb>[,<verb>...]")]
    MalformedRule(String),

    #[error("unknown HTTP verb: {0}")]
    UnknownVerb(String),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("document has no paths")]
    NoPaths,

    #[error("path '{path}' has no operations")]
    NoOperations { path: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("namespace rewrite failed: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("filter failed: {0}")]
    Filter(#[from] FilterError),

    #[error("controller resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

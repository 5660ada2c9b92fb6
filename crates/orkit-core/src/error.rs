use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrkitError {
    #[error("manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("invalid manifest {path}: {source}")]
    ManifestSyntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid hooks file {path}: {source}")]
    HooksSyntax {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("version {0} not found in changelog")]
    VersionNotFound(String),

    #[error("no release header found in changelog")]
    NoRelease,

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrkitError>;

use thiserror::Error;

use crate::model::RecordId;

/// Failures of calls against the REST server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Network failure or any non-success status.
    #[error("{operation} failed: {detail}")]
    Connectivity {
        operation: &'static str,
        detail: String,
    },

    /// The addressed record no longer exists on the server.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: RecordId },
}

impl ApiError {
    pub fn connectivity(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Connectivity {
            operation,
            detail: detail.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: RecordId) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API url '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

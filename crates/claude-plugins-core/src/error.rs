use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Plugin not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid plugin: {message}")]
    InvalidPlugin { message: String },

    #[error("Failed to fetch {source_desc}: {message}")]
    FetchFailed {
        source_desc: String,
        message: String,
    },

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {message}")]
    StorageParse { path: PathBuf, message: String },

    #[error("Failed to parse config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Config key not found: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid config value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;

impl PluginError {
    /// Taxonomy label shown next to the message on the command line.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::InvalidPlugin { .. } => "InvalidPlugin",
            Self::FetchFailed { .. } => "FetchFailed",
            Self::Storage { .. } | Self::StorageParse { .. } | Self::Io(_) => "StorageError",
            Self::Config { .. } | Self::ConfigKeyNotFound { .. } | Self::ConfigValue { .. } => {
                "ConfigError"
            }
            Self::HomeNotFound => "StorageError",
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidPlugin {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    pub(crate) fn fetch(source_desc: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            source_desc: source_desc.into(),
            message: message.into(),
        }
    }
}

/// Attach a path to `std::io::Result` failures as a storage error.
pub(crate) trait IoContext<T> {
    fn at(self, path: &std::path::Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| PluginError::storage(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_follow_taxonomy() {
        assert_eq!(PluginError::not_found("x").kind(), "NotFound");
        assert_eq!(PluginError::invalid("bad").kind(), "InvalidPlugin");
        assert_eq!(PluginError::fetch("repo", "boom").kind(), "FetchFailed");
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(PluginError::storage("/tmp/x", io).kind(), "StorageError");
    }

    #[test]
    fn not_found_message_names_identifier() {
        let err = PluginError::not_found("nonexistent-plugin");
        assert_eq!(err.to_string(), "Plugin not found: nonexistent-plugin");
    }
}

use thiserror::Error;
use crate::error::ErrorKind;
use crate::reference::ReferenceError;

/// Errors raised by plugin lookup and execution
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),
    /// A required param is missing or has the wrong shape
    #[error("{plugin}: invalid param '{param}': {message}")]
    Param {
        plugin: String,
        param: String,
        message: String,
    },
    /// The rows do not fit the plugin (missing column, non-numeric value)
    #[error("{plugin}: {message}")]
    Data { plugin: String, message: String },
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

impl PluginError {
    pub fn param(plugin: &str, param: &str, message: impl Into<String>) -> Self {
        PluginError::Param {
            plugin: plugin.to_string(),
            param: param.to_string(),
            message: message.into(),
        }
    }

    pub fn data(plugin: &str, message: impl Into<String>) -> Self {
        PluginError::Data {
            plugin: plugin.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PluginError::UnknownPlugin(_) => ErrorKind::UnknownPlugin,
            PluginError::Param { .. } => ErrorKind::PluginParamError,
            PluginError::Data { .. } => ErrorKind::PluginDataError,
            PluginError::Reference(e) => e.kind(),
        }
    }

    /// Prefix param/data messages with where they happened (e.g. a chain step)
    pub fn with_context(self, context: &str) -> Self {
        match self {
            PluginError::Param { plugin, param, message } => PluginError::Param {
                plugin,
                param,
                message: format!("{}: {}", context, message),
            },
            PluginError::Data { plugin, message } => PluginError::Data {
                plugin,
                message: format!("{}: {}", context, message),
            },
            other => other,
        }
    }
}

use thiserror::Error;

/// Errors raised while persisting outputs
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// Two group ids would share one file name
    #[error("Ids '{first}' and '{second}' of dimension '{dimension}' map to the same file name")]
    NameCollision {
        dimension: String,
        first: String,
        second: String,
    },
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error taxonomy for a sync run.
//!
//! Every variant except `Config` (when raised by the publisher) and `Publish`
//! aborts the run. Extra-server problems never reach this type: they degrade
//! to an empty list with a warning.

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("panel login failed: {0}")]
    Auth(String),

    #[error("inbound {id} not found on panel")]
    NotFound { id: i64 },

    #[error("panel API error: {0}")]
    Api(String),

    #[error("failed to parse inbound {field}: {reason}")]
    Parse { field: &'static str, reason: String },

    #[error("template error: {0}")]
    Render(String),

    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("gist upload failed: {0}")]
    Publish(String),
}

impl From<minijinja::Error> for SyncError {
    fn from(e: minijinja::Error) -> Self {
        Self::Render(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("view is not open")]
    NotOpen,

    #[error("view is already open")]
    AlreadyOpen,

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("binding serialization failed: {0}")]
    Bind(#[from] serde_json::Error),
}

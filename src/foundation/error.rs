/// Convenience result type used across inkboard.
pub type InkResult<T> = Result<T, InkError>;

/// Top-level error taxonomy used by the renderers and the publisher.
#[derive(thiserror::Error, Debug)]
pub enum InkError {
    /// Nothing to render: no tracks, no configured data source.
    #[error("no content available: {0}")]
    NoContentAvailable(String),

    /// External data source unreachable or returned malformed data.
    #[error("data fetch error: {0}")]
    DataFetch(String),

    /// Composition failure while producing a raster (asset decode, layout, size contract).
    #[error("render error: {0}")]
    Render(String),

    /// Staging write or atomic swap of the catalog failed.
    #[error("publish error: {0}")]
    Publish(String),

    /// Invalid configuration or user-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InkError {
    /// Build a [`InkError::NoContentAvailable`] value.
    pub fn no_content(msg: impl Into<String>) -> Self {
        Self::NoContentAvailable(msg.into())
    }

    /// Build a [`InkError::DataFetch`] value.
    pub fn data_fetch(msg: impl Into<String>) -> Self {
        Self::DataFetch(msg.into())
    }

    /// Build a [`InkError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`InkError::Publish`] value.
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Build a [`InkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an IO failure that happened while writing or swapping the catalog.
    pub(crate) fn publish_io(what: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Publish(format!("{what}: {err}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

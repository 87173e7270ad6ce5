use thiserror::Error;

/// Failures surfaced by an alert renderer implementation.
///
/// Render failures are recoverable at the dispatch layer: the caller gets
/// empty HTML and the error is logged, never bubbled to the requester.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

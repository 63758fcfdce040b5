//! Error types. Application code returns `Result<T>`; the library boundary
//! uses the typed enums below so callers can count and report failures.

use thiserror::Error;

/// Tiny alias so we can return `Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Why a single raw backend record could not be turned into a view-model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    #[error("record is null or missing")]
    NullRecord,

    #[error("record is not an object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` is not a date: {value}")]
    InvalidDate { field: &'static str, value: String },
}

/// Transport-level failures talking to the GraphQL backend.
///
/// Business-rule failures of a mutation are *not* errors; they come back in
/// the `error` field of [`crate::client::MutationOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("response carried no data")]
    EmptyResponse,

    #[error("unknown loader `{0}`")]
    UnknownLoader(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

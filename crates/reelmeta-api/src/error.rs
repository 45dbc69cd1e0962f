//! Error taxonomy shared by the transport, coercion and pagination layers.

use thiserror::Error;

/// Errors raised by the TMDB client.
///
/// Remote failures are categorized by the transport and propagate
/// unchanged through entities and pagination controllers.
#[derive(Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum TmdbError {
    /// A caller-supplied argument violates a documented constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced resource does not exist, a search had no matches,
    /// or a paged view has no further page.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation needs a session or write-scoped token.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// The resource is private to its owner.
    #[error("private resource: {0}")]
    PrivateResource(String),

    /// The configured credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response from TMDB.
    #[error("TMDB API error: {0}")]
    Remote(String),

    /// Network failure or an unreadable response body.
    #[error("connection error: {0}")]
    Connection(String),

    /// A raw value could not be converted to the requested type.
    #[error("cannot convert {value} to {target}")]
    Conversion {
        /// Target type name.
        target: &'static str,
        /// Offending value, rendered as text.
        value: String,
    },
}

impl TmdbError {
    /// Builds a [`TmdbError::Conversion`] from any displayable value.
    pub(crate) fn conversion(target: &'static str, value: impl ToString) -> Self {
        Self::Conversion {
            target,
            value: value.to_string(),
        }
    }

    /// Builds a [`TmdbError::InvalidArgument`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = TmdbError> = std::result::Result<T, E>;

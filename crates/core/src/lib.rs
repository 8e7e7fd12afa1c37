//! Shared primitives for all Rust crates in Grantlens.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Grantlens crates.
pub type AppResult<T> = Result<T, AppError>;

/// A remote field that is unknown until its round-trip has populated it.
///
/// Projections distinguish "the server never sent this" from every real
/// value, including defaults. A loaded `false` and an absent flag are
/// different states and resolution treats them differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection<T> {
    /// The round-trip for this field has not happened or did not return it.
    Absent,
    /// The field has been populated by a completed round-trip.
    Loaded(T),
}

impl<T> Projection<T> {
    /// Creates a populated projection.
    #[must_use]
    pub fn loaded(value: T) -> Self {
        Self::Loaded(value)
    }

    /// Creates an absent projection.
    #[must_use]
    pub fn absent() -> Self {
        Self::Absent
    }

    /// Returns whether the field has been populated.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Returns the populated value, if any.
    #[must_use]
    pub fn as_loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Consumes the projection and returns the populated value, if any.
    #[must_use]
    pub fn into_loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<T> Default for Projection<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Projection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Loaded)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist in the backing store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Structured rejection raised by the remote store during a round-trip.
    ///
    /// This is the one error class the permission resolver is allowed to
    /// swallow into an explicit "unknown" outcome.
    #[error("server rejection: {0}")]
    Server(String),

    /// Network or IO fault while talking to the remote store.
    #[error("transport error: {0}")]
    Transport(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

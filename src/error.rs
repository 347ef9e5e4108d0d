//! Error types for the `Result` layer on top of the raw allocator interface.
//!
//! The raw interface never returns these: exhaustion is a null pointer there.

use thiserror::Error;

/// Result type for fallible allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Allocator errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
  /// No backing memory could be produced for the request.
  #[error("allocator exhausted: requested {requested} bytes")]
  Exhausted { requested: usize },

  /// An arena configuration was rejected at construction.
  #[error("invalid arena configuration: {reason}")]
  InvalidConfig { reason: &'static str },
}

impl AllocError {
  #[inline]
  pub fn exhausted(
    requested: usize,
  ) -> Self {
    Self::Exhausted { requested }
  }

  #[inline]
  pub fn invalid_config(
    reason: &'static str,
  ) -> Self {
    Self::InvalidConfig { reason }
  }

  pub fn is_exhausted(
    &self,
  ) -> bool {
    matches!(self, Self::Exhausted { .. })
  }
}

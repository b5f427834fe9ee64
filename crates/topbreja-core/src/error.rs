//! Error taxonomy shared by every TopBreja crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No session, or the session did not resolve to a user.
  #[error("not authenticated")]
  NotAuthenticated,

  /// Authenticated, but the operation needs the admin role.
  #[error("not authorized")]
  NotAuthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// Concurrent write or backend outage; the caller may retry.
  #[error("conflict or transient failure: {0}")]
  ConflictOrTransient(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(what: impl Into<String>) -> Self { Self::NotFound(what.into()) }

  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  /// Whether retrying the same operation can succeed.
  pub fn is_retryable(&self) -> bool { matches!(self, Self::ConflictOrTransient(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error type for `topbreja-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] topbreja_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A column held a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  #[error("beer not found: {0}")]
  BeerNotFound(uuid::Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Busy/locked databases and constraint violations are worth a retry (or
/// are a conflicting concurrent write); everything else is a plain failure.
fn is_conflict(e: &tokio_rusqlite::Error) -> bool {
  match e {
    tokio_rusqlite::Error::ConnectionClosed => true,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _)) => matches!(
      f.code,
      ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::ConstraintViolation
    ),
    _ => false,
  }
}

impl From<Error> for topbreja_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      Error::UserNotFound(id) => Self::NotFound(format!("user {id}")),
      Error::BeerNotFound(id) => Self::NotFound(format!("beer {id}")),
      Error::CommentNotFound(id) => Self::NotFound(format!("comment {id}")),
      Error::Database(db) if is_conflict(&db) => Self::ConflictOrTransient(db.to_string()),
      other => Self::Store(Box::new(other)),
    }
  }
}

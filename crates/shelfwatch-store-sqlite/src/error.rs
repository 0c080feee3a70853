//! Error type for `shelfwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored string column held a value outside its closed vocabulary.
  #[error("unknown {column} value: {value:?}")]
  UnknownEnum { column: &'static str, value: String },

  /// One of the partial unique indexes on the active-alert dedup keys
  /// fired. The engine serialises ingestion per shelf, so this is a
  /// backstop; the caller should retry the whole snapshot.
  #[error("duplicate active alert: {0}")]
  DuplicateActiveAlert(String),
}

impl Error {
  /// Fold unique-constraint violations into [`Error::DuplicateActiveAlert`]
  /// so callers can distinguish the dedup backstop from real failures.
  pub(crate) fn from_db(err: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      code,
      ref message,
    )) = err
      && code.code == rusqlite::ErrorCode::ConstraintViolation
    {
      return Error::DuplicateActiveAlert(
        message.clone().unwrap_or_else(|| code.to_string()),
      );
    }
    Error::Database(err)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

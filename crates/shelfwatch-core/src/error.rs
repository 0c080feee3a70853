//! Error types for `shelfwatch-core`.

use thiserror::Error;

use crate::alert::{AlertId, AlertStatus};

#[derive(Debug, Error)]
pub enum Error {
  /// The snapshot failed boundary validation before reaching the engine.
  #[error("invalid snapshot: {0}")]
  InvalidSnapshot(String),

  #[error("alert not found: {0}")]
  AlertNotFound(AlertId),

  /// The requested lifecycle transition is not defined from this status.
  /// Surfaced to callers as "not found or already processed".
  #[error("alert {id} not found or already processed (status: {status})")]
  IllegalTransition { id: AlertId, status: AlertStatus },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error at the store seam.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

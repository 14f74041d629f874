//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain-level failure, e.g. a referential error that aborted a batch.
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-surface domain errors smuggled through the connection thread as
/// [`tokio_rusqlite::Error::Other`].
pub(crate) fn lift(err: tokio_rusqlite::Error) -> Error {
  match err {
    tokio_rusqlite::Error::Other(inner) => {
      match inner.downcast::<tally_core::Error>() {
        Ok(core) => Error::Core(*core),
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      }
    }
    other => Error::Database(other),
  }
}

//! Error types for revmix-core.

use crate::insert::InsertId;
use thiserror::Error;

/// Error type for revmix-core operations.
///
/// Only setup and teardown paths return errors. Steady-state mixing never
/// fails: late events are dropped and overruns are resynced instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown insert: {0}")]
    UnknownInsert(InsertId),

    #[error("The main insert cannot be removed")]
    MainInsertRemoval,

    #[error("Failed to spawn fill thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

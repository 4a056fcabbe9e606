//! Error types for the boundaries of the game.
//!
//! The simulation itself never fails; these cover the collaborators around it
//! (save stores, tuning files, store purchases). Callers recover locally.

use std::io;

/// Failures talking to a save store.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid user id: {0:?}")]
    InvalidUser(String),
}

/// Failures loading a tuning table.
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("Tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tuning: {0}")]
    Invalid(String),
}

/// Rejected store purchases. State is left untouched when one of these is returned.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ShopError {
    #[error("Not enough mathbucks: need {cost}, have {balance}")]
    InsufficientFunds { cost: u64, balance: u64 },

    #[error("Gun already unlocked: {0}")]
    AlreadyOwned(String),

    #[error("Gun not unlocked: {0}")]
    Locked(String),

    #[error("Stat already at max level: {0}")]
    Maxed(String),
}

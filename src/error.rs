//! Error types
//!
//! Every error here is recoverable and user-visible; none is fatal to the
//! process. Operations that fail leave local state exactly as the ledger last
//! acknowledged it.

use thiserror::Error;

pub type Result<T, E = GameError> = std::result::Result<T, E>;

/// Errors surfaced by the game and wheel controllers
#[derive(Debug, Error)]
pub enum GameError {
    /// Attempted debit exceeds the current balance
    #[error("insufficient balance: bet {bet} exceeds balance {balance}")]
    InsufficientBalance { balance: u64, bet: u64 },

    /// Bet is zero or above the allowed ceiling
    #[error("invalid bet amount {bet} (allowed 1..={max})")]
    InvalidBetAmount { bet: u64, max: u64 },

    /// The ledger did not acknowledge the update; nothing changed locally
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[from] LedgerError),

    /// Wheel already spun today
    #[error("wheel already spun today")]
    IneligibleSpin,

    /// Spin requested while a spin runs or a reward is on display
    #[error("wheel spin already in progress")]
    SpinInProgress,

    /// No signed-in user
    #[error("no signed-in user")]
    NotSignedIn,

    /// Ball drop requested while the session is idle
    #[error("session is not running")]
    SessionIdle,

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Failures reported by a [`crate::ledger::Ledger`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("update rejected for user {user_id}")]
    Rejected { user_id: String },

    #[error("unknown user {0}")]
    UnknownUser(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Configuration loading/validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by store backends regardless of the underlying technology.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key in {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("no {table} row with id {id}")]
    NotFound { table: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Io(String),
}

/// User-facing failures of game operations. Every variant's message is meant
/// to be shown to the initiating player as-is.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no game with that code")]
    NotFound,

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("at least {needed} players are required, only {got} joined")]
    InsufficientPlayers { needed: usize, got: usize },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

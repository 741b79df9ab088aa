use thiserror::Error;

/// Construction-time alphabet validation failure. Fatal; there is no
/// recovery path short of supplying a corrected alphabet.
#[derive(Error, Debug)]
pub enum AlphabetError {
    #[error("alphabet must contain between {min} and {max} symbols, got {got}")]
    BadSize { min: usize, max: usize, got: usize },

    #[error("duplicate symbol {0:?} in alphabet")]
    DuplicateSymbol(char),

    #[error("unsafe symbol {0:?} in alphabet")]
    UnsafeSymbol(char),
}

/// Decode-time failures. `InvalidSymbol` and `LengthMismatch` are
/// recoverable through the legacy salvage path; `Unrecoverable` is
/// terminal for that input.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("symbol {0:?} is not part of the alphabet")]
    InvalidSymbol(char),

    #[error("length mismatch: {0}")]
    LengthMismatch(String),

    #[error("unrecoverable input: {0}")]
    Unrecoverable(String),
}

/// Backend-level failures. Never observed outside the codec layer; the
/// codec catches these and retries on the sequential backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("parallel backend unavailable")]
    Unavailable,

    #[error("payload of {groups} groups exceeds grid capacity of {capacity}")]
    CapacityExceeded { groups: usize, capacity: usize },

    #[error("backend runtime failure: {0}")]
    RuntimeFailure(String),
}

/// Search-engine failures surfaced to the caller.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no parameter combination met the length budget")]
    Exhausted,

    #[error("render failure: {0}")]
    Render(String),
}

/// Umbrella error for library entry points and the CLI.
#[derive(Error, Debug)]
pub enum InlinkError {
    #[error("alphabet error: {0}")]
    Alphabet(#[from] AlphabetError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("search error: {0}")]
    Search(#[from] SearchError),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

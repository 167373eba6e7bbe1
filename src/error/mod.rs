//! Error handling for the ledger
//!
//! Every fallible ledger operation returns [`Result`], so callers can match on the
//! failure kind instead of parsing messages.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error kinds surfaced by the ledger engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A chain already exists at the given location
    AlreadyInitialized(String),
    /// No chain exists at the given location
    NotInitialized(String),
    /// Read or write failure against the key-value store
    StorageIO(String),
    /// Stored bytes could not be decoded into a ledger value
    Deserialization(String),
    /// A ledger value could not be encoded
    Serialization(String),
    /// Sender does not own enough unspent value
    InsufficientFunds { required: u64, available: u64 },
    /// Nonce search reached its bound without meeting the target
    MiningExhausted { max_nonce: i64 },
    /// A hash reachable from the tip is missing from the store
    ChainCorrupted(String),
    /// Block assembly was given invalid content
    InvalidBlock(String),
    /// Transaction construction was given invalid arguments
    InvalidTransaction(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors outside the store
    Io(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::AlreadyInitialized(path) => {
                write!(f, "Blockchain already exists at {path}")
            }
            LedgerError::NotInitialized(path) => {
                write!(f, "No existing blockchain found at {path}. Create one first.")
            }
            LedgerError::StorageIO(msg) => write!(f, "Storage error: {msg}"),
            LedgerError::Deserialization(msg) => write!(f, "Deserialization error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            LedgerError::MiningExhausted { max_nonce } => {
                write!(f, "Mining exhausted: no valid nonce below {max_nonce}")
            }
            LedgerError::ChainCorrupted(msg) => write!(f, "Chain corrupted: {msg}"),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::StorageIO(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for LedgerError {
    fn from(err: bincode::error::EncodeError) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for LedgerError {
    fn from(err: bincode::error::DecodeError) -> Self {
        LedgerError::Deserialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

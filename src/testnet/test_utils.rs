//! Test utilities for ledger testing

use crate::core::{Blockchain, PowSettings};
use crate::error::{LedgerError, Result};
use tempfile::TempDir;

pub const TEST_DIFFICULTY: u32 = 8;

pub fn test_settings() -> PowSettings {
    PowSettings {
        difficulty: TEST_DIFFICULTY,
        max_nonce: i64::MAX,
    }
}

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(|e| LedgerError::Io(e.to_string()))
}

/// Create a chain whose genesis pays `genesis_address`. Keep the `TempDir`
/// alive for as long as the chain is used.
pub fn create_test_blockchain(genesis_address: &str) -> Result<(Blockchain, TempDir)> {
    let temp_dir = create_temp_dir()?;
    let db_path = temp_dir.path().join("test_blockchain");
    let blockchain =
        Blockchain::create_blockchain_with_path(genesis_address, &db_path, test_settings())?;

    Ok((blockchain, temp_dir))
}

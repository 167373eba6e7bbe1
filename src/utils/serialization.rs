// Canonical encoding for everything that is hashed or stored.
// Fixed-width big-endian integers keep the byte form identical across runs.
use crate::error::{LedgerError, Result};
use bincode::config::{BigEndian, Configuration, Fixint, Limit};
use serde::{Deserialize, Serialize};

/// Upper bound on the bytes a single decoded value may claim.
pub const MAX_DECODE_BYTES: usize = 32 * 1024 * 1024;

// The limit makes a corrupt length prefix fail before anything is allocated.
fn canonical() -> Configuration<BigEndian, Fixint, Limit<MAX_DECODE_BYTES>> {
    bincode::config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
        .with_limit::<MAX_DECODE_BYTES>()
}

/// Serialize data with the canonical bincode configuration
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    bincode::encode_to_vec(data, canonical())
        .map_err(|e| LedgerError::Serialization(format!("Serialization failed: {e}")))
}

/// Deserialize data with the canonical bincode configuration.
/// Input that is not consumed completely is rejected as a foreign format.
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let (data, read) = bincode::decode_from_slice(bytes, canonical())
        .map_err(|e| LedgerError::Deserialization(format!("Deserialization failed: {e}")))?;
    if read != bytes.len() {
        return Err(LedgerError::Deserialization(format!(
            "{} trailing bytes after decoded value",
            bytes.len() - read
        )));
    }
    Ok(data)
}

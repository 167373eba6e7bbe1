//! Hashing and encoding helpers
//!
//! SHA-256 digests, fixed-width integer encoding and the canonical binary
//! serialization shared by hashing and storage.

pub mod crypto;
pub mod serialization;

pub use crypto::{encode_i64, sha256_digest};

pub use serialization::{deserialize, serialize};

//! Configuration management
//!
//! Where the chain lives and how hard blocks are to mine. Values come from
//! defaults, an optional TOML file, then `LEDGER_*` environment variables.

pub mod settings;

pub use settings::Config;

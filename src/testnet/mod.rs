//! Fixtures for unit tests: throwaway chains in temporary directories, mined at
//! a low difficulty so tests stay fast.

pub mod test_utils;

pub use test_utils::*;

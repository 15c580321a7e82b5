//! Configuration types
//!
//! Board-agnostic configuration for the touchscreen link. Hosts may build
//! it in code, or deserialize it from TOML or postcard.

pub mod types;

pub use types::*;

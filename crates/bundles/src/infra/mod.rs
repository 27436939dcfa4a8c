//! Infrastructure adapters for config, logging, and the external toolchain.

pub mod config;
pub mod logging;
pub mod toolchain;

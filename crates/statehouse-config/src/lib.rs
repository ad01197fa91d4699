//! Configuration for statehouse stores
//!
//! This crate provides:
//! - Config file discovery (CWD, user config dir, home directory)
//! - Store configuration (StoreConfig) parsed from TOML

pub mod config_file;
pub mod paths;
pub mod store_config;

pub use config_file::load_config_file;
pub use store_config::StoreConfig;

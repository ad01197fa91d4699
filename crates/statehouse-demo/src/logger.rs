//! Console logging using env_logger
//!
//! The level comes from the store config; `RUST_LOG` overrides it.

use statehouse_config::StoreConfig;

/// Initialize logging for the demo
pub fn init(config: &StoreConfig) {
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

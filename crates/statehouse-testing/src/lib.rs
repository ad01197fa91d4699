//! Test harness for statehouse stores
//!
//! This crate provides:
//! - [`RecordingInterceptor`]: records every `(action, old, new)` triple in dispatch order
//! - [`EffectRunner`]: drives one effect with a single trigger and collects its outputs
//! - [`SelectorOverride`]: pins selector values (`mock_result` / `clear_mock_result`)

pub mod effect_runner;
pub mod error;
pub mod recording;

pub use effect_runner::EffectRunner;
pub use error::EffectRunnerError;
pub use recording::{Record, RecordingInterceptor};
pub use statehouse::testing::SelectorOverride;

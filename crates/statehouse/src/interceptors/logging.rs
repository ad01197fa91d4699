//! LoggingInterceptor - logs every dispatched action

use crate::action::Action;
use crate::interceptor::Interceptor;
use log::{Level, LevelFilter};
use statehouse_config::StoreConfig;
use std::borrow::Cow;

/// Logs all actions passing through the store
pub struct LoggingInterceptor {
    level: Option<Level>,
    skip: Vec<Cow<'static, str>>,
}

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self {
            level: Some(Level::Debug),
            skip: Vec::new(),
        }
    }

    /// Interceptor logging at the level configured for the store
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new().with_level(config.log_level())
    }

    /// Log at `level`; `LevelFilter::Off` silences the interceptor
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level.to_level();
        self
    }

    /// Do not log actions with this name (e.g. high-frequency ticks)
    pub fn skip(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.skip.push(name.into());
        self
    }

    fn should_log(&self, name: &str) -> Option<Level> {
        if self.skip.iter().any(|skipped| skipped == name) {
            return None;
        }
        self.level
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A: Action> Interceptor<S, A> for LoggingInterceptor {
    fn on_dispatch(&mut self, action: &A, _old: &S, _new: &S) {
        if let Some(level) = self.should_log(&action.name()) {
            log::log!(level, "Action: {:?}", action);
        }
    }
}

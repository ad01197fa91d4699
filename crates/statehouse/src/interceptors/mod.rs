//! Built-in interceptors

pub mod logging;
pub mod print;

pub use logging::LoggingInterceptor;
pub use print::PrintInterceptor;

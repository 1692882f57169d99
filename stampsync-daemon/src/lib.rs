//! Watch runtime: notify watchers, event classification and the single
//! reconciliation loop.

pub mod classify;
mod error;
pub mod logging;
mod runtime;

pub use classify::EventFilter;
pub use error::DaemonError;
pub use logging::{init_tracing, LogFormat};
pub use runtime::{event_loop, run, start_blocking, LoopSettings};

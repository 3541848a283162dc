//! Process-wide `tracing` setup, plus the macros every module logs with.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};

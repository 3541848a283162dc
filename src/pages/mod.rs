//! Server-rendered pages behind the access guard.

mod error;
mod handler;
mod router;

pub use error::recover_error;
pub use handler::metrics_options;
pub use router::routes;

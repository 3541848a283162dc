// store

mod session_store;

pub use session_store::*;

// remote

mod auth_signal;
mod http_transport;

pub use auth_signal::*;
pub use http_transport::*;

mod auth_channel;
mod http_transport_fake;
mod http_transport_reqwest;
mod session_store_cookie;
mod session_store_memory;

pub use auth_channel::*;
pub use http_transport_fake::*;
pub use http_transport_reqwest::*;
pub use session_store_cookie::*;
pub use session_store_memory::*;

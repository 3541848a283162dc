mod server;
mod sign_out_listener;

pub use server::*;
pub use sign_out_listener::*;

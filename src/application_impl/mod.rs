mod access_guard;
mod api_client;
mod auth_client;
mod claim_decoder_jwt;
mod credential;
pub mod permission_evaluator;
mod refresh_coordinator;
mod sign_out;

pub use access_guard::*;
pub use api_client::*;
pub use auth_client::*;
pub use claim_decoder_jwt::*;
pub use credential::*;
pub use refresh_coordinator::*;
pub use sign_out::*;

mod access_guard;
mod api_error;
mod claim_decoder;

pub use access_guard::*;
pub use api_error::*;
pub use claim_decoder::*;

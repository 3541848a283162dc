mod claims;
mod context;
mod token;
mod user;

pub use claims::*;
pub use context::*;
pub use token::*;
pub use user::*;

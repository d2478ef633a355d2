mod contact;
mod health_check;
mod helpers;

pub use contact::{ContactError, method_not_allowed, send_message};
pub use health_check::health_check;
pub use helpers::error_chain_fmt;

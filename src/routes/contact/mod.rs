mod contact_handler;
mod errors;

pub use contact_handler::{method_not_allowed, send_message};
pub use errors::ContactError;

mod contact_email;
mod contact_submission;
mod mail_address;
mod verification_result;

pub use contact_email::{CONTACT_SUBJECT, ContactEmail, MailRouting};
pub use contact_submission::ContactSubmission;
pub use mail_address::MailAddress;
pub use verification_result::VerificationResult;

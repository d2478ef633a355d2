use super::{ContactSubmission, MailAddress};

pub const CONTACT_SUBJECT: &str = "Contact Form";

/// Where every contact message goes: the relay account it is sent from and
/// the single mailbox that receives it.
#[derive(Debug, Clone)]
pub struct MailRouting {
    pub sender: MailAddress,
    pub recipient: MailAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEmail {
    pub from: MailAddress,
    pub to: MailAddress,
    pub subject: &'static str,
    pub body: String,
}

impl ContactEmail {
    pub fn compose(submission: &ContactSubmission, routing: &MailRouting) -> Self {
        let body = format!(
            "Submitted by: {} [{}]:\r\n\r\n{}",
            submission.name, submission.reply_to, submission.message
        );

        Self {
            from: routing.sender.clone(),
            to: routing.recipient.clone(),
            subject: CONTACT_SUBJECT,
            body,
        }
    }

    /// Plain-text message with From/To/Subject headers, a blank line and the body.
    pub fn to_rfc822(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.from, self.to, self.subject, self.body
        )
    }
}

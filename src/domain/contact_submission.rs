/// A contact form payload as posted by the front-end.
///
/// Missing fields decode as empty strings; the verification service rejects
/// an empty token, so nothing unverified gets through.
#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ContactSubmission {
    pub name: String,
    #[serde(rename = "replyTo")]
    pub reply_to: String,
    pub message: String,
    pub recaptcha: String,
}

impl ContactSubmission {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

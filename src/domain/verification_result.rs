use chrono::{DateTime, Utc};

/// Verdict returned by the bot-detection service for one token.
#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VerificationResult {
    /// Absent means rejected.
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub challenge_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

impl VerificationResult {
    pub fn rejection_reason(&self) -> String {
        self.error_codes.join(", ")
    }
}

use actix_web::{ResponseError, error::PayloadError, http::StatusCode};

use super::super::helpers::error_chain_fmt;
use crate::verifier::VerifyError;

/// Every way a submission can fail. The response body is the `Display` text,
/// which is the underlying error's own description.
#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("payload exceeds the {0} byte limit")]
    TooLarge(usize),
    #[error("{0}")]
    Unreadable(#[source] PayloadError),
    #[error("{0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Verification(#[from] VerifyError),
    #[error("{}", .0.join(", "))]
    Rejected(Vec<String>),
    #[error("{0}")]
    Delivery(#[source] anyhow::Error),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::Rejected(_) => StatusCode::FORBIDDEN,
            ContactError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ContactError::Unreadable(_)
            | ContactError::Decode(_)
            | ContactError::Verification(_)
            | ContactError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

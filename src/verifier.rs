use std::time::Duration;

use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::VerificationResult;

#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Checks a client-submitted bot-detection token.
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerificationResult, VerifyError>;
}

#[derive(Clone)]
pub struct RecaptchaClient {
    http_client: Client,
    verify_url: Url,
    secret: SecretString,
}

#[derive(Serialize)]
struct SiteVerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
}

impl RecaptchaClient {
    pub fn new(
        verify_url: Url,
        secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            verify_url,
            secret,
        })
    }
}

#[async_trait::async_trait]
impl Verifier for RecaptchaClient {
    #[tracing::instrument(
        name = "Verifying a reCAPTCHA token",
        skip_all,
        fields(score = tracing::field::Empty, hostname = tracing::field::Empty)
    )]
    async fn verify(&self, token: &str) -> Result<VerificationResult, VerifyError> {
        let form = SiteVerifyRequest {
            secret: self.secret.expose_secret(),
            response: token,
        };

        // The status code is not consulted; the body decides.
        let body = self
            .http_client
            .post(self.verify_url.clone())
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        let result: VerificationResult = serde_json::from_str(&body)?;

        let span = tracing::Span::current();
        span.record("score", result.score);
        span.record("hostname", tracing::field::display(&result.hostname));
        tracing::debug!(
            success = result.success,
            action = %result.action,
            "Verification service replied"
        );

        Ok(result)
    }
}

use std::time::Duration;

use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    address::Envelope,
    transport::smtp::authentication::{Credentials, Mechanism},
};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::ContactEmail;

/// Hands a composed message to a mail relay.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &ContactEmail) -> Result<(), anyhow::Error>;
}

#[derive(serde::Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

pub struct SmtpConnection<'a> {
    pub host: &'a str,
    pub port: u16,
    pub username: &'a str,
    pub password: &'a SecretString,
    pub tls: SmtpTls,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(connection: SmtpConnection<'_>) -> Result<Self, lettre::transport::smtp::Error> {
        let builder = match connection.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(connection.host)?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(connection.host)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(connection.host),
        };

        let transport = builder
            .port(connection.port)
            .credentials(Credentials::new(
                connection.username.to_owned(),
                connection.password.expose_secret().to_owned(),
            ))
            .authentication(vec![Mechanism::Plain])
            .timeout(Some(connection.timeout))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait::async_trait]
impl MailSender for SmtpMailer {
    #[tracing::instrument(name = "Relaying contact email over SMTP", skip_all, fields(to = %email.to))]
    async fn send(&self, email: &ContactEmail) -> Result<(), anyhow::Error> {
        let from: Address = email.from.as_ref().parse()?;
        let to: Address = email.to.as_ref().parse()?;
        let envelope = Envelope::new(Some(from), vec![to])?;

        let response = self
            .transport
            .send_raw(&envelope, email.to_rfc822().as_bytes())
            .await?;
        tracing::debug!(code = %response.code(), "Relay accepted the message");

        Ok(())
    }
}

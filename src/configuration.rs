use std::time::Duration;

use config::builder::{ConfigBuilder, DefaultState};
use reqwest::Url;
use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::{MailAddress, MailRouting};
use crate::mailer::{SmtpConnection, SmtpMailer, SmtpTls};
use crate::verifier::RecaptchaClient;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub recaptcha: RecaptchaSettings,
    pub smtp: SmtpSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_body_bytes: usize,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct RecaptchaSettings {
    pub verify_url: String,
    pub secret: SecretString,
    pub timeout_ms: u64,
}

impl RecaptchaSettings {
    pub fn client(&self) -> Result<RecaptchaClient, anyhow::Error> {
        let url = Url::parse(&self.verify_url)?;
        Ok(RecaptchaClient::new(url, self.secret.clone(), self.timeout())?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub recipient_email: String,
    #[serde(default)]
    pub tls: SmtpTls,
    pub timeout_ms: u64,
}

impl SmtpSettings {
    pub fn mailer(&self) -> Result<SmtpMailer, anyhow::Error> {
        let mailer = SmtpMailer::new(SmtpConnection {
            host: &self.host,
            port: self.port,
            username: &self.username,
            password: &self.password,
            tls: self.tls,
            timeout: self.timeout(),
        })?;
        Ok(mailer)
    }

    /// The relay account doubles as the From address.
    pub fn routing(&self) -> Result<MailRouting, String> {
        Ok(MailRouting {
            sender: MailAddress::parse(self.username.clone())?,
            recipient: MailAddress::parse(self.recipient_email.clone())?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "{other} is not supported environment. Try to use `local` or `production`",
            )),
        }
    }
}

/// Flat variables understood by earlier deployments, mapped onto settings keys.
const LEGACY_VARIABLES: [(&str, &str); 7] = [
    ("RECAPTCHA_SECRET", "recaptcha.secret"),
    ("SMTP_USER", "smtp.username"),
    ("SMTP_PW", "smtp.password"),
    ("SMTP_ADDR", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("MAIL_TO", "smtp.recipient_email"),
    ("PORT", "application.port"),
];

pub fn get_configuration() -> Result<Settings, anyhow::Error> {
    let base_path = std::env::current_dir()?;
    let conf_dir = base_path.join("configuration");
    let env: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let builder = config::Config::builder()
        .add_source(config::File::from(conf_dir.join("base.yaml")).required(true))
        .add_source(config::File::from(conf_dir.join(format!("{}.yaml", env.as_str()))).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .prefix_separator("_"),
        );

    let builder = with_legacy_variables(builder, |variable| std::env::var(variable).ok())?;

    Ok(builder.build()?.try_deserialize::<Settings>()?)
}

/// Set-but-empty variables are treated as unset.
fn with_legacy_variables<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (variable, key) in LEGACY_VARIABLES {
        let value = lookup(variable).filter(|v| !v.is_empty());
        builder = builder.set_override_option(key, value)?;
    }
    Ok(builder)
}

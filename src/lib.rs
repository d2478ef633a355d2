pub mod configuration;
pub mod domain;
pub mod mailer;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod verifier;

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::domain::MailRouting;
use crate::mailer::MailSender;
use crate::routes::{health_check, method_not_allowed, send_message};
use crate::verifier::Verifier;

/// Largest contact form body the relay will read.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let verifier = config
            .recaptcha
            .client()
            .context("Failed to build the reCAPTCHA client.")?;
        let mailer = config
            .smtp
            .mailer()
            .context("Failed to build the SMTP transport.")?;
        let routing = config
            .smtp
            .routing()
            .map_err(anyhow::Error::msg)
            .context("Invalid mail routing addresses.")?;

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener =
            TcpListener::bind(&address).with_context(|| format!("Failed to bind {address}"))?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            Arc::new(verifier),
            Arc::new(mailer),
            routing,
            BodyLimit(config.application.max_body_bytes),
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    verifier: Arc<dyn Verifier>,
    mailer: Arc<dyn MailSender>,
    routing: MailRouting,
    body_limit: BodyLimit,
) -> Result<Server, std::io::Error> {
    let verifier = web::Data::from(verifier);
    let mailer = web::Data::from(mailer);
    let routing = web::Data::new(routing);
    let body_limit = web::Data::new(body_limit);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/")
                    .route(web::post().to(send_message))
                    .default_service(web::to(method_not_allowed)),
            )
            .app_data(verifier.clone())
            .app_data(mailer.clone())
            .app_data(routing.clone())
            .app_data(body_limit.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

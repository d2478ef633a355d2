use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use futures::StreamExt;

use super::errors::ContactError;
use crate::{
    domain::{ContactEmail, ContactSubmission, MailRouting},
    mailer::MailSender,
    startup::BodyLimit,
    verifier::Verifier,
};

#[tracing::instrument(
    name = "Relaying a contact form submission",
    skip_all,
    fields(reply_to = tracing::field::Empty)
)]
pub async fn send_message(
    payload: web::Payload,
    limit: web::Data<BodyLimit>,
    verifier: web::Data<dyn Verifier>,
    mailer: web::Data<dyn MailSender>,
    routing: web::Data<MailRouting>,
) -> Result<HttpResponse, ContactError> {
    let outcome = match read_body(payload, limit.0).await {
        Ok(body) => relay_submission(&body, verifier.get_ref(), mailer.get_ref(), &routing).await,
        Err(e) => Err(e),
    };
    report_outcome(outcome)
}

pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    let status = 405;
    tracing::error!(
        status,
        method = %req.method(),
        "Error {}: {} is not accepted",
        status,
        req.method()
    );
    HttpResponse::MethodNotAllowed().finish()
}

/// Logs exactly one line for the outcome and turns it into the response.
fn report_outcome(outcome: Result<String, ContactError>) -> Result<HttpResponse, ContactError> {
    match outcome {
        Ok(reply_to) => {
            tracing::info!("Sent message from {}", reply_to);
            Ok(HttpResponse::Ok().finish())
        }
        Err(e) => {
            let status = e.status_code().as_u16();
            tracing::error!(
                status,
                error.cause_chain = ?e,
                error.message = %e,
                "Error {}: {}",
                status,
                e
            );
            Err(e)
        }
    }
}

/// Reads at most `limit` bytes. An oversized body is drained, not buffered,
/// so the client still receives the 413.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::BytesMut, ContactError> {
    let mut body = web::BytesMut::new();
    let mut oversized = false;
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(ContactError::Unreadable)?;
        if oversized || body.len() + chunk.len() > limit {
            oversized = true;
            continue;
        }
        body.extend_from_slice(&chunk);
    }

    if oversized {
        return Err(ContactError::TooLarge(limit));
    }
    Ok(body)
}

/// Decode, verify, then relay. Returns the sender's reply-to address.
async fn relay_submission(
    body: &[u8],
    verifier: &dyn Verifier,
    mailer: &dyn MailSender,
    routing: &MailRouting,
) -> Result<String, ContactError> {
    let submission = ContactSubmission::parse(body).map_err(ContactError::Decode)?;
    tracing::Span::current().record("reply_to", tracing::field::display(&submission.reply_to));

    let verdict = verifier.verify(&submission.recaptcha).await?;
    if !verdict.success {
        return Err(ContactError::Rejected(verdict.error_codes));
    }

    let email = ContactEmail::compose(&submission, routing);
    mailer.send(&email).await.map_err(ContactError::Delivery)?;

    Ok(submission.reply_to)
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use claims::{assert_err, assert_ok};
use contact_relay::{
    domain::{ContactEmail, ContactSubmission, MailAddress, MailRouting},
    mailer::{MailSender, SmtpConnection, SmtpMailer, SmtpTls},
};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct Transcript {
    auth: Vec<String>,
    envelope: Vec<String>,
    messages: Vec<String>,
}

/// Minimal ESMTP relay over plaintext that accepts everything unless told
/// to refuse recipients.
struct FakeSmtpServer {
    port: u16,
    transcript: Arc<Mutex<Transcript>>,
}

impl FakeSmtpServer {
    async fn start(refuse_recipients: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let transcript = Arc::new(Mutex::new(Transcript::default()));

        let shared = transcript.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = shared.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, shared, refuse_recipients).await;
                });
            }
        });

        Self { port, transcript }
    }
}

async fn serve(
    stream: TcpStream,
    transcript: Arc<Mutex<Transcript>>,
    refuse_recipients: bool,
) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    write.write_all(b"220 fake.relay ESMTP\r\n").await?;

    while let Some(line) = lines.next_line().await? {
        let command = line.to_ascii_uppercase();
        if command.starts_with("EHLO") || command.starts_with("HELO") {
            write
                .write_all(b"250-fake.relay\r\n250 AUTH PLAIN LOGIN\r\n")
                .await?;
        } else if command.starts_with("AUTH") {
            transcript.lock().unwrap().auth.push(line);
            write.write_all(b"235 2.7.0 Authentication successful\r\n").await?;
        } else if command.starts_with("MAIL FROM") {
            transcript.lock().unwrap().envelope.push(line);
            write.write_all(b"250 2.1.0 OK\r\n").await?;
        } else if command.starts_with("RCPT TO") {
            if refuse_recipients {
                write.write_all(b"554 5.7.1 relay access denied\r\n").await?;
            } else {
                transcript.lock().unwrap().envelope.push(line);
                write.write_all(b"250 2.1.5 OK\r\n").await?;
            }
        } else if command == "DATA" {
            write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await?;
            let mut data = Vec::new();
            while let Some(data_line) = lines.next_line().await? {
                if data_line == "." {
                    break;
                }
                data.push(data_line);
            }
            transcript.lock().unwrap().messages.push(data.join("\r\n"));
            write.write_all(b"250 2.0.0 queued\r\n").await?;
        } else if command == "QUIT" {
            write.write_all(b"221 2.0.0 Bye\r\n").await?;
            break;
        } else {
            write.write_all(b"250 OK\r\n").await?;
        }
    }

    Ok(())
}

fn mailer(port: u16, timeout: Duration) -> SmtpMailer {
    SmtpMailer::new(SmtpConnection {
        host: "127.0.0.1",
        port,
        username: "relay@example.com",
        password: &SecretString::from("hunter2"),
        tls: SmtpTls::None,
        timeout,
    })
    .expect("Failed to build the SMTP transport.")
}

fn contact_email() -> ContactEmail {
    let routing = MailRouting {
        sender: MailAddress::parse("relay@example.com".into()).unwrap(),
        recipient: MailAddress::parse("inbox@example.com".into()).unwrap(),
    };
    let submission = ContactSubmission {
        name: "Ann".into(),
        reply_to: "ann@x.com".into(),
        message: "Hi".into(),
        recaptcha: "tok".into(),
    };
    ContactEmail::compose(&submission, &routing)
}

#[tokio::test]
async fn smtp_mailer_delivers_the_rendered_message() {
    let server = FakeSmtpServer::start(false).await;
    let email = contact_email();

    let outcome = mailer(server.port, Duration::from_secs(5)).send(&email).await;

    assert_ok!(outcome);
    let transcript = server.transcript.lock().unwrap();
    assert_eq!(transcript.messages, vec![email.to_rfc822()]);
    assert_eq!(transcript.auth.len(), 1);
    assert!(transcript.auth[0].starts_with("AUTH PLAIN"));
    assert!(transcript.envelope[0].contains("<relay@example.com>"));
    assert!(transcript.envelope[1].contains("<inbox@example.com>"));
}

#[tokio::test]
async fn smtp_mailer_fails_when_the_relay_refuses_the_recipient() {
    let server = FakeSmtpServer::start(true).await;

    let outcome = mailer(server.port, Duration::from_secs(5))
        .send(&contact_email())
        .await;

    assert_err!(outcome);
    assert!(server.transcript.lock().unwrap().messages.is_empty());
}

#[tokio::test]
async fn smtp_mailer_fails_when_nothing_is_listening() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let outcome = mailer(port, Duration::from_secs(1))
        .send(&contact_email())
        .await;

    assert_err!(outcome);
}

//! Probe message submission over SMTP

use crate::{
    client::TestMessage,
    error::Result,
    models::{ProbeEndpoint, ServerSettings},
    types::TransportSecurity,
};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

/// Value of the client identification header
pub const USER_AGENT: &str = concat!("mail-health-exporter/", env!("CARGO_PKG_VERSION"));

/// Build the RFC 5322 message for a probe
pub fn build_message(message: &TestMessage) -> Result<Message> {
    let from: Mailbox = message.from.parse()?;
    let to: Mailbox = message.to.parse()?;

    let email = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject())
        .date_now()
        .message_id(None)
        .user_agent(USER_AGENT.to_string())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body())?;

    Ok(email)
}

/// Build a transport for `server` using its security mode
pub fn build_transport(
    server: &ServerSettings,
    credentials: Credentials,
    timeout: Duration,
) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match server.security {
        TransportSecurity::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&server.host)?,
        TransportSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&server.host)?,
        TransportSecurity::Plaintext => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&server.host),
    };

    Ok(builder
        .port(server.port)
        .credentials(credentials)
        .timeout(Some(timeout))
        .build())
}

/// Submit `message` through the submission server of `sender`, logged in
/// with the sender's own address and credential
pub async fn send_message(sender: &ProbeEndpoint, message: &TestMessage, timeout: Duration) -> Result<()> {
    let email = build_message(message)?;
    let credentials = Credentials::new(sender.address.clone(), sender.credential.expose().to_string());
    let transport = build_transport(&sender.submission, credentials, timeout)?;

    tracing::debug!(
        server = %sender.submission,
        from = %message.from,
        to = %message.to,
        "Submitting probe message"
    );

    let response = transport.send(email).await?;
    tracing::debug!(code = %response.code(), "Submission accepted");

    Ok(())
}

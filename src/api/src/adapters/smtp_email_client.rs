use crate::domain::email_client::{Attachment, EmailClient};
use crate::domain::subscriber_email::SubscriberEmail;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Sends through an SMTP relay over STARTTLS, authenticating with the
/// account's password.
#[derive(Clone)]
pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: SubscriberEmail,
}

impl SmtpEmailClient {
    pub fn new(
        server: &str,
        port: u16,
        username: String,
        password: Secret<String>,
        sender: SubscriberEmail,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .with_context(|| format!("Failed to configure the SMTP relay {}", server))?
            .port(port)
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, sender })
    }

    fn build_message(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
        attachment: Option<&Attachment>,
    ) -> Result<Message, anyhow::Error> {
        let from: Mailbox = self
            .sender
            .as_ref()
            .parse()
            .context("The sender address is not a valid mailbox")?;
        let to: Mailbox = recipient
            .as_ref()
            .parse()
            .with_context(|| format!("{} is not a valid mailbox", recipient))?;

        let alternative =
            MultiPart::alternative_plain_html(text_content.to_string(), html_content.to_string());
        let body = match attachment {
            None => alternative,
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .with_context(|| format!("Invalid content type {}", attachment.content_type))?;
                MultiPart::mixed().multipart(alternative).singlepart(
                    MailAttachment::new(attachment.file_name.clone())
                        .body(attachment.content.clone(), content_type),
                )
            }
        };

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(body)
            .context("Failed to build the email message")
    }
}

#[async_trait]
impl EmailClient for SmtpEmailClient {
    #[tracing::instrument(
        name = "Sending email through SMTP",
        skip(self, html_content, text_content, attachment),
        fields(recipient = %recipient)
    )]
    async fn send_email_to(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), anyhow::Error> {
        let message =
            self.build_message(recipient, subject, html_content, text_content, attachment)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("The SMTP relay rejected the message to {}", recipient))?;
        Ok(())
    }
}

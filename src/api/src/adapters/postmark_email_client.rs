use crate::domain::email_client::{Attachment, EmailClient};
use crate::domain::subscriber_email::SubscriberEmail;
use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

#[derive(Clone)]
pub struct PostmarkEmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    authorization_token: Secret<String>,
}

impl PostmarkEmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let http_client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<PostmarkAttachment<'a>>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkAttachment<'a> {
    name: &'a str,
    content: String,
    content_type: &'a str,
}

impl<'a> From<&'a Attachment> for PostmarkAttachment<'a> {
    fn from(attachment: &'a Attachment) -> Self {
        Self {
            name: &attachment.file_name,
            content: STANDARD.encode(&attachment.content),
            content_type: &attachment.content_type,
        }
    }
}

#[async_trait]
impl EmailClient for PostmarkEmailClient {
    #[tracing::instrument(
        name = "Sending email through Postmark",
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
        let url = format!("{}/email", self.base_url);
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
            text_body: text_content,
            attachments: attachment.into_iter().map(PostmarkAttachment::from).collect(),
        };

        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach the email API")?
            .error_for_status()
            .with_context(|| format!("The email API rejected the message to {}", recipient))?;

        Ok(())
    }
}

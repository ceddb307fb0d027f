use crate::domain::subscriber_email::SubscriberEmail;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "application/pdf".to_string(),
            content,
        }
    }

    pub fn csv(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: "text/csv".to_string(),
            content,
        }
    }
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email_to(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), anyhow::Error>;
}

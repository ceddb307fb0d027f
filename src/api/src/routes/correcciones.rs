use crate::clock::InstitutionClock;
use crate::domain::correction_repository::CorrectionRepository;
use crate::domain::correction_request::{ArticleFile, NewCorrectionRequest};
use crate::domain::email_client::{Attachment, EmailClient};
use crate::domain::employee_number::EmployeeNumber;
use crate::domain::requested_service::RequestedService;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_repository::RepositoryError;
use crate::notifications::{correction_admin_notice, correction_receipt, EmailContent};
use crate::registry::write_file_atomically;
use crate::routes::page;
use crate::startup::{NotificationRecipient, UploadsDirectory};
use crate::utils::{error_chain_fmt, see_other};
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;

#[derive(thiserror::Error)]
pub enum CorrectionError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CorrectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CorrectionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for CorrectionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::UnexpectedError(e) => Self::UnexpectedError(e),
            other => Self::UnexpectedError(anyhow::anyhow!(other.to_string())),
        }
    }
}

#[derive(MultipartForm)]
pub struct CorrectionForm {
    name: Text<String>,
    email: Text<String>,
    email_confirmation: Text<String>,
    employee_number: Text<String>,
    services: Vec<Text<String>>,
    #[multipart(limit = "25MiB")]
    article: TempFile,
}

fn services_checkboxes() -> String {
    RequestedService::ALL
        .iter()
        .map(|s| {
            format!(
                r#"<label><input type="checkbox" name="services" value="{}"> {}</label><br>"#,
                s.key(),
                s.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ")
}

pub async fn correction_form(flash_messages: IncomingFlashMessages) -> HttpResponse {
    let body = format!(
        r#"<form action="/correcciones" method="post" enctype="multipart/form-data">
        <label>Nombre completo <input type="text" name="name"></label><br>
        <label>Correo electrónico <input type="email" name="email"></label><br>
        <label>Confirma tu correo <input type="email" name="email_confirmation"></label><br>
        <label>Número económico <input type="text" name="employee_number"></label><br>
        <p>Servicios solicitados:</p>
        {services}
        <label>Artículo (.doc o .docx) <input type="file" name="article" accept=".doc,.docx"></label><br>
        <button type="submit">Enviar</button>
    </form>"#,
        services = services_checkboxes(),
    );
    page("Solicitud de corrección", &flash_messages, &body)
}

/// Turns the submitted form into a request, reading the uploaded file.
async fn parse_request(form: CorrectionForm) -> Result<NewCorrectionRequest, CorrectionError> {
    let name = SubscriberName::parse(form.name.0).map_err(CorrectionError::ValidationError)?;
    let email = SubscriberEmail::parse(form.email.0).map_err(CorrectionError::ValidationError)?;
    let confirmation = form.email_confirmation.0;
    if !confirmation.trim().eq_ignore_ascii_case(email.as_ref()) {
        return Err(CorrectionError::ValidationError(
            "The email and its confirmation do not match.".to_string(),
        ));
    }
    let employee_number =
        EmployeeNumber::parse(form.employee_number.0).map_err(CorrectionError::ValidationError)?;

    let mut services: Vec<RequestedService> = Vec::new();
    for key in form.services.iter() {
        if let Some(service) = RequestedService::from_key(&key.0) {
            if !services.contains(&service) {
                services.push(service);
            }
        }
    }
    if services.is_empty() {
        return Err(CorrectionError::ValidationError(
            "Select at least one service.".to_string(),
        ));
    }

    let original_name = form.article.file_name.clone().unwrap_or_default();
    let content = tokio::fs::read(form.article.file.path())
        .await
        .context("Failed to read the uploaded article")?;
    let article =
        ArticleFile::parse(original_name, content).map_err(CorrectionError::ValidationError)?;

    Ok(NewCorrectionRequest {
        name,
        email,
        employee_number,
        services,
        article,
    })
}

#[allow(clippy::too_many_arguments)]
#[tracing::instrument(
    name = "Receiving a correction request",
    skip(form, repo, email_client, clock, uploads, notification_recipient),
    fields(author_email = tracing::field::Empty)
)]
pub async fn submit_correction(
    MultipartForm(form): MultipartForm<CorrectionForm>,
    repo: web::Data<dyn CorrectionRepository>,
    email_client: web::Data<dyn EmailClient>,
    clock: web::Data<InstitutionClock>,
    uploads: web::Data<UploadsDirectory>,
    notification_recipient: web::Data<NotificationRecipient>,
) -> Result<HttpResponse, CorrectionError> {
    let request = parse_request(form).await?;
    tracing::Span::current()
        .record("author_email", tracing::field::display(&request.email));

    let stored_as = uploads.0.join(format!(
        "{}_{}",
        uuid::Uuid::new_v4(),
        request.article.original_name
    ));
    write_file_atomically(&stored_as, &request.article.content)
        .await
        .context("Failed to store the uploaded article")?;
    tracing::info!(path = %stored_as.display(), "Article stored");

    repo.insert_request(&request, clock.local_timestamp()).await?;

    let attachment = Attachment {
        file_name: request.article.original_name.clone(),
        content_type: request.article.content_type().to_string(),
        content: request.article.content.clone(),
    };
    let services = request.services_label();
    notify(
        email_client.get_ref(),
        &request.email,
        correction_receipt(
            request.name.as_ref(),
            &request.article.original_name,
            &services,
        ),
        &attachment,
    )
    .await;
    notify(
        email_client.get_ref(),
        &notification_recipient.0,
        correction_admin_notice(request.name.as_ref(), request.email.as_ref(), &services),
        &attachment,
    )
    .await;

    FlashMessage::success(format!(
        "Recibimos tu archivo {}. Te enviamos un correo de confirmación.",
        request.article.original_name
    ))
    .send();
    Ok(see_other("/correcciones"))
}

async fn notify(
    email_client: &dyn EmailClient,
    recipient: &SubscriberEmail,
    content: EmailContent,
    attachment: &Attachment,
) {
    if let Err(e) = email_client
        .send_email_to(
            recipient,
            &content.subject,
            &content.html,
            &content.text,
            Some(attachment),
        )
        .await
    {
        tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            recipient = %recipient,
            "Failed to send a correction notification"
        );
    }
}

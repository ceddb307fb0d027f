use crate::adapters::csv_table::read_header;
use crate::clock::InstitutionClock;
use crate::domain::email_client::{Attachment, EmailClient};
use crate::domain::remote_store::RemoteStore;
use crate::notifications::registry_replaced_notice;
use crate::registry::{Registries, RegistryKind};
use crate::startup::NotificationRecipient;
use crate::utils::{error_chain_fmt, see_other};
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use actix_web_flash_messages::FlashMessage;
use anyhow::Context;

#[derive(thiserror::Error)]
pub enum RegistryError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} is not available.")]
    NotAvailable(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for RegistryError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotAvailable(_) => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tracing::instrument(name = "Downloading a registry", skip(registries, store))]
pub async fn download_registry(
    kind: web::Path<RegistryKind>,
    registries: web::Data<Registries>,
    store: web::Data<dyn RemoteStore>,
) -> Result<HttpResponse, RegistryError> {
    let file = registries.get(kind.into_inner());
    let _guard = file.lock().await;

    file.sync(store.get_ref()).await;
    if !file.exists().await {
        return Err(RegistryError::NotAvailable(file.remote_name().to_string()));
    }
    let content = file.read_bytes().await?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.remote_name().to_string())],
        })
        .body(content))
}

#[derive(MultipartForm)]
pub struct RegistryUpload {
    #[multipart(limit = "25MiB")]
    file: TempFile,
}

/// The upload must look like the registry it replaces: a CSV whose header
/// carries the email column.
fn validate_registry(kind: RegistryKind, content: &[u8]) -> Result<(), RegistryError> {
    let header = read_header(content).map_err(|e| {
        RegistryError::ValidationError(format!("The file is not a valid CSV: {}", e))
    })?;
    let has_email_column = header.iter().any(|column| {
        kind.email_columns()
            .iter()
            .any(|expected| column.eq_ignore_ascii_case(expected))
    });
    if !has_email_column {
        return Err(RegistryError::ValidationError(format!(
            "The {} registry needs a `{}` column.",
            kind.as_str(),
            kind.email_columns()[0]
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
#[tracing::instrument(
    name = "Replacing a registry",
    skip(form, registries, store, email_client, clock, notification_recipient)
)]
pub async fn replace_registry(
    kind: web::Path<RegistryKind>,
    MultipartForm(form): MultipartForm<RegistryUpload>,
    registries: web::Data<Registries>,
    store: web::Data<dyn RemoteStore>,
    email_client: web::Data<dyn EmailClient>,
    clock: web::Data<InstitutionClock>,
    notification_recipient: web::Data<NotificationRecipient>,
) -> Result<HttpResponse, RegistryError> {
    let kind = kind.into_inner();
    let content = tokio::fs::read(form.file.file.path())
        .await
        .context("Failed to read the uploaded registry")?;
    validate_registry(kind, &content)?;

    let file = registries.get(kind);
    {
        let _guard = file.lock().await;
        file.replace_with(&content, store.get_ref())
            .await
            .context("Failed to replace the registry on the remote host")?;
    }
    tracing::info!(remote_name = file.remote_name(), "Registry replaced");

    let notice = registry_replaced_notice(file.remote_name(), clock.local_timestamp());
    let attachment = Attachment::csv(file.remote_name(), content);
    if let Err(e) = email_client
        .send_email_to(
            &notification_recipient.0,
            &notice.subject,
            &notice.html,
            &notice.text,
            Some(&attachment),
        )
        .await
    {
        tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            "Failed to notify the registry replacement"
        );
    }

    FlashMessage::success(format!("Se reemplazó {}.", file.remote_name())).send();
    Ok(see_other("/admin/dashboard"))
}

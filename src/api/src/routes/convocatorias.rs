use crate::clock::InstitutionClock;
use crate::domain::email_client::EmailClient;
use crate::domain::employee_number::EmployeeNumber;
use crate::domain::status::Status;
use crate::domain::subscriber::{NewSubscriber, SubscriberRecord};
use crate::domain::subscriber_email::SubscriberEmail;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_repository::{RepositoryError, SubscriberRepository};
use crate::notifications::{
    subscription_confirmation, ACTION_REACTIVATED, ACTION_REGISTERED, ACTION_UNSUBSCRIBED,
};
use crate::routes::page;
use crate::utils::{error_chain_fmt, see_other};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use htmlescape::encode_minimal;

#[derive(thiserror::Error)]
pub enum ConvocatoriaError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} is already registered.")]
    AlreadyRegistered(String),
    #[error("There is no registration for {0}.")]
    NotFound(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ConvocatoriaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConvocatoriaError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyRegistered(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ConvocatoriaError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::AlreadyRegistered(email) => Self::AlreadyRegistered(email),
            RepositoryError::SubscriberNotFound(email) => Self::NotFound(email),
            RepositoryError::UnexpectedError(e) => Self::UnexpectedError(e),
        }
    }
}

#[derive(serde::Deserialize)]
pub struct LookupQuery {
    email: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct SubscriptionFormData {
    name: String,
    email: String,
    employee_number: String,
}

impl TryFrom<SubscriptionFormData> for NewSubscriber {
    type Error = String;

    fn try_from(value: SubscriptionFormData) -> Result<Self, Self::Error> {
        let name = SubscriberName::parse(value.name)?;
        let email = SubscriberEmail::parse(value.email)?;
        let employee_number = EmployeeNumber::parse(value.employee_number)?;
        Ok(Self {
            email,
            name,
            employee_number,
        })
    }
}

#[derive(serde::Deserialize)]
pub struct UnsubscribeFormData {
    email: String,
}

#[derive(serde::Deserialize)]
pub struct ReactivationFormData {
    current_email: String,
    name: String,
    email: String,
    employee_number: String,
}

const LOOKUP_FORM: &str = r#"<form action="/convocatorias" method="get">
        <label>Correo electrónico
            <input type="email" placeholder="Ingresa tu correo" name="email">
        </label>
        <button type="submit">Consultar</button>
    </form>"#;

fn registration_form(email: &str) -> String {
    format!(
        r#"<p>No encontramos una suscripción para {email}. Puedes registrarte:</p>
    <form action="/convocatorias/register" method="post">
        <label>Nombre completo <input type="text" name="name"></label>
        <label>Correo electrónico <input type="email" name="email" value="{email}"></label>
        <label>Número económico <input type="text" name="employee_number"></label>
        <button type="submit">Registrarme</button>
    </form>"#,
        email = encode_minimal(email),
    )
}

fn active_details(record: &SubscriberRecord) -> String {
    format!(
        r#"<p>Tu suscripción está activa.</p>
    <ul>
        <li>Nombre: {name}</li>
        <li>Correo electrónico: {email}</li>
        <li>Número económico: {number}</li>
        <li>Fecha de registro: {date}</li>
    </ul>
    <form action="/convocatorias/unsubscribe" method="post">
        <input type="hidden" name="email" value="{email}">
        <button type="submit">Darme de baja</button>
    </form>"#,
        name = encode_minimal(&record.name),
        email = encode_minimal(&record.email),
        number = encode_minimal(&record.employee_number),
        date = encode_minimal(&record.date),
    )
}

fn reactivation_form(record: &SubscriberRecord) -> String {
    format!(
        r#"<p>Tu suscripción está inactiva ({status}). Revisa tus datos para reactivarla:</p>
    <form action="/convocatorias/reactivate" method="post">
        <input type="hidden" name="current_email" value="{email}">
        <label>Nombre completo <input type="text" name="name" value="{name}"></label>
        <label>Correo electrónico <input type="email" name="email" value="{email}"></label>
        <label>Número económico <input type="text" name="employee_number" value="{number}"></label>
        <button type="submit">Actualizar y reactivar</button>
    </form>"#,
        status = encode_minimal(record.status.as_str()),
        name = encode_minimal(&record.name),
        email = encode_minimal(&record.email),
        number = encode_minimal(&record.employee_number),
    )
}

#[tracing::instrument(name = "Looking up a convocatoria subscription", skip(query, repo, flash_messages))]
pub async fn convocatorias_page(
    query: web::Query<LookupQuery>,
    repo: web::Data<dyn SubscriberRepository>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, ConvocatoriaError> {
    let title = "Suscripción a convocatorias";
    let raw_email = match query.0.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => return Ok(page(title, &flash_messages, LOOKUP_FORM)),
    };
    let email = SubscriberEmail::parse(raw_email).map_err(ConvocatoriaError::ValidationError)?;

    let body = match repo.find_by_email(&email).await? {
        None => registration_form(email.as_ref()),
        Some(record) if record.status.is_active() => active_details(&record),
        Some(record) => reactivation_form(&record),
    };
    Ok(page(title, &flash_messages, &format!("{}\n{}", LOOKUP_FORM, body)))
}

#[tracing::instrument(
    name = "Registering a convocatoria subscriber",
    skip(form, repo, email_client, clock),
    fields(subscriber_email = %form.email)
)]
pub async fn register_subscriber(
    form: web::Form<SubscriptionFormData>,
    repo: web::Data<dyn SubscriberRepository>,
    email_client: web::Data<dyn EmailClient>,
    clock: web::Data<InstitutionClock>,
) -> Result<HttpResponse, ConvocatoriaError> {
    let new_subscriber: NewSubscriber =
        form.0.try_into().map_err(ConvocatoriaError::ValidationError)?;

    repo.insert_subscriber(&new_subscriber, clock.today())
        .await?;

    send_confirmation(
        email_client.get_ref(),
        &new_subscriber.email,
        Some(new_subscriber.name.as_ref()),
        ACTION_REGISTERED,
        &clock,
    )
    .await;

    FlashMessage::success("Registro exitoso. Te enviamos un correo de confirmación.").send();
    Ok(see_other("/convocatorias"))
}

#[tracing::instrument(
    name = "Unsubscribing from convocatorias",
    skip(form, repo, email_client, clock),
    fields(subscriber_email = %form.email)
)]
pub async fn unsubscribe(
    form: web::Form<UnsubscribeFormData>,
    repo: web::Data<dyn SubscriberRepository>,
    email_client: web::Data<dyn EmailClient>,
    clock: web::Data<InstitutionClock>,
) -> Result<HttpResponse, ConvocatoriaError> {
    let email =
        SubscriberEmail::parse(form.0.email).map_err(ConvocatoriaError::ValidationError)?;

    let record = repo.set_status(&email, Status::Inactive).await?;

    send_confirmation(
        email_client.get_ref(),
        &email,
        Some(record.name.as_str()),
        ACTION_UNSUBSCRIBED,
        &clock,
    )
    .await;

    FlashMessage::success("Tu suscripción fue dada de baja.").send();
    Ok(see_other("/convocatorias"))
}

#[tracing::instrument(
    name = "Reactivating a convocatoria subscriber",
    skip(form, repo, email_client, clock),
    fields(subscriber_email = %form.current_email, new_email = %form.email)
)]
pub async fn reactivate_subscriber(
    form: web::Form<ReactivationFormData>,
    repo: web::Data<dyn SubscriberRepository>,
    email_client: web::Data<dyn EmailClient>,
    clock: web::Data<InstitutionClock>,
) -> Result<HttpResponse, ConvocatoriaError> {
    let form = form.0;
    let current_email =
        SubscriberEmail::parse(form.current_email).map_err(ConvocatoriaError::ValidationError)?;
    let update: NewSubscriber = SubscriptionFormData {
        name: form.name,
        email: form.email,
        employee_number: form.employee_number,
    }
    .try_into()
    .map_err(ConvocatoriaError::ValidationError)?;

    repo.update_and_reactivate(&current_email, &update, clock.today())
        .await?;

    send_confirmation(
        email_client.get_ref(),
        &update.email,
        Some(update.name.as_ref()),
        ACTION_REACTIVATED,
        &clock,
    )
    .await;

    FlashMessage::success("Tus datos fueron actualizados y tu suscripción está activa.").send();
    Ok(see_other("/convocatorias"))
}

/// The registry change already happened, so a failed confirmation is only
/// logged.
#[tracing::instrument(name = "Send a subscription confirmation", skip(email_client, name, clock))]
async fn send_confirmation(
    email_client: &dyn EmailClient,
    recipient: &SubscriberEmail,
    name: Option<&str>,
    action: &str,
    clock: &InstitutionClock,
) {
    let content = subscription_confirmation(name, action, clock.local_timestamp());
    if let Err(e) = email_client
        .send_email_to(recipient, &content.subject, &content.html, &content.text, None)
        .await
    {
        tracing::warn!(
            error.cause_chain = ?e,
            error.message = %e,
            "Failed to send the subscription confirmation"
        );
    }
}

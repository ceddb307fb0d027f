use crate::broadcast::{BroadcastError, BroadcastStatus, BroadcastTracker, Broadcaster};
use crate::domain::remote_store::{RemoteStore, RemoteStoreError};
use crate::registry::Registries;
use crate::routes::page;
use crate::utils::{e400, e500, see_other};
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use anyhow::Context;
use htmlescape::encode_minimal;

const PDF_MAGIC: &[u8] = b"%PDF-";

fn broadcast_status_html(status: &BroadcastStatus) -> String {
    match status {
        BroadcastStatus::Idle => "<p>No se ha enviado ninguna convocatoria desde el último reinicio.</p>".to_string(),
        BroadcastStatus::Running { started_at } => format!(
            "<p>Envío en curso desde {}.</p>",
            started_at.format("%Y-%m-%d %H:%M:%S")
        ),
        BroadcastStatus::Finished {
            report,
            finished_at,
        } => format!(
            "<p>Último envío terminado a las {}: {} correos, {} éxitos, {} fallos ({:.1}%).</p>",
            finished_at.format("%Y-%m-%d %H:%M:%S"),
            report.total,
            report.sent,
            report.failed,
            report.success_rate()
        ),
        BroadcastStatus::Failed {
            message,
            finished_at,
        } => format!(
            "<p><b>El último envío falló a las {}: {}</b></p>",
            finished_at.format("%Y-%m-%d %H:%M:%S"),
            encode_minimal(message)
        ),
    }
}

pub async fn convocatoria_admin_page(
    registries: web::Data<Registries>,
    tracker: web::Data<BroadcastTracker>,
    flash_messages: IncomingFlashMessages,
) -> HttpResponse {
    let document = &registries.convocatoria_pdf;
    let document_html = if document.exists().await {
        format!(
            r#"<p>PDF cargado: {}</p>
    <form action="/admin/convocatorias/pdf/delete" method="post">
        <button type="submit">Eliminar PDF</button>
    </form>"#,
            encode_minimal(document.remote_name())
        )
    } else {
        "<p>No hay un PDF cargado.</p>".to_string()
    };
    let body = format!(
        r#"<h2>Documento</h2>
    {document_html}
    <form action="/admin/convocatorias/pdf" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept=".pdf">
        <button type="submit">Subir PDF</button>
    </form>
    <h2>Envío</h2>
    {status}
    <form action="/admin/convocatorias/broadcast" method="post">
        <button type="submit">Enviar convocatoria a los suscriptores activos</button>
    </form>
    <p><a href="/admin/dashboard">Volver al panel</a></p>"#,
        status = broadcast_status_html(&tracker.status()),
    );
    page("Envío de convocatorias", &flash_messages, &body)
}

#[derive(MultipartForm)]
pub struct DocumentUpload {
    #[multipart(limit = "25MiB")]
    file: TempFile,
}

#[tracing::instrument(name = "Uploading the convocatoria PDF", skip(form, registries, store))]
pub async fn upload_convocatoria_pdf(
    MultipartForm(form): MultipartForm<DocumentUpload>,
    registries: web::Data<Registries>,
    store: web::Data<dyn RemoteStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let content = tokio::fs::read(form.file.file.path())
        .await
        .context("Failed to read the uploaded document")
        .map_err(e500)?;
    if !content.starts_with(PDF_MAGIC) {
        return Err(e400("The uploaded file is not a PDF document."));
    }

    let document = &registries.convocatoria_pdf;
    let _guard = document.lock().await;
    document
        .replace_with(&content, store.get_ref())
        .await
        .map_err(e500)?;

    FlashMessage::success("El PDF de la convocatoria fue actualizado.").send();
    Ok(see_other("/admin/convocatorias"))
}

#[tracing::instrument(name = "Deleting the convocatoria PDF", skip(registries, store))]
pub async fn delete_convocatoria_pdf(
    registries: web::Data<Registries>,
    store: web::Data<dyn RemoteStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let document = &registries.convocatoria_pdf;
    let _guard = document.lock().await;
    match store.remove(document.remote_name()).await {
        Ok(()) | Err(RemoteStoreError::NotFound(_)) => {}
        Err(e) => return Err(e500(e)),
    }
    document.remove_local().await.map_err(e500)?;

    FlashMessage::info("El PDF de la convocatoria fue eliminado.").send();
    Ok(see_other("/admin/convocatorias"))
}

#[tracing::instrument(name = "Starting a convocatoria broadcast", skip(broadcaster, tracker))]
pub async fn start_broadcast(
    broadcaster: web::Data<Broadcaster>,
    tracker: web::Data<BroadcastTracker>,
) -> Result<HttpResponse, actix_web::Error> {
    match broadcaster.get_ref().clone().spawn(tracker.get_ref().clone()) {
        Ok(()) => {
            FlashMessage::success("El envío de la convocatoria comenzó.").send();
        }
        Err(BroadcastError::AlreadyRunning) => {
            FlashMessage::error("Ya hay un envío en curso.").send();
        }
        Err(e) => return Err(e500(e)),
    }
    Ok(see_other("/admin/convocatorias"))
}

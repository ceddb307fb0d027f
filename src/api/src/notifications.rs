use crate::broadcast::BroadcastReport;
use chrono::NaiveDateTime;
use htmlescape::encode_minimal;

pub const ACTION_REGISTERED: &str = "Confirmación de inscripción";
pub const ACTION_UNSUBSCRIBED: &str = "Confirmación de baja";
pub const ACTION_REACTIVATED: &str = "Actualización de datos y reactivación";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl EmailContent {
    fn from_text(subject: String, text: String) -> Self {
        Self {
            subject,
            html: html_from_text(&text),
            text,
        }
    }
}

/// Escapes user supplied values and keeps the paragraph layout of the
/// plain text version.
fn html_from_text(text: &str) -> String {
    let paragraphs: Vec<String> = text
        .split("\n\n")
        .map(|p| format!("<p>{}</p>", encode_minimal(p).replace('\n', "<br>")))
        .collect();
    paragraphs.join("\n")
}

fn greeting(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hola {},", name),
        None => "Hola,".to_string(),
    }
}

pub fn subscription_confirmation(
    name: Option<&str>,
    action: &str,
    at: NaiveDateTime,
) -> EmailContent {
    let text = format!(
        "{}\n\nTus datos de suscripción han sido actualizados:\n\n\
         Acción realizada: {}\nFecha: {}\n\n\
         Gracias por utilizar nuestro servicio.\n\nSaludos cordiales.",
        greeting(name),
        action,
        at.format("%Y-%m-%d %H:%M")
    );
    EmailContent::from_text(format!("Convocatorias - {}", action), text)
}

pub fn correction_receipt(name: &str, article_name: &str, services: &str) -> EmailContent {
    let text = format!(
        "{}\n\nHemos recibido tu archivo: {} y los siguientes servicios solicitados: {}.",
        greeting(Some(name)),
        article_name,
        services
    );
    EmailContent::from_text("Confirmación de recepción de documento".to_string(), text)
}

pub fn correction_admin_notice(name: &str, email: &str, services: &str) -> EmailContent {
    let text = format!(
        "Se ha recibido un archivo de {} ({}).\nServicios solicitados: {}.",
        name, email, services
    );
    EmailContent::from_text("Nuevo archivo recibido".to_string(), text)
}

pub fn registry_replaced_notice(file_name: &str, at: NaiveDateTime) -> EmailContent {
    let text = format!(
        "Se ha subido un nuevo archivo al servidor: {}.\nFecha: {}",
        file_name,
        at.format("%Y-%m-%d %H:%M")
    );
    EmailContent::from_text("Nuevo archivo subido al servidor".to_string(), text)
}

pub fn convocatoria_announcement() -> EmailContent {
    EmailContent::from_text(
        "Nueva Convocatoria INCICh".to_string(),
        "Adjunto encontrarás la nueva convocatoria del INCICh. \
         Revisa los detalles en el archivo PDF."
            .to_string(),
    )
}

pub fn broadcast_report(report: &BroadcastReport, at: NaiveDateTime) -> EmailContent {
    let text = format!(
        "Reporte de envío:\n\n\
         - Total correos: {}\n\
         - Éxitos: {}\n\
         - Fallos: {}\n\
         - Tasa éxito: {:.1}%\n\
         - Hora: {}",
        report.total,
        report.sent,
        report.failed,
        report.success_rate(),
        at.format("%H:%M:%S")
    );
    EmailContent::from_text(
        format!("Reporte Convocatorias - {}", at.format("%Y-%m-%d")),
        text,
    )
}

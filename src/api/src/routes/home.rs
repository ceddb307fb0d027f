use crate::routes::page;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;

pub async fn home(flash_messages: IncomingFlashMessages) -> HttpResponse {
    page(
        "OASIS",
        &flash_messages,
        r#"<ul>
        <li><a href="/convocatorias">Suscripción a convocatorias</a></li>
        <li><a href="/correcciones">Solicitud de corrección de artículos</a></li>
        <li><a href="/monitoring">Productividad</a></li>
        <li><a href="/login">Administración</a></li>
    </ul>"#,
    )
}

use crate::routes::page;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;

pub async fn login_form(flash_messages: IncomingFlashMessages) -> HttpResponse {
    page(
        "Administración",
        &flash_messages,
        r#"<form action="/login" method="post">
        <label>Usuario
            <input type="text" placeholder="Usuario" name="username">
        </label>
        <label>Contraseña
            <input type="password" placeholder="Contraseña" name="password">
        </label>
        <button type="submit">Entrar</button>
    </form>"#,
    )
}

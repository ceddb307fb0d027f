mod admin;
mod convocatorias;
mod correcciones;
mod health_check;
mod home;
mod login;
mod monitoring;

pub use admin::*;
pub use convocatorias::*;
pub use correcciones::*;
pub use health_check::*;
pub use home::*;
pub use login::*;
pub use monitoring::*;

use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use htmlescape::encode_minimal;

/// Flash messages of the previous request, errors in bold.
fn flash_html(flash_messages: &IncomingFlashMessages) -> String {
    flash_messages
        .iter()
        .map(|m| match m.level() {
            Level::Error | Level::Warning => format!("<p><b>{}</b></p>\n", encode_minimal(m.content())),
            _ => format!("<p><i>{}</i></p>\n", encode_minimal(m.content())),
        })
        .collect()
}

/// Wraps `body` in the shared page layout. `body` must already be escaped.
fn page(title: &str, flash_messages: &IncomingFlashMessages, body: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{title}</title>
</head>
<body>
    <h1>{title}</h1>
    {flash}
    {body}
    <p><a href="/">Inicio</a></p>
</body>
</html>"#,
            title = encode_minimal(title),
            flash = flash_html(flash_messages),
            body = body,
        ))
}

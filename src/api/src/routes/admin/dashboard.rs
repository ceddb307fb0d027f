use crate::authentication::UserId;
use crate::routes::page;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use htmlescape::encode_minimal;

pub async fn admin_dashboard(
    user_id: web::ReqData<UserId>,
    flash_messages: IncomingFlashMessages,
) -> HttpResponse {
    let username = user_id.into_inner();
    let body = format!(
        r#"<p>Bienvenido {username}.</p>
    <p>Acciones disponibles:</p>
    <ol>
        <li><a href="/admin/registries/convocatorias/download">Descargar registro de convocatorias</a></li>
        <li><a href="/admin/registries/correcciones/download">Descargar registro de correcciones</a></li>
        <li>
            <form action="/admin/registries/convocatorias" method="post" enctype="multipart/form-data">
                Reemplazar registro de convocatorias
                <input type="file" name="file" accept=".csv">
                <button type="submit">Subir</button>
            </form>
        </li>
        <li>
            <form action="/admin/registries/correcciones" method="post" enctype="multipart/form-data">
                Reemplazar registro de correcciones
                <input type="file" name="file" accept=".csv">
                <button type="submit">Subir</button>
            </form>
        </li>
        <li><a href="/admin/convocatorias">Envío de convocatorias</a></li>
        <li><a href="/monitoring">Productividad</a></li>
        <li>
            <form name="logoutForm" action="/admin/logout" method="post">
                <input type="submit" value="Cerrar sesión">
            </form>
        </li>
    </ol>"#,
        username = encode_minimal(&username),
    );
    page("Panel de administración", &flash_messages, &body)
}

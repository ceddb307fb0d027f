use crate::helpers::{
    assert_is_redirect_to, file_form, spawn_app, NOTIFICATION_EMAIL, PDF_FILE, SUBSCRIBERS_FILE,
};

#[tokio::test]
async fn you_must_be_logged_in_to_access_the_admin_dashboard() {
    let app = spawn_app().await;

    let response = app.get("/admin/dashboard").await;

    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn an_error_flash_message_is_set_on_failure() {
    // Arrange
    let app = spawn_app().await;

    // Act - Part 1 - Try to login
    let login_body = serde_json::json!({
        "username": "random-username",
        "password": "random-password"
    });
    let response = app.post_login(&login_body).await;

    // Assert
    assert_is_redirect_to(&response, "/login");

    // Act - Part 2 - Follow the redirect
    let html_page = app.get_html("/login").await;
    assert!(html_page.contains("Authentication failed"));

    // Act - Part 3 - Reload the login page
    let html_page = app.get_html("/login").await;
    assert!(!html_page.contains("Authentication failed"));
}

#[tokio::test]
async fn redirect_to_admin_dashboard_after_login_success() {
    let app = spawn_app().await;

    app.login_as_admin().await;

    let html_page = app.get_html("/admin/dashboard").await;
    assert!(html_page.contains(&format!("Bienvenido {}", app.admin.username)));
}

#[tokio::test]
async fn logout_clears_session_state() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app.post_form("/admin/logout", &serde_json::json!({})).await;
    assert_is_redirect_to(&response, "/login");

    let html_page = app.get_html("/login").await;
    assert!(html_page.contains("Cerraste sesión correctamente."));

    let response = app.get("/admin/dashboard").await;
    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn registries_are_downloaded_fresh_from_the_remote_host() {
    let app = spawn_app().await;
    app.login_as_admin().await;
    let content = "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
                   2024-01-02,Ana,ana@example.org,1,Activo\n";
    app.seed_remote(SUBSCRIBERS_FILE, content.as_bytes());

    let response = app.get("/admin/registries/convocatorias/download").await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        response.headers().get("Content-Type").unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains(SUBSCRIBERS_FILE));
    assert_eq!(response.text().await.unwrap(), content);
}

#[tokio::test]
async fn downloading_a_missing_registry_returns_a_404() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app.get("/admin/registries/correcciones/download").await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn unknown_registries_return_a_404() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app.get("/admin/registries/usuarios/download").await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn replacing_a_registry_uploads_it_and_notifies_the_staff() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;
    app.login_as_admin().await;
    let content = "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
                   2024-03-04,Luis,luis@example.org,9,Activo\n";

    let response = app
        .post_multipart(
            "/admin/registries/convocatorias",
            file_form("nuevo.csv", content.as_bytes()),
        )
        .await;

    assert_is_redirect_to(&response, "/admin/dashboard");
    assert_eq!(app.read_remote(SUBSCRIBERS_FILE), content);
    let emails = app.sent_emails().await;
    assert_eq!(emails[0]["To"], NOTIFICATION_EMAIL);
    assert_eq!(emails[0]["Subject"], "Nuevo archivo subido al servidor");
    assert_eq!(emails[0]["Attachments"][0]["ContentType"], "text/csv");
}

#[tokio::test]
async fn a_replacement_without_the_email_column_is_rejected() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app
        .post_multipart(
            "/admin/registries/convocatorias",
            file_form("nuevo.csv", b"Nombre,Telefono\nAna,555\n"),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
    assert!(!app.remote_exists(SUBSCRIBERS_FILE));
}

#[tokio::test]
async fn the_convocatoria_pdf_can_be_uploaded_and_deleted() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app
        .post_multipart(
            "/admin/convocatorias/pdf",
            file_form("convocatoria.pdf", b"%PDF-1.4 test"),
        )
        .await;
    assert_is_redirect_to(&response, "/admin/convocatorias");
    assert!(app.remote_exists(PDF_FILE));
    let html = app.get_html("/admin/convocatorias").await;
    assert!(html.contains("PDF cargado"));

    let response = app
        .post_form("/admin/convocatorias/pdf/delete", &serde_json::json!({}))
        .await;
    assert_is_redirect_to(&response, "/admin/convocatorias");
    assert!(!app.remote_exists(PDF_FILE));
    let html = app.get_html("/admin/convocatorias").await;
    assert!(html.contains("No hay un PDF cargado."));
}

#[tokio::test]
async fn files_that_are_not_pdfs_are_rejected() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app
        .post_multipart(
            "/admin/convocatorias/pdf",
            file_form("convocatoria.pdf", b"not a pdf"),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

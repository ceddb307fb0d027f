use crate::helpers::{
    assert_is_redirect_to, correction_form, spawn_app, CORRECTIONS_FILE, NOTIFICATION_EMAIL,
};

#[tokio::test]
async fn the_form_lists_every_service() {
    let app = spawn_app().await;

    let html = app.get_html("/correcciones").await;

    assert!(html.contains(r#"enctype="multipart/form-data""#));
    assert!(html.contains(r#"value="originality_check""#));
    assert!(html.contains(r#"value="partial_translation""#));
}

#[tokio::test]
async fn a_valid_submission_is_recorded_and_the_article_stored() {
    // Arrange
    let app = spawn_app().await;
    app.mock_email_api(200).await;

    // Act
    let response = app
        .post_multipart(
            "/correcciones",
            correction_form("ana@example.org", " ANA@example.org ", "articulo.docx"),
        )
        .await;

    // Assert
    assert_is_redirect_to(&response, "/correcciones");
    let registry = app.read_remote(CORRECTIONS_FILE);
    assert!(registry.contains(
        "Fecha,Nombre,Email,Número económico,Nombre del artículo,Servicios solicitados,Estado,Fecha terminación"
    ));
    assert!(registry.contains(
        "Ana López,ana@example.org,A-1234,articulo.docx,\"Parafraseo, Revisión de estilo\",Activo,"
    ));
    let articles = app.uploaded_articles();
    assert_eq!(articles.len(), 1);
    assert!(articles[0].ends_with("_articulo.docx"));
}

#[tokio::test]
async fn the_author_and_the_staff_receive_the_article() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;

    app.post_multipart(
        "/correcciones",
        correction_form("ana@example.org", "ana@example.org", "articulo.docx"),
    )
    .await;

    let emails = app.sent_emails().await;
    assert_eq!(emails.len(), 2);
    let receipt = emails
        .iter()
        .find(|e| e["To"] == "ana@example.org")
        .expect("No receipt for the author");
    assert_eq!(receipt["Subject"], "Confirmación de recepción de documento");
    assert_eq!(receipt["Attachments"][0]["Name"], "articulo.docx");
    let notice = emails
        .iter()
        .find(|e| e["To"] == NOTIFICATION_EMAIL)
        .expect("No notice for the staff");
    assert_eq!(notice["Subject"], "Nuevo archivo recibido");
    assert_eq!(
        notice["Attachments"][0]["ContentType"],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
}

#[tokio::test]
async fn mismatched_email_confirmation_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .post_multipart(
            "/correcciones",
            correction_form("ana@example.org", "otra@example.org", "articulo.docx"),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
    assert!(!app.remote_exists(CORRECTIONS_FILE));
    assert!(app.uploaded_articles().is_empty());
}

#[tokio::test]
async fn only_word_documents_are_accepted() {
    let app = spawn_app().await;

    let response = app
        .post_multipart(
            "/correcciones",
            correction_form("ana@example.org", "ana@example.org", "articulo.pdf"),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn at_least_one_known_service_is_required() {
    let app = spawn_app().await;
    let article = reqwest::multipart::Part::bytes(b"content".to_vec()).file_name("articulo.doc");
    let form = reqwest::multipart::Form::new()
        .text("name", "Ana López")
        .text("email", "ana@example.org")
        .text("email_confirmation", "ana@example.org")
        .text("employee_number", "A-1234")
        .text("services", "typesetting")
        .part("article", article);

    let response = app.post_multipart("/correcciones", form).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn email_failures_do_not_undo_the_submission() {
    let app = spawn_app().await;
    app.mock_email_api(500).await;

    let response = app
        .post_multipart(
            "/correcciones",
            correction_form("ana@example.org", "ana@example.org", "articulo.docx"),
        )
        .await;

    assert_is_redirect_to(&response, "/correcciones");
    assert!(app.read_remote(CORRECTIONS_FILE).contains("articulo.docx"));
}

use crate::helpers::{
    assert_is_redirect_to, spawn_app, COUNTER_EMAIL, NOTIFICATION_EMAIL, PDF_FILE,
    SUBSCRIBERS_FILE,
};

fn registry() -> String {
    format!(
        "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
         2024-01-01,Ana,ana@example.org,1,Activo\n\
         2024-01-01,Luis,luis@example.org,2,activo\n\
         2024-01-01,Eva,eva@example.org,3,Inactivo\n\
         2024-01-01,CONVOCATORIA,{},4,Inactivo\n",
        COUNTER_EMAIL
    )
}

#[tokio::test]
async fn you_must_be_logged_in_to_start_a_broadcast() {
    let app = spawn_app().await;

    let response = app
        .post_form("/admin/convocatorias/broadcast", &serde_json::json!({}))
        .await;

    assert_is_redirect_to(&response, "/login");
    assert!(app.sent_emails().await.is_empty());
}

#[tokio::test]
async fn active_subscribers_receive_the_pdf_and_the_staff_a_report() {
    // Arrange
    let app = spawn_app().await;
    app.mock_email_api(200).await;
    app.seed_remote(SUBSCRIBERS_FILE, registry().as_bytes());
    app.seed_remote(PDF_FILE, b"%PDF-1.4 convocatoria");
    app.login_as_admin().await;

    // Act
    let response = app
        .post_form("/admin/convocatorias/broadcast", &serde_json::json!({}))
        .await;
    assert_is_redirect_to(&response, "/admin/convocatorias");
    let html = app.wait_for_broadcast().await;

    // Assert
    assert!(html.contains("2 correos, 2 éxitos, 0 fallos (100.0%)"));
    let emails = app.sent_emails().await;
    let recipients: Vec<&str> = emails.iter().map(|e| e["To"].as_str().unwrap()).collect();
    assert_eq!(
        recipients,
        vec!["ana@example.org", "luis@example.org", NOTIFICATION_EMAIL]
    );
    assert_eq!(emails[0]["Subject"], "Nueva Convocatoria INCICh");
    assert_eq!(emails[0]["Attachments"][0]["ContentType"], "application/pdf");
    assert!(emails[2]["Subject"]
        .as_str()
        .unwrap()
        .starts_with("Reporte Convocatorias - "));
    assert!(app
        .read_remote(SUBSCRIBERS_FILE)
        .contains(&format!("CONVOCATORIA,{},5,Inactivo", COUNTER_EMAIL)));
}

#[tokio::test]
async fn a_broadcast_without_a_pdf_fails_without_counting() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;
    app.seed_remote(SUBSCRIBERS_FILE, registry().as_bytes());
    app.login_as_admin().await;

    app.post_form("/admin/convocatorias/broadcast", &serde_json::json!({}))
        .await;
    let html = app.wait_for_broadcast().await;

    assert!(html.contains("There is no convocatoria PDF to send."));
    assert!(app.sent_emails().await.is_empty());
    assert!(app
        .read_remote(SUBSCRIBERS_FILE)
        .contains(&format!("CONVOCATORIA,{},4,Inactivo", COUNTER_EMAIL)));
}

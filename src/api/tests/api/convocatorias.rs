use crate::helpers::{assert_is_redirect_to, spawn_app, SUBSCRIBERS_FILE};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn registering_a_new_subscriber_stores_it_on_the_remote_host() {
    // Arrange
    let app = spawn_app().await;
    app.mock_email_api(200).await;

    // Act
    let response = app.register_subscriber("Ana López", "Ana@Example.org").await;

    // Assert
    assert_is_redirect_to(&response, "/convocatorias");
    let registry = app.read_remote(SUBSCRIBERS_FILE);
    assert!(registry.starts_with('\u{feff}'));
    assert!(registry.contains("Fecha,Nombre completo,Correo electronico,Numero economico,Estado"));
    assert!(registry.contains("Ana López,ana@example.org,A-1234,Activo"));
}

#[tokio::test]
async fn registering_sends_a_confirmation_email() {
    // Arrange
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Act
    app.register_subscriber("Ana López", "ana@example.org").await;

    // Assert
    let emails = app.sent_emails().await;
    assert_eq!(emails[0]["To"], "ana@example.org");
    assert_eq!(
        emails[0]["Subject"],
        "Convocatorias - Confirmación de inscripción"
    );
    assert!(emails[0]["TextBody"]
        .as_str()
        .unwrap()
        .starts_with("Hola Ana López,"));
}

#[tokio::test]
async fn the_flash_message_is_shown_after_registering() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;

    app.register_subscriber("Ana López", "ana@example.org").await;
    let html = app.get_html("/convocatorias").await;

    assert!(html.contains("Registro exitoso"));
}

#[tokio::test]
async fn registering_twice_returns_a_409() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;

    app.register_subscriber("Ana López", "ana@example.org").await;
    let response = app.register_subscriber("Otra Ana", " ANA@example.org ").await;

    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn register_returns_a_400_when_fields_are_present_but_invalid() {
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({"name": "", "email": "ana@example.org", "employee_number": "1"}),
            "empty name",
        ),
        (
            serde_json::json!({"name": "Ana", "email": "not-an-email", "employee_number": "1"}),
            "invalid email",
        ),
        (
            serde_json::json!({"name": "Ana", "email": "ana@example.org", "employee_number": ""}),
            "empty employee number",
        ),
    ];

    for (body, description) in test_cases {
        let response = app.post_form("/convocatorias/register", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 when the payload had an {}",
            description
        );
    }
}

#[tokio::test]
async fn a_failed_confirmation_does_not_undo_the_registration() {
    let app = spawn_app().await;
    app.mock_email_api(500).await;

    let response = app.register_subscriber("Ana López", "ana@example.org").await;

    assert_is_redirect_to(&response, "/convocatorias");
    assert!(app.read_remote(SUBSCRIBERS_FILE).contains("ana@example.org"));
}

#[tokio::test]
async fn the_lookup_offers_the_registration_form_for_unknown_emails() {
    let app = spawn_app().await;

    let html = app.get_convocatorias_html("nadie@example.org").await;

    assert!(html.contains(r#"action="/convocatorias/register""#));
}

#[tokio::test]
async fn the_lookup_shows_active_subscriptions_with_an_unsubscribe_button() {
    let app = spawn_app().await;
    app.seed_remote(
        SUBSCRIBERS_FILE,
        "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
         2024-01-02,Ana López,ana@example.org,123,activo\n"
            .as_bytes(),
    );

    let html = app.get_convocatorias_html("ANA@example.org").await;

    assert!(html.contains("Tu suscripción está activa"));
    assert!(html.contains(r#"action="/convocatorias/unsubscribe""#));
}

#[tokio::test]
async fn the_lookup_offers_reactivation_for_inactive_subscriptions() {
    let app = spawn_app().await;
    app.seed_remote(
        SUBSCRIBERS_FILE,
        "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
         2024-01-02,Ana López,ana@example.org,123,Inactivo\n"
            .as_bytes(),
    );

    let html = app.get_convocatorias_html("ana@example.org").await;

    assert!(html.contains(r#"action="/convocatorias/reactivate""#));
}

#[tokio::test]
async fn unsubscribing_marks_the_row_inactive_and_confirms_by_email() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;
    app.seed_remote(
        SUBSCRIBERS_FILE,
        "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
         2024-01-02,Ana López,ana@example.org,123,Activo\n"
            .as_bytes(),
    );

    let response = app
        .post_form(
            "/convocatorias/unsubscribe",
            &serde_json::json!({"email": "ana@example.org"}),
        )
        .await;

    assert_is_redirect_to(&response, "/convocatorias");
    assert!(app
        .read_remote(SUBSCRIBERS_FILE)
        .contains("2024-01-02,Ana López,ana@example.org,123,Inactivo"));
    let emails = app.sent_emails().await;
    assert_eq!(emails[0]["Subject"], "Convocatorias - Confirmación de baja");
}

#[tokio::test]
async fn unsubscribing_an_unknown_email_returns_a_404() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/convocatorias/unsubscribe",
            &serde_json::json!({"email": "nadie@example.org"}),
        )
        .await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn reactivating_updates_the_row_and_writes_to_the_new_address() {
    let app = spawn_app().await;
    app.mock_email_api(200).await;
    app.seed_remote(
        SUBSCRIBERS_FILE,
        "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
         2024-01-02,Ana López,ana@example.org,123,Inactivo\n"
            .as_bytes(),
    );

    let response = app
        .post_form(
            "/convocatorias/reactivate",
            &serde_json::json!({
                "current_email": "ana@example.org",
                "name": "Ana María López",
                "email": "ana.maria@example.org",
                "employee_number": "456",
            }),
        )
        .await;

    assert_is_redirect_to(&response, "/convocatorias");
    let registry = app.read_remote(SUBSCRIBERS_FILE);
    assert!(registry.contains("Ana María López,ana.maria@example.org,456,Activo"));
    assert!(!registry.contains("ana@example.org"));
    let emails = app.sent_emails().await;
    assert_eq!(emails[0]["To"], "ana.maria@example.org");
    assert_eq!(
        emails[0]["Subject"],
        "Convocatorias - Actualización de datos y reactivación"
    );
}

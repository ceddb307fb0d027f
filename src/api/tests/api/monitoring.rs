use crate::helpers::{spawn_app, COUNTER_EMAIL, CORRECTIONS_FILE, SUBSCRIBERS_FILE};

#[tokio::test]
async fn the_dashboard_renders_with_empty_registries() {
    let app = spawn_app().await;

    let response = app.get("/monitoring").await;

    assert_eq!(200, response.status().as_u16());
    let html = response.text().await.unwrap();
    assert!(html.contains("Productividad"));
    assert!(html.contains("Sin registros."));
}

#[tokio::test]
async fn the_summary_counts_historic_requests_and_broadcasts() {
    // Arrange
    let app = spawn_app().await;
    app.seed_remote(
        CORRECTIONS_FILE,
        "Fecha,Nombre,Email,Número económico,Nombre del artículo,Servicios solicitados,Estado,Fecha terminación\n\
         2001-01-01 10:00:00,Ana,ana@example.org,1,a.docx,Parafraseo,Terminado,2001-02-01\n\
         2001-01-02 10:00:00,Luis,luis@example.org,2,b.docx,Parafraseo,terminado,\n\
         2001-01-03 10:00:00,Eva,eva@example.org,3,c.docx,Parafraseo,Activo,\n"
            .as_bytes(),
    );
    app.seed_remote(
        SUBSCRIBERS_FILE,
        format!(
            "Fecha,Nombre completo,Correo electronico,Numero economico,Estado\n\
             2001-01-02,Ana,ana@example.org,1,Activo\n\
             2001-01-03,Luis,luis@example.org,2,Inactivo\n\
             2001-01-04,CONVOCATORIA,{},7.0,Inactivo\n",
            COUNTER_EMAIL
        )
        .as_bytes(),
    );

    // Act
    let response = app.get("/monitoring/summary").await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let summary: serde_json::Value = response.json().await.unwrap();
    assert_eq!(summary["corrections"]["historic_total"], 3);
    assert_eq!(summary["corrections"]["window_total"], 0);
    assert_eq!(
        summary["corrections"]["historic_counts"][0],
        serde_json::json!({"label": "Terminado", "count": 2})
    );
    assert_eq!(
        summary["corrections"]["historic_counts"][1],
        serde_json::json!({"label": "En proceso", "count": 1})
    );
    assert_eq!(summary["convocatorias"]["historic_subscribers"], 2);
    assert_eq!(summary["convocatorias"]["active_subscribers"], 1);
    assert_eq!(summary["convocatorias"]["window_subscribers"], 0);
    assert_eq!(summary["convocatorias"]["broadcasts_sent"], 7);
}

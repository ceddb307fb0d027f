use crate::clock::InstitutionClock;
use crate::domain::correction_repository::CorrectionRepository;
use crate::domain::statistics::{
    ConvocatoriaStatistics, CorrectionStatistics, ProductivitySummary, StatusCount,
    ROLLING_WINDOW_DAYS,
};
use crate::domain::subscriber_repository::SubscriberRepository;
use crate::routes::page;
use crate::startup::CounterEmail;
use crate::utils::e500;
use actix_web::{web, HttpResponse};
use actix_web_flash_messages::IncomingFlashMessages;
use htmlescape::encode_minimal;

#[tracing::instrument(name = "Computing the productivity summary", skip_all)]
async fn productivity_summary(
    corrections: &dyn CorrectionRepository,
    subscribers: &dyn SubscriberRepository,
    counter: &CounterEmail,
    clock: &InstitutionClock,
) -> Result<ProductivitySummary, actix_web::Error> {
    let today = clock.today();
    let correction_snapshot = corrections.snapshot().await.map_err(e500)?;
    let subscriber_snapshot = subscribers.snapshot().await.map_err(e500)?;
    Ok(ProductivitySummary {
        generated_on: today,
        corrections: CorrectionStatistics::compute(&correction_snapshot, today),
        convocatorias: ConvocatoriaStatistics::compute(&subscriber_snapshot, &counter.0, today),
    })
}

fn status_table(counts: &[StatusCount]) -> String {
    if counts.is_empty() {
        return "<p>Sin registros.</p>".to_string();
    }
    let total: usize = counts.iter().map(|c| c.count).sum();
    let rows: String = counts
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                encode_minimal(&c.label),
                c.count
            )
        })
        .collect();
    format!(
        r#"<table>
        <tr><th>Estado</th><th>Cantidad</th></tr>
        {rows}<tr><td><b>Total</b></td><td><b>{total}</b></td></tr>
    </table>"#
    )
}

fn render_summary(summary: &ProductivitySummary) -> String {
    let corrections = &summary.corrections;
    let convocatorias = &summary.convocatorias;
    format!(
        r#"<p>Generado el {date}.</p>
    <h2>Corrección de artículos</h2>
    <h3>Últimos {days} días</h3>
    {window}
    <h3>Histórico</h3>
    {historic}
    <p>Total histórico de solicitudes: {historic_total}</p>
    <h2>Convocatorias</h2>
    <ul>
        <li>Suscriptores en los últimos {days} días: {window_subscribers}</li>
        <li>Suscriptores históricos: {historic_subscribers}</li>
        <li>Suscriptores activos: {active_subscribers}</li>
        <li>Convocatorias enviadas: {broadcasts_sent}</li>
    </ul>"#,
        date = summary.generated_on.format("%Y-%m-%d"),
        days = ROLLING_WINDOW_DAYS,
        window = status_table(&corrections.window_counts),
        historic = status_table(&corrections.historic_counts),
        historic_total = corrections.historic_total,
        window_subscribers = convocatorias.window_subscribers,
        historic_subscribers = convocatorias.historic_subscribers,
        active_subscribers = convocatorias.active_subscribers,
        broadcasts_sent = convocatorias.broadcasts_sent,
    )
}

pub async fn monitoring_dashboard(
    corrections: web::Data<dyn CorrectionRepository>,
    subscribers: web::Data<dyn SubscriberRepository>,
    counter: web::Data<CounterEmail>,
    clock: web::Data<InstitutionClock>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let summary = productivity_summary(
        corrections.get_ref(),
        subscribers.get_ref(),
        &counter,
        &clock,
    )
    .await?;
    Ok(page(
        "Productividad",
        &flash_messages,
        &render_summary(&summary),
    ))
}

pub async fn monitoring_summary(
    corrections: web::Data<dyn CorrectionRepository>,
    subscribers: web::Data<dyn SubscriberRepository>,
    counter: web::Data<CounterEmail>,
    clock: web::Data<InstitutionClock>,
) -> Result<HttpResponse, actix_web::Error> {
    let summary = productivity_summary(
        corrections.get_ref(),
        subscribers.get_ref(),
        &counter,
        &clock,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

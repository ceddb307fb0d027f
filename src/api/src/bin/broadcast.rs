//! Sends the current convocatoria PDF to every active subscriber, the same
//! way the admin page does, and exits. Meant for cron jobs.
use oasis::configuration::get_configuration;
use oasis::startup::Components;
use telemetry::{flush_tracer, get_subscriber, init_subscriber, init_tracer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration()?;

    let tracer = init_tracer(&configuration.telemetry);
    let subscriber = get_subscriber(
        format!("{}-broadcast", configuration.telemetry.dataset_name),
        "info".into(),
        std::io::stdout,
        &configuration.telemetry,
        &tracer,
    );
    init_subscriber(subscriber);

    let components = Components::build(&configuration)?;
    let outcome = components.broadcaster().run().await;
    match &outcome {
        Ok(report) => tracing::info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            success_rate = report.success_rate(),
            "Broadcast finished"
        ),
        Err(e) => tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Broadcast failed"
        ),
    }

    flush_tracer(&tracer);
    outcome?;
    Ok(())
}

use appointment_desk::{
    configuration::get_configuration,
    startup,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = get_configuration()?;

    let subscriber = get_subscriber(
        "appointment-desk".into(),
        settings.telemetry.filter.clone(),
        settings.telemetry.otlp_endpoint.as_deref(),
        std::io::stdout,
    )?;
    init_subscriber(subscriber)?;

    let result = startup::run(settings).await;
    opentelemetry::global::shutdown_tracer_provider();
    result
}

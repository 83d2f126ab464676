use registration_backend::{settings as backend_settings, startup, telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let settings = backend_settings::get_settings()
        .map_err(|e| std::io::Error::other(format!("Failed to read settings: {}", e)))?;

    let _guard = telemetry::init_subscriber(settings.debug).map_err(std::io::Error::other)?;

    let application = startup::Application::build(settings).await?;

    tracing::event!(target: "backend", tracing::Level::INFO, "Listening on http://127.0.0.1:{}/", application.port());

    application.run_until_stopped().await?;
    Ok(())
}

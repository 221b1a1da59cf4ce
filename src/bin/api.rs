use fitcoach_plan_builder::{
    api::{start_server, ApiState},
    config::CoachConfig,
    CoachServices,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = CoachConfig::from_env()?;
    if !config.has_api_key() {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
        eprintln!("📌 Plans will use the offline fallback and advice will be unavailable");
    }

    info!("🚀 FitCoach Plan Builder - API Server");
    info!("📍 Port: {}", config.api_port);
    info!("🤖 Model: {}", config.gemini_model);

    let services = CoachServices::from_config(&config)?;
    let state = ApiState::with_idle_timeout(services, config.session_idle_timeout());

    info!("📡 Starting API server...");
    start_server(state, config.api_port).await?;

    Ok(())
}

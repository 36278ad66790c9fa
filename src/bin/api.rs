use beacon_realty_agent::{
    api::{start_server, ApiState},
    budget::BudgetTracker,
    catalog::PropertyCatalog,
    config::AppConfig,
    dispatcher::ModelDispatcher,
    leads::build_lead_store,
    llm::OpenAiClient,
    session::{InMemorySessionStore, SessionStore},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load .env and the process environment
    let config = AppConfig::from_env()?;

    if !config.llm.has_api_key() {
        warn!("OPENAI_API_KEY not set; chat replies will fall back to the unavailable message");
    }

    info!("Beacon Realty Agent - API Server");
    info!("Port: {}", config.port);

    // Create components
    let catalog = match &config.property_data_file {
        Some(path) => PropertyCatalog::from_json_file(path)?,
        None => PropertyCatalog::seeded(),
    };
    info!("Property catalog ready with {} properties", catalog.len());

    let client = Arc::new(OpenAiClient::new(&config.llm)?);
    let budget = BudgetTracker::new(config.max_budget_dollars);
    let dispatcher = ModelDispatcher::new(client, budget, &config.llm);
    info!(
        "Dispatcher using {} (fallback {}), budget ${:.2} per conversation",
        config.llm.primary_model, config.llm.fallback_model, config.max_budget_dollars
    );

    let sessions = Arc::new(InMemorySessionStore::new(config.session_ttl));
    spawn_session_sweeper(sessions.clone());

    let state = ApiState {
        catalog: Arc::new(catalog),
        sessions,
        dispatcher: Arc::new(dispatcher),
        leads: build_lead_store(config.database_url.as_deref()),
    };

    info!("Starting API server...");

    // Start API server
    start_server(state, config.port).await?;

    Ok(())
}

/// Drop idle sessions once a minute
fn spawn_session_sweeper(sessions: Arc<InMemorySessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(dropped) => debug!("Purged {} expired sessions", dropped),
                Err(e) => warn!("Session purge failed: {}", e),
            }
        }
    });
}

use beacon_realty_agent::{
    budget::BudgetTracker,
    config::AppConfig,
    dispatcher::{DispatchOutcome, ModelDispatcher},
    extractor::PreferenceExtractor,
    llm::OpenAiClient,
    models::ConversationState,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const GREETING: &str = "Hi, I'm Beacon, your NYC real estate investment advisor. What kind of property investment are you thinking about?";

fn is_exit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit" | "bye")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    if !config.llm.has_api_key() {
        eprintln!("OPENAI_API_KEY is not set. Add it to .env to chat with Beacon.");
        return Ok(());
    }

    let client = Arc::new(OpenAiClient::new(&config.llm)?);
    let dispatcher = ModelDispatcher::new(
        client,
        BudgetTracker::new(config.max_budget_dollars),
        &config.llm,
    );
    info!("Terminal chat using {}", dispatcher.primary_model());

    let mut state = ConversationState::new();
    println!("Beacon: {}", GREETING);
    println!("(type 'exit' to leave)\n");

    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if is_exit(message) {
            println!("Beacon: Thanks for chatting. Good luck with your investment search!");
            break;
        }

        let extracted = PreferenceExtractor::apply(&mut state.collected_info, message);
        if !extracted.is_empty() {
            debug!("Extracted preferences: {:?}", extracted);
        }

        let outcome = dispatcher.dispatch(&mut state, message).await;
        println!("\nBeacon: {}\n", outcome.message());

        if let DispatchOutcome::OverBudget { .. } = outcome {
            break;
        }
    }

    println!(
        "Conversation used {} input / {} output tokens (${:.4}).",
        state.token_count.input, state.token_count.output, state.cost
    );
    if !state.collected_info.is_empty() {
        println!("Collected preferences: {}", serde_json::to_string_pretty(&state.collected_info)?);
    }

    Ok(())
}

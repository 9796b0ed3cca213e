//! Trip Scout terminal chat demo.
//!
//! Wires the discovery service to the configured model provider (or the
//! mock when no API key is set) and runs the interview over stdin/stdout.
//! Type `sair` or `quit` to end the chat and see the collected data plus
//! flight offers for the recommended trip.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use trip_scout::adapters::{
    AnthropicConfig, AnthropicModelClient, InMemorySessionStore, MockFlightSearch,
    MockModelClient,
};
use trip_scout::application::DiscoveryService;
use trip_scout::config::AppConfig;
use trip_scout::domain::foundation::UserId;
use trip_scout::ports::ModelClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    config.validate()?;

    let model: Arc<dyn ModelClient> = match &config.model.api_key {
        Some(key) if config.model.has_api_key() => {
            let anthropic_config =
                AnthropicConfig::new(secrecy::ExposeSecret::expose_secret(key).clone())
                    .with_model(config.model.model.clone())
                    .with_base_url(config.model.base_url.clone())
                    .with_timeout(config.model.timeout());
            Arc::new(AnthropicModelClient::new(anthropic_config)?)
        }
        _ => {
            tracing::warn!("no TRIP_SCOUT__MODEL__API_KEY set, using the mock model");
            Arc::new(MockModelClient::new())
        }
    };

    tracing::info!(model = ?model.model_info(), "trip-scout starting");

    let trip_duration_days = config.discovery.default_trip_duration_days;
    let service = DiscoveryService::new(
        Arc::new(InMemorySessionStore::new()),
        model,
        Arc::new(MockFlightSearch::new()),
        config.discovery.clone(),
    );

    let user = UserId::new(whoami())?;
    let session_id = service.start_session(user, None).await?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all("Trip Scout: where are you traveling from?\n> ".as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }

        if matches!(text.to_lowercase().as_str(), "sair" | "quit" | "exit") {
            break;
        }

        match service.process_message(&session_id, text).await {
            Ok(outcome) => {
                let line = format!(
                    "\n[{}] {}\n> ",
                    outcome.stage.label(),
                    outcome.assistant_message
                );
                stdout.write_all(line.as_bytes()).await?;
                stdout.flush().await?;

                if outcome.is_final_recommendation {
                    break;
                }
            }
            Err(err) => {
                tracing::error!(%err, "turn failed");
                stdout
                    .write_all(format!("\nerror: {err}\n> ").as_bytes())
                    .await?;
                stdout.flush().await?;
            }
        }
    }

    if let Some(offers) = service.search_flights(&session_id, trip_duration_days).await? {
        stdout.write_all(b"\nFlights for your trip:\n").await?;
        for offer in offers {
            let line = format!(
                "  {} {} - {:.2} {}\n",
                offer.carrier, offer.id, offer.price_total, offer.currency
            );
            stdout.write_all(line.as_bytes()).await?;
        }
    }

    let data = service.end_session(&session_id).await?;
    let summary = serde_json::to_string_pretty(&data)?;
    stdout
        .write_all(format!("\nCollected trip data:\n{summary}\n").as_bytes())
        .await?;
    stdout.flush().await?;

    Ok(())
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "traveler".to_string())
}

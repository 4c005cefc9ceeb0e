//! Analyze demo binary
//!
//! Submits text to the Dymis analysis service and renders the lifecycle as
//! it changes.
//!
//! ```text
//! DYMIS_API_KEY=... cargo run --bin analyze -- "Text to check"
//! echo "Text to check" | cargo run --bin analyze
//! ```

use dymis_client::{AnalysisClient, ClientConfig};
use dymis_core::AnalysisResult;
use dymis_lifecycle::{LifecycleState, LifecycleStore, Phase};
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analyze=info,dymis_client=warn,dymis_lifecycle=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = match ClientConfig::from_env().and_then(AnalysisClient::new) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        },
    };

    let content = match read_content() {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read content from stdin");
            return ExitCode::from(2);
        },
    };

    if client.check_health().await {
        tracing::info!(base_url = %client.config().base_url, "Backend is reachable");
    } else {
        tracing::warn!(base_url = %client.config().base_url, "Backend health check failed, trying anyway");
    }

    let store = LifecycleStore::new(client);
    let subscription = store.subscribe(render);

    let state = store.analyze(content).await;
    subscription.unsubscribe();

    if state.phase() == Phase::Succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Content from the command line, or stdin when no arguments are given
fn read_content() -> std::io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

fn render(state: &LifecycleState) {
    match state.phase() {
        Phase::Idle => {},
        Phase::Loading => println!("Analyzing..."),
        Phase::Failed => println!("Error: {}", state.error().unwrap_or_default()),
        Phase::Succeeded => {
            if let Some(results) = state.results() {
                print_results(results);
            }
        },
    }
}

fn print_results(results: &AnalysisResult) {
    println!("\nTrust score: {}", results.trust_score);
    println!("Summary: {}", results.result_summary);

    if results.educational_breakdown.is_empty() {
        return;
    }

    println!("\nWhat to look out for:");
    for (index, item) in results.educational_breakdown.iter().enumerate() {
        println!("  {}. {}", index + 1, item.title);
        println!("     {}", item.explanation);
        if !item.quote.is_empty() {
            println!("     \"{}\"", item.quote);
        }
    }
}

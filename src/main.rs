use std::env;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use owm_geocode_rs::{GeocodeClient, LookupOutcome, found_records};

/// Batch resolved when the binary is invoked without arguments
const EXAMPLE_LOCATIONS: [&str; 4] = ["Savannah, GA", "31419", "Charlotte, NC", "28277"];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "owm_geocode_rs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();

    // Each argument is one location; bare invocation runs the example batch
    let locations: Vec<String> = if args.len() > 1 {
        args[1..]
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        EXAMPLE_LOCATIONS.iter().map(|s| s.to_string()).collect()
    };

    if locations.is_empty() {
        eprintln!("Usage: {} [location ...]", args[0]);
        eprintln!("  location: \"City, State\" or a five-digit ZIP code");
        std::process::exit(1);
    }

    let client = GeocodeClient::from_env()?;

    println!("Resolving {} location(s)...", locations.len());
    let resolved = client.resolve_many(&locations).await;

    let records = found_records(&resolved);
    println!("\nLocation Results:");
    for record in &records {
        println!("  {}", record);
    }

    // Report the entries that did not make it into the aggregate
    if records.len() < resolved.len() {
        println!();
        for entry in &resolved {
            match &entry.outcome {
                LookupOutcome::Found(_) => {}
                LookupOutcome::NotFound => println!("No results found for: {}", entry.query),
                LookupOutcome::Failed(e) => {
                    println!("Error fetching data for {}: {}", entry.query, e)
                }
            }
        }
    }

    Ok(())
}

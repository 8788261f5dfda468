use anyhow::Result;
use owm_geocode_rs::{GeocodeClient, LookupOutcome, found_records};

#[tokio::main]
async fn main() -> Result<()> {
    let client = GeocodeClient::from_env()?;

    let locations: Vec<String> = ["Savannah, GA", "31419", "Charlotte, NC", "28277"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    println!("Resolving {} location(s)...", locations.len());
    let resolved = client.resolve_many(&locations).await;

    for entry in &resolved {
        println!("\nQuery: {} ({} path)", entry.query, entry.path);
        match &entry.outcome {
            LookupOutcome::Found(record) => {
                println!("  Name: {}", record.name);
                println!("  State: {}", record.state);
                println!("  Country: {}", record.country);
                println!("  Coordinates: {}, {}", record.latitude, record.longitude);
            }
            LookupOutcome::NotFound => println!("  No results found"),
            LookupOutcome::Failed(e) => println!("  Failed: {}", e),
        }
    }

    let records = found_records(&resolved);
    println!(
        "\nResolved {} of {} location(s)",
        records.len(),
        resolved.len()
    );

    Ok(())
}

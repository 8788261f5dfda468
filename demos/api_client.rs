/// Example HTTP client demonstrating how to call the geocoding HTTP server API
///
/// Run the server first:
/// ```bash
/// cargo run --bin server
/// ```
///
/// Then run this example:
/// ```bash
/// cargo run --example api_client
/// ```
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeocodeRequest {
    location: String,
}

#[derive(Serialize)]
struct BatchGeocodeRequest {
    locations: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct GeocodeResponse {
    success: bool,
    data: LocationData,
}

#[derive(Deserialize, Debug)]
struct BatchGeocodeResponse {
    success: bool,
    results: Vec<BatchEntry>,
}

#[derive(Deserialize, Debug)]
struct BatchEntry {
    query: String,
    path: String,
    status: String,
    data: Option<LocationData>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LocationData {
    name: String,
    state: String,
    country: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize, Debug)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Deserialize, Debug)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = reqwest::Client::new();

    println!("=== Geocoding HTTP API Client Demo ===\n");

    // 1. Health Check
    println!("1. Checking server health...");
    let health_url = format!("{}/health", base_url);
    let health: HealthResponse = client.get(&health_url).send().await?.json().await?;
    println!("   Server status: {}", health.status);
    println!("   Version: {}\n", health.version);

    // 2. Resolve Single Location
    println!("2. Resolving single location...");
    let geocode_url = format!("{}/api/geocode", base_url);
    let request = GeocodeRequest {
        location: "Savannah, GA".to_string(),
    };

    match client.post(&geocode_url).json(&request).send().await {
        Ok(response) => {
            if response.status().is_success() {
                let result: GeocodeResponse = response.json().await?;
                println!("   Name: {}", result.data.name);
                println!("   State: {}", result.data.state);
                println!("   Country: {}", result.data.country);
                println!(
                    "   Coordinates: {}, {}\n",
                    result.data.latitude, result.data.longitude
                );
            } else {
                let error_text = response.text().await?;
                println!("   Error: {}\n", error_text);
            }
        }
        Err(e) => {
            println!("   Request failed: {}\n", e);
        }
    }

    // 3. Resolve Multiple Locations (Batch)
    println!("3. Resolving multiple locations (batch)...");
    let batch_url = format!("{}/api/geocode/batch", base_url);
    let batch_request = BatchGeocodeRequest {
        locations: vec![
            "Savannah, GA".to_string(),
            "31419".to_string(),
            "Charlotte, NC".to_string(),
            "28277".to_string(),
        ],
    };

    match client.post(&batch_url).json(&batch_request).send().await {
        Ok(response) => {
            if response.status().is_success() {
                let result: BatchGeocodeResponse = response.json().await?;
                println!("   Resolved {} entries:", result.results.len());
                for (i, entry) in result.results.iter().enumerate() {
                    match (&entry.data, &entry.error) {
                        (Some(data), _) => println!(
                            "   [{}] {} ({} path) -> {}, {} ({}, {})",
                            i + 1,
                            entry.query,
                            entry.path,
                            data.name,
                            data.state,
                            data.latitude,
                            data.longitude
                        ),
                        (None, Some(error)) => {
                            println!("   [{}] {} -> error: {}", i + 1, entry.query, error)
                        }
                        (None, None) => {
                            println!("   [{}] {} -> {}", i + 1, entry.query, entry.status)
                        }
                    }
                }
                println!();
            } else {
                let error_text = response.text().await?;
                println!("   Error: {}\n", error_text);
            }
        }
        Err(e) => {
            println!("   Request failed: {}\n", e);
        }
    }

    // 4. Get Metrics
    println!("4. Getting server metrics...");
    let metrics_url = format!("{}/api/metrics", base_url);
    let metrics: MetricsResponse = client.get(&metrics_url).send().await?.json().await?;
    println!("   Total requests: {}", metrics.total_requests);
    println!("   Requests in flight: {}", metrics.requests_in_flight);
    println!("   Uptime: {} seconds\n", metrics.uptime_seconds);

    println!("=== Demo Complete ===");

    Ok(())
}

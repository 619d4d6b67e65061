//! Dashboard API Server Binary
//!
//! Run with: `cargo run --bin analytics-server`

use nextride::{init_tracing, run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level:
    //   RUST_LOG=debug cargo run --bin analytics-server
    //   RUST_LOG=nextride::segmentation=debug cargo run --bin analytics-server
    init_tracing();

    // HOST, PORT, DATA_SOURCE, ANALYTICS_SEED, QUERY_TIMEOUT_SECS
    let config = ServerConfig::from_env();

    println!("Starting NextRide Analytics API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Source: {}", config.source);
    println!("   Seed: {}", config.seed);
    println!("   Query timeout: {}s", config.query_timeout.as_secs());
    println!();
    println!("Server will be available at: http://{}", config.address());
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                        - Health check");
    println!("  GET  /api/kpis                      - Revenue, tickets, customers");
    println!("  GET  /api/top-routes                - Ten most purchased routes");
    println!("  GET  /api/seasonality               - Revenue per month");
    println!("  GET  /api/hubs                      - Top hub cities by centrality");
    println!("  GET  /api/hub_details               - Hub in/out degree");
    println!("  GET  /api/clusters                  - Customer segments");
    println!("  GET  /api/segment_distribution      - Customers per persona");
    println!("  GET  /api/new_customers_over_time   - First purchases per month");
    println!();

    run_server(config).await?;

    Ok(())
}

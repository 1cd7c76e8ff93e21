use serde_json::json;
use tokio::time::{sleep, Duration};

use throttled_log_sink::init::init_tracing;
use throttled_log_sink::{Logger, LoggerConfig, Severity};

#[tokio::main]
async fn main() {
    let config = LoggerConfig {
        level: Severity::Info,
        base_url: "https://api.eu.axiom.co".to_string(),
        token: Some("xaat-your-token".to_string()),
        dataset: Some("backend".to_string()),
        server_id: Some("api-1".to_string()),
        ..Default::default()
    };
    let logger = Logger::server(config);

    // Plain `tracing` macros are shipped as well.
    if let Err(e) = init_tracing(logger.clone()) {
        eprintln!("tracing already initialised: {}", e);
    }

    logger.info("starting service", &[json!({"version": env!("CARGO_PKG_VERSION")})]);
    tracing::error!(user_id = 42, reason = "invalid password", "authentication failed");

    sleep(Duration::from_millis(1500)).await;
    println!("{:?}", logger.flush_now().await);
    println!("{:?}", logger.stats());
}

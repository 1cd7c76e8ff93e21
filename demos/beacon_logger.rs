use serde_json::json;

use throttled_log_sink::{Logger, LoggerConfig, Origin};

#[tokio::main]
async fn main() {
    let config = LoggerConfig {
        base_url: "http://127.0.0.1:3000".to_string(),
        proxy_path: "/log".to_string(),
        origin: Origin::Client,
        ..Default::default()
    };
    let logger = Logger::client(config);

    logger.info("page view", &[json!({"path": "/checkout"}), json!({"user": "u-17"})]);
    logger.warn("slow render", &[json!({"ms": 950})]);

    // Sends run in the background; flush_now waits for them before exit.
    let outcome = logger.flush_now().await;
    println!("flush: {:?}", outcome);
    println!("{:?}", logger.stats());
}

use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use throttled_log_sink::noop_transport::NoopTransport;
use throttled_log_sink::{Logger, LoggerConfig};

#[tokio::main]
async fn main() {
    let logger = Logger::new(LoggerConfig::default(), Arc::new(NoopTransport));

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.error(format!("load test error {}", i), &[]);
    }

    let elapsed = start.elapsed();
    println!(
        "emitted {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Let the throttled flush run once.
    sleep(Duration::from_millis(1200)).await;
    println!("{:?}", logger.stats());
}

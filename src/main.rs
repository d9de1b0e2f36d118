use std::env;

use log::{debug, info, warn};

use queue_stress::{config::RunConfig, driver::Driver, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::prelude::*;
        tracing_subscriber::registry()
            .with(console_subscriber::spawn())
            .init();
    }

    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info");
    env_logger::init_from_env(env);

    let mut config = RunConfig::from_env()?;
    if let Some(url) = env::args().nth(1) {
        config = config.with_base_url(url);
    }

    let json = env::var("STRESS_REPORT").map_or(false, |v| v.eq_ignore_ascii_case("json"));

    let driver = Driver::http(config)?;
    let report = driver.run().await;

    if !report.has_samples() {
        info!("No samples collected, nothing to report");
    } else if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    match metrics::render() {
        Ok(text) => debug!("Final metrics:\n{}", text),
        Err(e) => warn!("Failed to render metrics: {}", e),
    }

    Ok(())
}

use anyhow::Context;
use kronos_loadgen::stats::install_recorder;
use kronos_loadgen::{Config, HttpTransport, ProfileCatalog, Runner};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the run completed but a threshold was crossed
const THRESHOLDS_CROSSED: u8 = 99;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kronos_loadgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = Config::from_env();
    info!(
        "Loaded configuration: base_url={}, test_type={}, report_path={:?}",
        config.base_url, config.test_type, config.report_path
    );

    // Install the Prometheus recorder before any metrics are recorded
    let metrics_handle = install_recorder(config.metrics_addr)
        .context("failed to install Prometheus recorder")?;
    if let Some(addr) = config.metrics_addr {
        info!("Serving Prometheus metrics on {}", addr);
    }

    let catalog = ProfileCatalog::builtin()?;
    let profile = catalog.get(&config.test_type)?;

    let transport = HttpTransport::new(&config.base_url, config.request_timeout)
        .with_context(|| format!("invalid BASE_URL {:?}", config.base_url))?;

    let runner = Runner::new(config.run_options());

    // Ctrl-C stops the scheduler; users finish their in-flight request
    let state = runner.state();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping run");
            state.stop();
        }
    });

    let report = runner.run(profile, Arc::new(transport)).await?;

    println!("{}", report.render_text());

    match report.write_json(&config.report_path) {
        Ok(()) => info!("Report written to {:?}", config.report_path),
        Err(e) => error!(
            "Failed to write report to {:?}: {}",
            config.report_path, e
        ),
    }

    if let Some(handle) = metrics_handle {
        debug!("Final metrics:\n{}", handle.render());
    }

    if report.passed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(THRESHOLDS_CROSSED))
    }
}

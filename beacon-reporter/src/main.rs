//! beacon-reporter: device agent for a beacon relay
//!
//! Every `interval_secs` it samples boot time, network state and the
//! configured position, and POSTs the result to the relay's `/update`.
//! A failed report is logged and the next tick tries again.

mod collect;

use std::future::Future;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use beacon_core::config::ReporterConfig;
use beacon_core::{Config, RelayClient, UpdateResponse};

use crate::collect::DeviceStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "beacon_reporter=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    let reporter = config.reporter;
    if !reporter.enabled {
        tracing::info!("Reporting disabled in config");
        return Ok(());
    }

    let device_id = collect::resolve_device_id(&reporter);
    let client = RelayClient::new(&config.client.server_url);
    tracing::info!(
        "Reporting as {} to {} every {}s",
        device_id,
        client.base_url(),
        reporter.interval_secs
    );

    run(&client, &device_id, &reporter, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    tracing::info!("Stopping reporter");
    Ok(())
}

/// Report on every tick until `shutdown` resolves, even mid-push
async fn run<F>(client: &RelayClient, device_id: &str, config: &ReporterConfig, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut ticker = interval(Duration::from_secs(config.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => return,
        }

        tokio::select! {
            _ = report_once(client, device_id, config) => {}
            _ = &mut shutdown => return,
        }
    }
}

/// Sample and push one report
async fn report_once(client: &RelayClient, device_id: &str, config: &ReporterConfig) {
    let request = DeviceStatus::sample(device_id, config).into_request();

    match client.push_update(&request).await {
        Ok(UpdateResponse::Ok) => tracing::debug!("Report accepted"),
        Ok(UpdateResponse::Error { message }) => tracing::warn!("Report rejected: {}", message),
        Err(e) => tracing::warn!("Report failed: {}", e),
    }
}

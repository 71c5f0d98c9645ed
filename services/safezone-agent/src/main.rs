mod source;

use safezone_backend::BackendClient;
use safezone_config::{BackendConfig, MonitorConfig, ServiceConfig};
use safezone_core::{ErrorCode, ZoneError};
use safezone_monitor::{MonitorEvent, ZoneMonitor, ZoneTracker};
use safezone_observability::{ObservabilityConfig, init, log_startup};
use safezone_store::{LeaveZoneNotifier, StoreError, ZoneStore};
use source::JsonLinesSource;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
enum AgentError {
    #[error("zone backend: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Zone(#[from] ZoneError),
}

impl AgentError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Store(_) => ErrorCode::Upstream,
            Self::Zone(err) => err.code(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServiceConfig::from_env("safezone-agent");
    let obs_config = ObservabilityConfig::from(&config);
    let handle = init(&obs_config);
    log_startup(&handle, &obs_config.environment);

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, code = ?err.code(), "safezone agent stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AgentError> {
    let backend = Arc::new(BackendClient::from_config(&BackendConfig::from_env())?);
    let assignment = backend.assignment();
    info!(
        caregiver_id = %assignment.caregiver_id,
        patient_id = %assignment.patient_id,
        "loading safe zones"
    );

    let zones = backend.fetch().await?;
    for zone in &zones {
        if let Some(center) = zone.bounding_box().map(|range| range.center()) {
            info!(
                zone_id = %zone.id,
                points = zone.points.len(),
                center_latitude = center.latitude,
                center_longitude = center.longitude,
                "safe zone loaded"
            );
        }
    }

    let notifier: Arc<dyn LeaveZoneNotifier> = backend.clone();
    let mut monitor = ZoneMonitor::spawn(
        JsonLinesSource::stdin(),
        ZoneTracker::new(zones),
        notifier,
        &MonitorConfig::from_env(),
    )
    .await?;

    let mut events = monitor.subscribe();
    let alerts = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MonitorEvent::LeftZone { fix }) => warn!(
                    latitude = fix.coordinate.latitude,
                    longitude = fix.coordinate.longitude,
                    timestamp_ms = fix.timestamp_ms,
                    "patient has left the safe zone"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "alert listener fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let interrupted = tokio::select! {
        _ = signal::ctrl_c() => true,
        _ = monitor.wait() => false,
    };
    if interrupted {
        info!("interrupt received, stopping zone monitor");
        monitor.stop().await;
    } else {
        info!("location input exhausted");
        drop(monitor);
    }

    if let Err(err) = alerts.await {
        warn!(error = %err, "alert listener failed");
    }
    Ok(())
}

use metrics::{Unit, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use safezone_config::ServiceConfig;
use safezone_core::metric_names;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

impl From<&ServiceConfig> for ObservabilityConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            environment: config.environment.to_string(),
            log_level: config.log_level.clone(),
            metrics_addr: config.metrics_addr.clone(),
        }
    }
}

/// What [`init`] actually managed to set up.
#[derive(Debug, Clone)]
pub struct ObservabilityHandle {
    pub service_name: String,
    pub metrics_addr: Option<SocketAddr>,
}

/// Installs the global log subscriber and, when an address is configured,
/// the Prometheus scrape endpoint. Safe to call more than once; only the
/// first subscriber wins.
pub fn init(config: &ObservabilityConfig) -> ObservabilityHandle {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let metrics_addr = config
        .metrics_addr
        .as_deref()
        .and_then(|addr| install_exporter(config, addr));
    if metrics_addr.is_some() {
        describe_metrics();
    }

    ObservabilityHandle {
        service_name: config.service_name.clone(),
        metrics_addr,
    }
}

pub fn log_startup(handle: &ObservabilityHandle, environment: &str) {
    match handle.metrics_addr {
        Some(addr) => tracing::info!(
            service = %handle.service_name,
            environment,
            metrics_addr = %addr,
            "safezone service starting"
        ),
        None => tracing::info!(
            service = %handle.service_name,
            environment,
            "safezone service starting without metrics"
        ),
    }
}

fn describe_metrics() {
    describe_counter!(
        metric_names::ZONES_COMMITTED,
        Unit::Count,
        "Zones accepted by the backend"
    );
    describe_counter!(
        metric_names::ZONE_EDITS_REJECTED,
        Unit::Count,
        "Zone edits rejected by validation or persistence"
    );
    describe_counter!(
        metric_names::FIXES_PROCESSED,
        Unit::Count,
        "Location fixes checked against the safe zones"
    );
    describe_counter!(
        metric_names::ZONE_EXITS,
        Unit::Count,
        "Inside to outside transitions"
    );
    describe_counter!(
        metric_names::NOTIFICATIONS_FAILED,
        Unit::Count,
        "Leave-zone notifications that could not be delivered"
    );
}

fn install_exporter(config: &ObservabilityConfig, addr: &str) -> Option<SocketAddr> {
    let addr: SocketAddr = match addr.parse() {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(addr, error = %err, "ignoring unparseable SAFEZONE_METRICS_ADDR");
            return None;
        }
    };

    let installed = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", config.service_name.clone())
        .add_global_label("environment", config.environment.clone())
        .install();
    if let Err(err) = installed {
        tracing::warn!(%addr, error = %err, "metrics exporter not started");
        return None;
    }
    Some(addr)
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::{env, fmt};

/// Deployment the agent reports under. Field trials run as `pilot`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Local,
    Pilot,
    Prod,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Pilot => "pilot",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" => Ok(Self::Local),
            "pilot" | "trial" => Ok(Self::Pilot),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by every safezone process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub environment: Environment,
    pub log_level: String,
    pub metrics_addr: Option<String>,
}

impl ServiceConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, |key| env::var(key).ok())
    }

    pub fn from_lookup(
        default_service_name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let vars = Vars(lookup);
        Self {
            service_name: vars.string("SAFEZONE_SERVICE_NAME", default_service_name),
            environment: vars
                .optional("SAFEZONE_ENV")
                .and_then(|value| value.parse().ok())
                .unwrap_or_default(),
            log_level: vars.string("SAFEZONE_LOG_LEVEL", "info"),
            metrics_addr: vars.optional("SAFEZONE_METRICS_ADDR"),
        }
    }
}

/// Where zones are stored and which caregiver/patient pair they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub caregiver_id: String,
    pub patient_id: String,
    pub request_timeout_ms: u64,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        Self {
            base_url: vars.string("SAFEZONE_BACKEND_URL", "http://127.0.0.1:5000"),
            caregiver_id: vars.string("SAFEZONE_CAREGIVER_ID", "caregiver-123"),
            patient_id: vars.string("SAFEZONE_PATIENT_ID", "patient-456"),
            request_timeout_ms: vars.u64("SAFEZONE_REQUEST_TIMEOUT_MS", 10_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Capacity of the leave-zone event channel handed to subscribers.
    pub event_buffer: usize,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        Self {
            event_buffer: vars.usize("SAFEZONE_EVENT_BUFFER", 16).max(1),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { event_buffer: 16 }
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.optional(key)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(default)
    }

    fn usize(&self, key: &str, default: usize) -> usize {
        self.optional(key)
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(default)
    }
}

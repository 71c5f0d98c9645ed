mod wire;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use safezone_config::BackendConfig;
use safezone_core::{Assignment, CaregiverId, LocationFix, PatientId, Zone, ZoneRecord};
use safezone_store::{LeaveZoneNotifier, StoreError, ZoneStore};
use std::time::Duration;
use tracing::debug;

pub use wire::{BackendReply, LeaveZoneNotice, ZoneSubmission};

const ASSIGN_PATH: &str = "assign_coordinates";
const FETCH_PATH: &str = "get_coordinate";
const LEAVE_ZONE_PATH: &str = "DangerZone";

#[derive(Debug)]
struct ApiError {
    message: String,
}

impl ApiError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ApiError> for StoreError {
    fn from(error: ApiError) -> Self {
        StoreError::new(error.message)
    }
}

/// HTTP client for the zone backend, bound to one caregiver/patient pair.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    assignment: Assignment,
}

impl BackendClient {
    pub fn new(base: &str, assignment: Assignment, timeout: Duration) -> Result<Self, StoreError> {
        let base = format!("{}/", base.trim_end_matches('/'));
        let base_url = Url::parse(&base).map_err(|err| StoreError::new(err.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::new(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            assignment,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, StoreError> {
        let assignment = Assignment::new(
            CaregiverId::new(config.caregiver_id.as_str()),
            PatientId::new(config.patient_id.as_str()),
        );
        Self::new(
            &config.base_url,
            assignment,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::new(err.to_string()))
    }

    async fn submit_record(&self, record: &ZoneRecord) -> Result<(), ApiError> {
        let url = self.endpoint(ASSIGN_PATH)?;
        let body = ZoneSubmission {
            caregiver_id: &self.assignment.caregiver_id,
            patient_id: &self.assignment.patient_id,
            zones: vec![record],
        };
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        // Failure replies usually carry a message, but not always as JSON.
        let reply = response.json::<BackendReply>().await.ok();
        match reply {
            Some(reply) if status.is_success() && reply.is_success() => Ok(()),
            Some(reply) => Err(ApiError::new(format!(
                "zone submission rejected with {status} ({})",
                reply.describe()
            ))),
            None => Err(ApiError::new(format!(
                "zone submission failed with {status}"
            ))),
        }
    }

    async fn fetch_records(&self) -> Result<Vec<Zone>, ApiError> {
        let url = self.endpoint(FETCH_PATH)?;
        let response = self
            .client
            .get(url)
            .query(&[
                ("caregiver_id", self.assignment.caregiver_id.as_str()),
                ("patient_id", self.assignment.patient_id.as_str()),
            ])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                patient_id = %self.assignment.patient_id,
                "no zones assigned"
            );
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(ApiError::new(format!(
                "zone request failed with {}",
                response.status()
            )));
        }
        let reply = response.json::<BackendReply>().await?;
        if !reply.is_success() {
            return Err(ApiError::new(format!(
                "zone request rejected ({})",
                reply.describe()
            )));
        }
        Ok(reply.zone.into_iter().map(Zone::from_record).collect())
    }

    async fn post_leave_zone(&self, fix: &LocationFix) -> Result<(), ApiError> {
        let url = self.endpoint(LEAVE_ZONE_PATH)?;
        let body = LeaveZoneNotice {
            patient_id: &self.assignment.patient_id,
            caregiver_id: &self.assignment.caregiver_id,
            location: fix.coordinate,
            timestamp_ms: fix.timestamp_ms,
        };
        let response = self.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::new(format!(
                "leave-zone notification failed with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ZoneStore for BackendClient {
    async fn submit(&self, record: &ZoneRecord) -> Result<(), StoreError> {
        Ok(self.submit_record(record).await?)
    }

    async fn fetch(&self) -> Result<Vec<Zone>, StoreError> {
        Ok(self.fetch_records().await?)
    }
}

#[async_trait]
impl LeaveZoneNotifier for BackendClient {
    async fn notify_left_zone(&self, fix: &LocationFix) -> Result<(), StoreError> {
        Ok(self.post_leave_zone(fix).await?)
    }
}

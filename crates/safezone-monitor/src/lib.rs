//! Live safe-zone monitoring.
//!
//! A [`ZoneMonitor`] consumes location fixes from an injected
//! [`LocationSource`], runs them through a [`ZoneTracker`] one at a time and
//! raises a [`MonitorEvent::LeftZone`] the moment the subject walks out of
//! every zone. Coming back in is tracked but not announced.

mod tracker;

use async_trait::async_trait;
use metrics::counter;
use safezone_config::MonitorConfig;
use safezone_core::{LocationFix, ZoneError, ZoneResult, metric_names};
use safezone_store::LeaveZoneNotifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

pub use tracker::{ZoneTracker, ZoneTransition};

/// How long a stopping monitor waits for leave-zone notices still in
/// flight.
const NOTICE_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform location service. Fixes arrive in order on the returned
/// channel until the source is stopped or runs dry.
#[async_trait]
pub trait LocationSource: Send + 'static {
    async fn start(&mut self) -> ZoneResult<mpsc::Receiver<LocationFix>>;
    async fn stop(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    LeftZone { fix: LocationFix },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorStatus {
    pub inside_safe_zone: bool,
    pub last_fix: Option<LocationFix>,
}

pub struct ZoneMonitor;

impl ZoneMonitor {
    /// Starts `source` and spawns the task that owns `tracker` from here on.
    /// Fails without spawning anything if the source cannot be started.
    pub async fn spawn<L: LocationSource>(
        mut source: L,
        tracker: ZoneTracker,
        notifier: Arc<dyn LeaveZoneNotifier>,
        config: &MonitorConfig,
    ) -> ZoneResult<MonitorHandle> {
        let fixes = match source.start().await {
            Ok(fixes) => fixes,
            Err(err) => {
                warn!(error = %err, code = ?err.code(), "location tracking unavailable");
                return Err(err);
            }
        };

        if tracker.zones().is_empty() {
            warn!("no safe zones assigned, every fix will count as outside");
        }
        info!(zones = tracker.zones().len(), "zone monitor started");

        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let (status_tx, status) = watch::channel(MonitorStatus {
            inside_safe_zone: tracker.is_inside(),
            last_fix: None,
        });
        let (shutdown_tx, shutdown) = oneshot::channel();

        let worker = Worker {
            tracker,
            notifier,
            events: events.clone(),
            status: status_tx,
            notices: JoinSet::new(),
        };
        let task = tokio::spawn(worker.run(source, fixes, shutdown));

        Ok(MonitorHandle {
            events,
            status,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

struct Worker {
    tracker: ZoneTracker,
    notifier: Arc<dyn LeaveZoneNotifier>,
    events: broadcast::Sender<MonitorEvent>,
    status: watch::Sender<MonitorStatus>,
    notices: JoinSet<()>,
}

impl Worker {
    async fn run<L: LocationSource>(
        mut self,
        mut source: L,
        mut fixes: mpsc::Receiver<LocationFix>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("zone monitor stopping");
                    break;
                }
                fix = fixes.recv() => match fix {
                    Some(fix) => self.handle(fix),
                    None => {
                        debug!("location stream ended");
                        break;
                    }
                },
                Some(_) = self.notices.join_next(), if !self.notices.is_empty() => {}
            }
        }
        // Whatever ended the loop, the subscription is released before the
        // task goes away.
        source.stop().await;
        self.drain_notices().await;
    }

    async fn drain_notices(&mut self) {
        if self.notices.is_empty() {
            return;
        }
        let pending = self.notices.len();
        let drained = tokio::time::timeout(NOTICE_DRAIN_TIMEOUT, async {
            while self.notices.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            counter!(metric_names::NOTIFICATIONS_FAILED).increment(self.notices.len() as u64);
            warn!(
                pending,
                abandoned = self.notices.len(),
                "leave-zone notices still in flight at shutdown"
            );
            self.notices.abort_all();
        }
    }

    fn handle(&mut self, fix: LocationFix) {
        counter!(metric_names::FIXES_PROCESSED).increment(1);
        let transition = self.tracker.observe(&fix);
        self.status.send_replace(MonitorStatus {
            inside_safe_zone: self.tracker.is_inside(),
            last_fix: Some(fix),
        });

        match transition {
            Some(ZoneTransition::Left) => {
                info!(
                    latitude = fix.coordinate.latitude,
                    longitude = fix.coordinate.longitude,
                    "subject left safe zone"
                );
                counter!(metric_names::ZONE_EXITS).increment(1);
                // No subscribers is fine; the backend is still told.
                let _ = self.events.send(MonitorEvent::LeftZone { fix });
                self.dispatch_notification(fix);
            }
            Some(ZoneTransition::Returned) => {
                debug!(
                    latitude = fix.coordinate.latitude,
                    longitude = fix.coordinate.longitude,
                    "subject back inside safe zone"
                );
            }
            None => {}
        }
    }

    /// Runs beside the fix loop, at most once, never retried. The result
    /// only ever reaches the log. Shutdown waits for it.
    fn dispatch_notification(&mut self, fix: LocationFix) {
        let notifier = Arc::clone(&self.notifier);
        self.notices.spawn(async move {
            if let Err(err) = notifier.notify_left_zone(&fix).await {
                let err = ZoneError::NotificationDeliveryFailure(err.message);
                counter!(metric_names::NOTIFICATIONS_FAILED).increment(1);
                warn!(error = %err, "leave-zone notification dropped");
            }
        });
    }
}

/// Owner's side of a running monitor. Dropping it stops the monitor.
pub struct MonitorHandle {
    events: broadcast::Sender<MonitorEvent>,
    status: watch::Receiver<MonitorStatus>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> MonitorStatus {
        *self.status.borrow()
    }

    pub fn is_inside(&self) -> bool {
        self.status().inside_safe_zone
    }

    pub fn last_fix(&self) -> Option<LocationFix> {
        self.status().last_fix
    }

    /// Resolves once the monitor task has exited, either because the
    /// location stream ended or because it was stopped.
    pub async fn wait(&mut self) {
        let Some(task) = self.task.as_mut() else {
            return;
        };
        let result = task.await;
        self.task = None;
        if let Err(err) = result {
            warn!(error = %err, "zone monitor task failed");
        }
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.wait().await;
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{error, info};

use crate::error::ReservationError;
use crate::service::ReservationService;

/// Out-of-band batch job deleting physically expired reservation rows.
/// Decoupled from the request path: reads already ignore expired rows, so
/// a failed or delayed sweep never affects correctness.
pub struct ExpirySweeper {
    service: ReservationService,
}

impl ExpirySweeper {
    pub fn new(service: ReservationService) -> Self {
        Self { service }
    }

    /// Scheduler entrypoint. Deletes every row whose expiry has passed and
    /// returns how many rows were removed.
    pub async fn run_once(&self) -> Result<usize, ReservationError> {
        let removed = self.service.sweep_expired(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "swept expired reservations");
        }
        Ok(removed)
    }

    /// Periodic in-process loop. Failures are logged and the next tick runs
    /// regardless.
    pub async fn run(&self, interval: Duration) {
        let mut interval = time::interval(interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_once().await {
                error!("Error sweeping expired reservations: {}", e);
            }
        }
    }
}

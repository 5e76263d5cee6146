use chrono::Duration;

/// Tunables for the reservation engine, constructed once at startup and
/// passed into the controllers.
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    /// How long a claim stays active after each admitted request.
    pub ttl: Duration,
    /// Upper bound on the quantity a single admission may claim.
    pub quantity_limit: i32,
    /// Upper bound on distinct variants in one removal request.
    pub removal_batch_limit: usize,
}

impl ReservationConfig {
    pub fn new(ttl: Duration, quantity_limit: i32, removal_batch_limit: usize) -> Self {
        Self {
            ttl,
            quantity_limit,
            removal_batch_limit,
        }
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            quantity_limit: 50,
            removal_batch_limit: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReservationConfig::default();
        assert_eq!(config.ttl, Duration::minutes(10));
        assert_eq!(config.quantity_limit, 50);
        assert_eq!(config.removal_batch_limit, 50);
    }
}

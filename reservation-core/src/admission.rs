use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::external::{AvailabilityOracle, ShippingZoneResolver};
use crate::models::Reservation;
use crate::service::ReservationService;

#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub country_code: String,
    pub variant_id: Uuid,
    pub quantity: i32,
}

/// Validates and admits a single reservation request: quantity bounds,
/// zone resolution, availability check, then the committed upsert. The
/// availability check and the commit are deliberately not atomic across
/// shoppers; the reservation bounds oversell, it does not prevent it.
#[derive(Clone)]
pub struct AdmissionController<Z, O> {
    service: ReservationService,
    zones: Z,
    oracle: O,
    config: ReservationConfig,
}

impl<Z, O> AdmissionController<Z, O>
where
    Z: ShippingZoneResolver,
    O: AvailabilityOracle,
{
    pub fn new(service: ReservationService, zones: Z, oracle: O, config: ReservationConfig) -> Self {
        Self {
            service,
            zones,
            oracle,
            config,
        }
    }

    pub async fn reserve(
        &self,
        requester: Option<Uuid>,
        request: ReserveRequest,
    ) -> Result<Reservation, ReservationError> {
        let user_id = requester.ok_or(ReservationError::Unauthenticated)?;
        validate_quantity(request.quantity, &self.config)?;

        let zone = self
            .zones
            .resolve(&request.country_code)
            .await?
            .ok_or_else(|| ReservationError::InvalidCountryCode {
                code: request.country_code.clone(),
            })?;

        self.oracle
            .check(
                request.variant_id,
                &request.country_code,
                request.quantity,
                user_id,
            )
            .await?;

        let reservation = self
            .service
            .upsert(
                user_id,
                zone.id,
                request.variant_id,
                request.quantity,
                self.config.ttl,
                Utc::now(),
            )
            .await?;

        info!(
            user = %user_id,
            variant = %request.variant_id,
            quantity = request.quantity,
            zone = %zone.name,
            "reservation admitted"
        );
        Ok(reservation)
    }
}

fn validate_quantity(quantity: i32, config: &ReservationConfig) -> Result<(), ReservationError> {
    if quantity < 1 {
        return Err(ReservationError::ZeroQuantity);
    }
    // Enforced per admission call, not cumulatively across a user's
    // outstanding reservations.
    if quantity > config.quantity_limit {
        return Err(ReservationError::QuantityGreaterThanLimit {
            limit: config.quantity_limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_positive() {
        let config = ReservationConfig::default();
        assert!(matches!(
            validate_quantity(0, &config),
            Err(ReservationError::ZeroQuantity)
        ));
        assert!(matches!(
            validate_quantity(-3, &config),
            Err(ReservationError::ZeroQuantity)
        ));
        assert!(validate_quantity(1, &config).is_ok());
    }

    #[test]
    fn quantity_is_capped_per_call() {
        let config = ReservationConfig::default();
        assert!(validate_quantity(50, &config).is_ok());
        assert!(matches!(
            validate_quantity(2000, &config),
            Err(ReservationError::QuantityGreaterThanLimit { limit: 50 })
        ));
    }
}

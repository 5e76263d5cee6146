//! Contracts with the collaborators the engine depends on but does not
//! own. Identity is not a trait here: the transport layer authenticates
//! the caller and hands the controllers an `Option<Uuid>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ReservationError;
use crate::models::{ProductVariant, ShippingZone};

/// Resolves the shipping zone serving a country, if any. Zone identity is
/// stable for the lifetime of a reservation.
#[async_trait]
pub trait ShippingZoneResolver: Send + Sync {
    async fn resolve(&self, country_code: &str)
        -> Result<Option<ShippingZone>, ReservationError>;
}

/// Authoritative check against true warehouse stock, consulted before a
/// reservation commits. Implementations account for reservations held by
/// everyone except the requesting user and fail with
/// [`ReservationError::InsufficientStock`] carrying the remaining quantity
/// and a display name for the item.
#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    async fn check(
        &self,
        variant_id: Uuid,
        country_code: &str,
        quantity: i32,
        user_id: Uuid,
    ) -> Result<(), ReservationError>;
}

/// Lookup of product variants by id.
#[async_trait]
pub trait VariantCatalog: Send + Sync {
    async fn variants_by_id(&self, ids: &[Uuid])
        -> Result<Vec<ProductVariant>, ReservationError>;
}

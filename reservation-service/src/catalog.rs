//! PostgreSQL-backed implementations of the engine's collaborator traits.
//! Zones, variants, and warehouse stock are reference data owned by other
//! systems; this service only reads them.

use async_trait::async_trait;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use reservation_core::error::ReservationError;
use reservation_core::external::{AvailabilityOracle, ShippingZoneResolver, VariantCatalog};
use reservation_core::models::{ProductVariant, ShippingZone};
use reservation_core::schema::{product_variants, shipping_zones, warehouse_stocks};
use reservation_core::service::{DbPool, ReservationService};

#[derive(Clone)]
pub struct PgShippingZoneResolver {
    pool: DbPool,
}

impl PgShippingZoneResolver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingZoneResolver for PgShippingZoneResolver {
    async fn resolve(
        &self,
        country_code: &str,
    ) -> Result<Option<ShippingZone>, ReservationError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReservationError::Pool(e.to_string()))?;

        let zone = shipping_zones::table
            .filter(shipping_zones::countries.contains(vec![country_code.to_owned()]))
            .first::<ShippingZone>(&mut conn)
            .await
            .optional()?;
        Ok(zone)
    }
}

/// Availability check against warehouse stock: the stock pooled across the
/// zones serving the country, minus what other shoppers currently hold in
/// active reservations there.
#[derive(Clone)]
pub struct PgAvailabilityOracle {
    pool: DbPool,
    service: ReservationService,
}

impl PgAvailabilityOracle {
    pub fn new(pool: DbPool, service: ReservationService) -> Self {
        Self { pool, service }
    }
}

#[async_trait]
impl AvailabilityOracle for PgAvailabilityOracle {
    async fn check(
        &self,
        variant_id: Uuid,
        country_code: &str,
        quantity: i32,
        user_id: Uuid,
    ) -> Result<(), ReservationError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReservationError::Pool(e.to_string()))?;

        let variant = product_variants::table
            .find(variant_id)
            .first::<ProductVariant>(&mut conn)
            .await
            .optional()?
            .ok_or(ReservationError::VariantsNotFound {
                ids: vec![variant_id],
            })?;

        let serving_zones = shipping_zones::table
            .filter(shipping_zones::countries.contains(vec![country_code.to_owned()]))
            .select(shipping_zones::id);
        let in_stock: Option<i64> = warehouse_stocks::table
            .filter(warehouse_stocks::product_variant_id.eq(variant_id))
            .filter(warehouse_stocks::shipping_zone_id.eq_any(serving_zones))
            .select(sum(warehouse_stocks::quantity))
            .first(&mut conn)
            .await?;
        drop(conn);

        let reserved_by_others = self
            .service
            .get_reserved_quantity(variant_id, country_code, Some(user_id))
            .await?;

        let available = in_stock.unwrap_or(0) - reserved_by_others;
        if i64::from(quantity) > available {
            return Err(ReservationError::InsufficientStock {
                available: available.max(0),
                name: variant.name,
            });
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgVariantCatalog {
    pool: DbPool,
}

impl PgVariantCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VariantCatalog for PgVariantCatalog {
    async fn variants_by_id(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ProductVariant>, ReservationError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| ReservationError::Pool(e.to_string()))?;

        let variants = product_variants::table
            .filter(product_variants::id.eq_any(ids.to_vec()))
            .load::<ProductVariant>(&mut conn)
            .await?;
        Ok(variants)
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use tracing::debug;
use uuid::Uuid;

use crate::error::ReservationError;
use crate::models::{NewReservation, Reservation};
use crate::store;

pub type DbPool = Pool<AsyncPgConnection>;

/// Business operations over reservation rows. Holds the connection pool;
/// each call checks a connection out for its own duration.
#[derive(Clone)]
pub struct ReservationService {
    pool: DbPool,
}

impl ReservationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, ReservationError> {
        self.pool
            .get()
            .await
            .map_err(|e| ReservationError::Pool(e.to_string()))
    }

    /// Total quantity of `variant_id` held by active reservations within the
    /// zones serving `country_code`. Pass `exclude_user` to count only the
    /// contention coming from other shoppers.
    pub async fn get_reserved_quantity(
        &self,
        variant_id: Uuid,
        country_code: &str,
        exclude_user: Option<Uuid>,
    ) -> Result<i64, ReservationError> {
        let totals = self
            .get_reserved_quantity_bulk(&[variant_id], country_code, exclude_user)
            .await?;
        Ok(totals.get(&variant_id).copied().unwrap_or(0))
    }

    /// Same as [`get_reserved_quantity`](Self::get_reserved_quantity) for a
    /// set of variants, in a single grouped query. Variants with nothing
    /// reserved are absent from the map.
    pub async fn get_reserved_quantity_bulk(
        &self,
        variant_ids: &[Uuid],
        country_code: &str,
        exclude_user: Option<Uuid>,
    ) -> Result<HashMap<Uuid, i64>, ReservationError> {
        if variant_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut filter = store::and(
            store::for_country(country_code),
            store::and(store::active(Utc::now()), store::for_variants(variant_ids)),
        );
        if let Some(user_id) = exclude_user {
            filter = store::and(filter, store::exclude_user(user_id));
        }
        let mut conn = self.conn().await?;
        store::aggregate_by_variant(&mut conn, filter).await
    }

    /// Active quantities the user themselves holds per variant within the
    /// zones serving `country_code`.
    pub async fn get_user_reserved_quantity_bulk(
        &self,
        user_id: Uuid,
        country_code: &str,
        variant_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>, ReservationError> {
        if variant_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let filter = store::and(
            store::owned_by(user_id),
            store::and(
                store::for_country(country_code),
                store::and(store::active(Utc::now()), store::for_variants(variant_ids)),
            ),
        );
        let mut conn = self.conn().await?;
        store::aggregate_by_variant(&mut conn, filter).await
    }

    /// Creates or refreshes the user's claim on a variant. Within one
    /// transaction, the rows matching `(user, variant)` are locked, then
    /// either overwritten in place (zone, quantity, and expiry all replaced)
    /// or inserted fresh. A concurrent upsert for the same pair waits on the
    /// lock and commits last-writer-wins; the surviving row count is one.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        zone_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        let expires_at = now + ttl;
        let mut pooled = self.conn().await?;
        let conn = &mut *pooled;

        let reservation = conn
            .transaction::<_, ReservationError, _>(|conn| {
                Box::pin(async move {
                    match store::lock_user_variant(conn, user_id, variant_id).await? {
                        Some(existing) => {
                            store::refresh_reservation(
                                conn, existing.id, zone_id, quantity, expires_at, now,
                            )
                            .await
                        }
                        None => {
                            store::insert_reservation(
                                conn,
                                NewReservation {
                                    id: Uuid::new_v4(),
                                    user_id,
                                    shipping_zone_id: zone_id,
                                    product_variant_id: variant_id,
                                    quantity,
                                    expires_at,
                                },
                            )
                            .await
                        }
                    }
                })
            })
            .await?;

        debug!(
            user = %user_id,
            variant = %variant_id,
            quantity,
            expires_at = %reservation.expires_at,
            "reservation upserted"
        );
        Ok(reservation)
    }

    /// Deletes all of the user's reservations for the given variants within
    /// the zones serving `country_code`.
    pub async fn remove_user_reservations(
        &self,
        user_id: Uuid,
        country_code: &str,
        variant_ids: &[Uuid],
    ) -> Result<(), ReservationError> {
        let mut conn = self.conn().await?;
        let removed =
            store::delete_user_reservations(&mut conn, user_id, country_code, variant_ids).await?;
        debug!(user = %user_id, removed, "reservations removed");
        Ok(())
    }

    /// Deletes every reservation whose expiry has passed and returns how
    /// many rows went away. Expired rows are already invisible to reads, so
    /// this is storage hygiene, not correctness.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, ReservationError> {
        let mut conn = self.conn().await?;
        store::delete_expired(&mut conn, now).await
    }
}

//! Query primitives over reservation rows. Read filters are typed,
//! composable predicates; the service layer combines them with [`and`]
//! before handing them to [`aggregate_by_variant`]. Country scoping always
//! goes through zone set-membership, never a zone id parameter, since one
//! zone may serve many countries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::dsl::sum;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::error::ReservationError;
use crate::models::{NewReservation, Reservation};
use crate::schema::{reservations, shipping_zones};

/// A filter over reservation rows, composable with [`and`].
pub type ReservationFilter =
    Box<dyn BoxableExpression<reservations::table, Pg, SqlType = Bool>>;

/// Rows whose shipping zone serves `country_code`.
pub fn for_country(country_code: &str) -> ReservationFilter {
    let serving_zones = shipping_zones::table
        .filter(shipping_zones::countries.contains(vec![country_code.to_owned()]))
        .select(shipping_zones::id);
    Box::new(reservations::shipping_zone_id.eq_any(serving_zones))
}

/// Rows still holding stock at `now`.
pub fn active(now: DateTime<Utc>) -> ReservationFilter {
    Box::new(reservations::expires_at.gt(now))
}

/// Rows whose claim has lapsed at `now`.
pub fn expired(now: DateTime<Utc>) -> ReservationFilter {
    Box::new(reservations::expires_at.le(now))
}

/// Rows owned by anyone but `user_id`, for computing contention from other
/// shoppers.
pub fn exclude_user(user_id: Uuid) -> ReservationFilter {
    Box::new(reservations::user_id.ne(user_id))
}

/// Rows owned by `user_id`.
pub fn owned_by(user_id: Uuid) -> ReservationFilter {
    Box::new(reservations::user_id.eq(user_id))
}

/// Rows claiming one of the given variants.
pub fn for_variants(variant_ids: &[Uuid]) -> ReservationFilter {
    Box::new(reservations::product_variant_id.eq_any(variant_ids.to_vec()))
}

pub fn and(lhs: ReservationFilter, rhs: ReservationFilter) -> ReservationFilter {
    Box::new(lhs.and(rhs))
}

/// Sum of reserved quantity per variant over the rows matching `filter`.
/// Variants with nothing reserved are absent; callers treat absent as zero.
pub async fn aggregate_by_variant(
    conn: &mut AsyncPgConnection,
    filter: ReservationFilter,
) -> Result<HashMap<Uuid, i64>, ReservationError> {
    let rows: Vec<(Uuid, Option<i64>)> = reservations::table
        .filter(filter)
        .group_by(reservations::product_variant_id)
        .select((reservations::product_variant_id, sum(reservations::quantity)))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(variant_id, total)| {
            let total = total.unwrap_or(0);
            (total > 0).then_some((variant_id, total))
        })
        .collect())
}

/// Locks exactly the rows matching `(user, variant)` for the duration of
/// the surrounding transaction and returns the first of them, if any.
/// Unrelated pairs never contend on this lock.
pub async fn lock_user_variant(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    variant_id: Uuid,
) -> Result<Option<Reservation>, ReservationError> {
    let rows: Vec<Reservation> = reservations::table
        .filter(reservations::user_id.eq(user_id))
        .filter(reservations::product_variant_id.eq(variant_id))
        .for_update()
        .load(conn)
        .await?;
    Ok(rows.into_iter().next())
}

/// Overwrites zone, quantity, and expiry of an existing reservation in
/// place. The new quantity replaces the old; nothing accumulates.
pub async fn refresh_reservation(
    conn: &mut AsyncPgConnection,
    reservation_id: Uuid,
    zone_id: Uuid,
    quantity: i32,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Reservation, ReservationError> {
    let row = diesel::update(reservations::table.filter(reservations::id.eq(reservation_id)))
        .set((
            reservations::shipping_zone_id.eq(zone_id),
            reservations::quantity.eq(quantity),
            reservations::expires_at.eq(expires_at),
            reservations::updated_at.eq(now),
        ))
        .get_result(conn)
        .await?;
    Ok(row)
}

/// Inserts a fresh reservation row. Two first-time upserts for the same
/// pair can both reach this insert (there was no row to lock), so the
/// conflict target on the uniqueness constraint makes the later commit
/// land on the same row with its own quantity and expiry.
pub async fn insert_reservation(
    conn: &mut AsyncPgConnection,
    row: NewReservation,
) -> Result<Reservation, ReservationError> {
    let row = diesel::insert_into(reservations::table)
        .values(&row)
        .on_conflict((
            reservations::user_id,
            reservations::shipping_zone_id,
            reservations::product_variant_id,
        ))
        .do_update()
        .set((
            reservations::quantity.eq(excluded(reservations::quantity)),
            reservations::expires_at.eq(excluded(reservations::expires_at)),
        ))
        .get_result(conn)
        .await?;
    Ok(row)
}

/// Deletes the user's reservations for the given variants within the zones
/// serving `country_code`. Rows of other users, other variants, or zones
/// not serving the country are untouched.
pub async fn delete_user_reservations(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    country_code: &str,
    variant_ids: &[Uuid],
) -> Result<usize, ReservationError> {
    let scope = and(
        owned_by(user_id),
        and(for_country(country_code), for_variants(variant_ids)),
    );
    let deleted = diesel::delete(reservations::table.filter(scope))
        .execute(conn)
        .await?;
    Ok(deleted)
}

/// Deletes every row whose expiry has passed, regardless of user or zone.
pub async fn delete_expired(
    conn: &mut AsyncPgConnection,
    now: DateTime<Utc>,
) -> Result<usize, ReservationError> {
    let deleted = diesel::delete(reservations::table.filter(expired(now)))
        .execute(conn)
        .await?;
    Ok(deleted)
}

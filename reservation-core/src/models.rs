use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-bounded claim by one user on a quantity of one product variant
/// within one shipping zone. At most one row exists per
/// `(user_id, shipping_zone_id, product_variant_id)` triple.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::reservations)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_zone_id: Uuid,
    pub product_variant_id: Uuid,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct NewReservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_zone_id: Uuid,
    pub product_variant_id: Uuid,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
}

/// A named set of countries sharing shipping configuration. Used purely as
/// a partitioning key for reservations; lifecycle is owned elsewhere.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::shipping_zones)]
pub struct ShippingZone {
    pub id: Uuid,
    pub name: String,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::product_variants)]
pub struct ProductVariant {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
}

/// Warehouse stock count for one variant in one zone, owned by the
/// warehouse side; the engine only reads it.
#[derive(Debug, Clone, Queryable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::warehouse_stocks)]
pub struct WarehouseStock {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub shipping_zone_id: Uuid,
    pub quantity: i32,
}

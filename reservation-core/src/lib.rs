//! Soft stock reservation engine: short-lived, per-user claims on limited
//! product variant inventory, backed by a transactional PostgreSQL store.
//!
//! Reservations bound the window of oversell and signal contention between
//! concurrent shoppers; they are not hard exclusive holds. A claim lapses
//! once its expiry passes and is excluded from every aggregate read from
//! that moment on, whether or not the sweeper has physically removed it.

pub mod admission;
pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod removal;
pub mod schema;
pub mod service;
pub mod store;
pub mod sweeper;

pub use admission::{AdmissionController, ReserveRequest};
pub use config::ReservationConfig;
pub use error::ReservationError;
pub use external::{AvailabilityOracle, ShippingZoneResolver, VariantCatalog};
pub use models::{ProductVariant, Reservation, ShippingZone, WarehouseStock};
pub use removal::{RemovalController, RemoveRequest, RemovedReservation};
pub use service::{DbPool, ReservationService};
pub use sweeper::ExpirySweeper;

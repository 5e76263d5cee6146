use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the reservation engine. Validation and availability
/// failures carry a stable machine-readable code; database and pool
/// failures propagate to the caller, which decides whether to retry.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("the quantity should be higher than zero")]
    ZeroQuantity,

    #[error("cannot reserve more than {limit} of an item")]
    QuantityGreaterThanLimit { limit: i32 },

    #[error("no shipping zone serves the country {code}")]
    InvalidCountryCode { code: String },

    #[error("could not reserve {name}, only {available} remaining in stock")]
    InsufficientStock { available: i64, name: String },

    #[error("cannot remove more than {limit} reservations in one request")]
    TooManyReservations { limit: usize },

    #[error("unknown product variants: {ids:?}")]
    VariantsNotFound { ids: Vec<Uuid> },

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),
}

impl ReservationError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "AUTHENTICATION_REQUIRED",
            Self::ZeroQuantity => "ZERO_QUANTITY",
            Self::QuantityGreaterThanLimit { .. } => "QUANTITY_GREATER_THAN_LIMIT",
            Self::InvalidCountryCode { .. } => "INVALID_COUNTRY_CODE",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::TooManyReservations { .. } => "TOO_MANY_RESERVATIONS",
            Self::VariantsNotFound { .. } => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Pool(_) => "POOL_ERROR",
        }
    }

    /// Request field the error is attached to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::ZeroQuantity
            | Self::QuantityGreaterThanLimit { .. }
            | Self::InsufficientStock { .. } => Some("quantity"),
            Self::InvalidCountryCode { .. } => Some("country_code"),
            Self::TooManyReservations { .. } | Self::VariantsNotFound { .. } => {
                Some("variant_ids")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ReservationError::Unauthenticated.code(), "AUTHENTICATION_REQUIRED");
        assert_eq!(ReservationError::ZeroQuantity.code(), "ZERO_QUANTITY");
        assert_eq!(
            ReservationError::QuantityGreaterThanLimit { limit: 50 }.code(),
            "QUANTITY_GREATER_THAN_LIMIT"
        );
        assert_eq!(
            ReservationError::InvalidCountryCode { code: "XX".into() }.code(),
            "INVALID_COUNTRY_CODE"
        );
        assert_eq!(
            ReservationError::TooManyReservations { limit: 50 }.code(),
            "TOO_MANY_RESERVATIONS"
        );
        assert_eq!(
            ReservationError::VariantsNotFound { ids: vec![] }.code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn insufficient_stock_is_a_quantity_error_with_remaining_count() {
        let err = ReservationError::InsufficientStock {
            available: 3,
            name: "Blue T-Shirt (M)".into(),
        };
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(err.field(), Some("quantity"));
        assert!(err.to_string().contains("only 3 remaining"));
        assert!(err.to_string().contains("Blue T-Shirt (M)"));
    }

    #[test]
    fn storage_errors_have_no_field() {
        assert_eq!(ReservationError::Pool("timed out".into()).field(), None);
        assert_eq!(
            ReservationError::Database(diesel::result::Error::NotFound).field(),
            None
        );
    }
}

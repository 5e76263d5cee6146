use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reservation_core::{
    AdmissionController, RemovalController, ReservationError, ReservationService,
    ReserveRequest, RemoveRequest,
};

use crate::catalog::{PgAvailabilityOracle, PgShippingZoneResolver, PgVariantCatalog};

#[derive(Clone)]
pub struct AppState {
    pub admission: AdmissionController<PgShippingZoneResolver, PgAvailabilityOracle>,
    pub removal: RemovalController<PgVariantCatalog>,
    pub service: ReservationService,
}

#[derive(Debug, Deserialize)]
pub struct ReserveStockRequest {
    pub country_code: String,
    pub variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub shipping_zone_id: Uuid,
    pub quantity: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveReservationsRequest {
    pub country_code: String,
    pub variant_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RemovedReservationResponse {
    pub variant_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct RemoveReservationsResponse {
    pub removed: Vec<RemovedReservationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ReservedQuantityParams {
    pub country_code: String,
}

#[derive(Debug, Serialize)]
pub struct ReservedQuantityResponse {
    pub variant_id: Uuid,
    pub reserved: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/reservations",
            post(reserve_stock).delete(remove_reservations),
        )
        .route("/variants/:variant_id/reserved", get(reserved_quantity))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn reserve_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReserveStockRequest>,
) -> Result<Json<ReservationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let reservation = state
        .admission
        .reserve(
            requester(&headers),
            ReserveRequest {
                country_code: request.country_code,
                variant_id: request.variant_id,
                quantity: request.quantity,
            },
        )
        .await
        .map_err(error_response)?;

    Ok(Json(ReservationResponse {
        id: reservation.id,
        variant_id: reservation.product_variant_id,
        shipping_zone_id: reservation.shipping_zone_id,
        quantity: reservation.quantity,
        expires_at: reservation.expires_at,
    }))
}

pub async fn remove_reservations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RemoveReservationsRequest>,
) -> Result<Json<RemoveReservationsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let removed = state
        .removal
        .remove(
            requester(&headers),
            RemoveRequest {
                country_code: request.country_code,
                variant_ids: request.variant_ids,
            },
        )
        .await
        .map_err(error_response)?;

    Ok(Json(RemoveReservationsResponse {
        removed: removed
            .into_iter()
            .map(|r| RemovedReservationResponse {
                variant_id: r.variant_id,
                quantity: r.quantity,
            })
            .collect(),
    }))
}

pub async fn reserved_quantity(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Query(params): Query<ReservedQuantityParams>,
) -> Result<Json<ReservedQuantityResponse>, (StatusCode, Json<ErrorResponse>)> {
    let reserved = state
        .service
        .get_reserved_quantity(variant_id, &params.country_code, None)
        .await
        .map_err(error_response)?;

    Ok(Json(ReservedQuantityResponse {
        variant_id,
        reserved,
    }))
}

pub async fn health_check() -> &'static str {
    "OK"
}

fn requester(headers: &HeaderMap) -> Option<Uuid> {
    headers.get("x-user-id")?.to_str().ok()?.parse().ok()
}

fn error_response(err: ReservationError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ReservationError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ReservationError::VariantsNotFound { .. } => StatusCode::NOT_FOUND,
        ReservationError::InsufficientStock { .. } => StatusCode::CONFLICT,
        ReservationError::ZeroQuantity
        | ReservationError::QuantityGreaterThanLimit { .. }
        | ReservationError::InvalidCountryCode { .. }
        | ReservationError::TooManyReservations { .. } => StatusCode::BAD_REQUEST,
        ReservationError::Database(_) | ReservationError::Pool(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
            field: err.field().map(str::to_string),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn requester_parses_the_user_header() {
        let user_id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-user-id",
            HeaderValue::from_str(&user_id.to_string()).unwrap(),
        );
        assert_eq!(requester(&headers), Some(user_id));
    }

    #[test]
    fn requester_rejects_missing_or_garbled_headers() {
        assert_eq!(requester(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        assert_eq!(requester(&headers), None);
    }

    #[test]
    fn validation_errors_map_to_bad_request_with_code_and_field() {
        let (status, Json(body)) = error_response(ReservationError::ZeroQuantity);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "ZERO_QUANTITY");
        assert_eq!(body.field.as_deref(), Some("quantity"));

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "ZERO_QUANTITY");
        assert_eq!(json["field"], "quantity");
    }

    #[test]
    fn stock_conflicts_map_to_conflict() {
        let (status, Json(body)) = error_response(ReservationError::InsufficientStock {
            available: 5,
            name: "Sneaker".into(),
        });
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.code, "INSUFFICIENT_STOCK");
        assert!(body.error.contains("only 5 remaining"));
    }

    #[test]
    fn missing_identity_maps_to_unauthorized() {
        let (status, Json(body)) = error_response(ReservationError::Unauthenticated);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "AUTHENTICATION_REQUIRED");
        assert!(body.field.is_none());
    }
}

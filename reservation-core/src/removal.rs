use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::external::VariantCatalog;
use crate::service::ReservationService;

#[derive(Debug, Clone)]
pub struct RemoveRequest {
    pub country_code: String,
    pub variant_ids: Vec<Uuid>,
}

/// Per-variant quantity released by a removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedReservation {
    pub variant_id: Uuid,
    pub quantity: i64,
}

/// Validates and executes bulk removal of a user's claims. All-or-nothing:
/// an oversized batch or an unknown variant rejects the whole request
/// before anything is deleted.
#[derive(Clone)]
pub struct RemovalController<C> {
    service: ReservationService,
    catalog: C,
    config: ReservationConfig,
}

impl<C: VariantCatalog> RemovalController<C> {
    pub fn new(service: ReservationService, catalog: C, config: ReservationConfig) -> Self {
        Self {
            service,
            catalog,
            config,
        }
    }

    pub async fn remove(
        &self,
        requester: Option<Uuid>,
        request: RemoveRequest,
    ) -> Result<Vec<RemovedReservation>, ReservationError> {
        let user_id = requester.ok_or(ReservationError::Unauthenticated)?;

        let variant_ids = dedup_variant_ids(&request.variant_ids);
        if variant_ids.len() > self.config.removal_batch_limit {
            return Err(ReservationError::TooManyReservations {
                limit: self.config.removal_batch_limit,
            });
        }

        let known = self.catalog.variants_by_id(&variant_ids).await?;
        if known.len() != variant_ids.len() {
            let known_ids: HashSet<Uuid> = known.iter().map(|v| v.id).collect();
            let missing = variant_ids
                .iter()
                .copied()
                .filter(|id| !known_ids.contains(id))
                .collect();
            return Err(ReservationError::VariantsNotFound { ids: missing });
        }

        // Snapshot before deleting; the delete reports nothing per row.
        let held = self
            .service
            .get_user_reserved_quantity_bulk(user_id, &request.country_code, &variant_ids)
            .await?;

        self.service
            .remove_user_reservations(user_id, &request.country_code, &variant_ids)
            .await?;

        let removed: Vec<RemovedReservation> = variant_ids
            .into_iter()
            .map(|variant_id| RemovedReservation {
                variant_id,
                quantity: held.get(&variant_id).copied().unwrap_or(0),
            })
            .collect();

        info!(user = %user_id, variants = removed.len(), "reservations released");
        Ok(removed)
    }
}

fn dedup_variant_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let deduped = dedup_variant_ids(&[a, b, a, a, b]);
        assert_eq!(deduped, vec![a, b]);
    }

    #[test]
    fn dedup_of_empty_is_empty() {
        assert!(dedup_variant_ids(&[]).is_empty());
    }
}

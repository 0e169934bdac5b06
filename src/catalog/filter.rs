use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{Establishment, EstablishmentKind, PriceRange};

/// Listing filter criteria; every `None` means "don't filter on this"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstablishmentFilters {
    pub kinds: Option<Vec<EstablishmentKind>>,
    pub price_ranges: Option<Vec<PriceRange>>,
    pub min_rating: Option<f32>,
    pub available_today: Option<bool>,
}

/// Keep establishments matching every present criterion, preserving order
pub fn apply_filters(
    establishments: &[Establishment],
    filters: &EstablishmentFilters,
) -> Vec<Establishment> {
    let today = Utc::now().date_naive();

    establishments
        .iter()
        .filter(|e| {
            if let Some(kinds) = &filters.kinds {
                if !kinds.contains(&e.kind) {
                    return false;
                }
            }
            if let Some(tiers) = &filters.price_ranges {
                if !tiers.contains(&e.price_range) {
                    return false;
                }
            }
            if let Some(min) = filters.min_rating {
                if e.rating < min {
                    return false;
                }
            }
            if filters.available_today == Some(true) {
                let open_today = e
                    .available_slots
                    .iter()
                    .any(|s| s.available && s.date == today);
                if !open_today {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

use std::cmp::Ordering;

use crate::models::{Establishment, SortOption};

/// Order a listing by the selected key without touching the input.
///
/// Ordering per key:
/// - distance: ascending, nearest first; a record with no computed distance
///   ranks as 0 km (see the note below)
/// - rating: descending, ties keep their input order
/// - price: ascending by tier ordinal ($ before $$$$); unknown tiers last
/// - availability: descending by number of open slots, counted at call time
///
/// The sort is stable and idempotent: re-sorting an already ordered listing
/// by the same key returns it unchanged.
///
/// Note: treating a missing distance as "0 km away" puts establishments with
/// unknown locations at the top of the nearest-first listing. That matches
/// the shipped behavior this engine replaces and is kept deliberately.
pub fn sort_establishments(
    establishments: &[Establishment],
    sort: SortOption,
) -> Vec<Establishment> {
    let mut sorted = establishments.to_vec();

    match sort {
        SortOption::Distance => {
            sorted.sort_by(|a, b| {
                let da = a.distance_km.unwrap_or(0.0);
                let db = b.distance_km.unwrap_or(0.0);
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        }
        SortOption::Rating => {
            sorted.sort_by(|a, b| {
                b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
            });
        }
        SortOption::Price => {
            sorted.sort_by_key(|e| e.price_range.ordinal());
        }
        SortOption::Availability => {
            sorted.sort_by_key(|e| std::cmp::Reverse(e.open_slot_count()));
        }
    }

    sorted
}

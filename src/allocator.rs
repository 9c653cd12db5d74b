use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ReservationError, Result};
use crate::models::ShowSeat;
use crate::store::ReservationStore;

/// Подбор эквивалентных мест: та же цена, тот же кинозал, место свободно.
/// Аллокатор только считает кандидатов, выбор всегда за вызывающим.
#[derive(Clone)]
pub struct SeatAllocator<S> {
    store: Arc<S>,
}

impl<S: ReservationStore> SeatAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Свободные места той же цены в залах исходного места, по возрастанию
    /// ssid. Зал выводится через Show -> Play, сеанс может идти в нескольких
    /// залах сразу.
    pub async fn find_equivalent_free_seats(&self, source_seat_id: i64) -> Result<Vec<ShowSeat>> {
        let source = self
            .store
            .fetch_seat(source_seat_id)
            .await?
            .ok_or_else(|| ReservationError::not_found("seat", source_seat_id))?;

        let theaters = self.store.theaters_for_show(source.sid).await?;
        let reachable = self.store.shows_in_theaters(&theaters).await?;
        let free = self.store.free_seats_with_price(source.price).await?;

        let candidates = equivalent_candidates(&source, &reachable, free);
        debug!(
            ssid = source_seat_id,
            candidates = candidates.len(),
            "equivalent seats resolved"
        );
        Ok(candidates)
    }
}

/// Чистая фильтрация кандидатов: свободно, цена совпадает, сеанс идёт в одном
/// из залов исходного места, само исходное место исключено. Порядок — по
/// возрастанию ssid.
pub fn equivalent_candidates(
    source: &ShowSeat,
    reachable_shows: &[i64],
    free_seats: Vec<ShowSeat>,
) -> Vec<ShowSeat> {
    let reachable: HashSet<i64> = reachable_shows.iter().copied().collect();
    let mut candidates: Vec<ShowSeat> = free_seats
        .into_iter()
        .filter(|s| s.ssid != source.ssid)
        .filter(|s| s.is_free() && s.price == source.price)
        .filter(|s| reachable.contains(&s.sid))
        .collect();
    candidates.sort_unstable_by_key(|s| s.ssid);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seat(ssid: i64, sid: i64, price: i64, bid: Option<i64>) -> ShowSeat {
        ShowSeat {
            ssid,
            sid,
            csid: ssid,
            price,
            bid,
        }
    }

    #[test]
    fn candidates_are_sorted_and_exclude_source() {
        let source = seat(10, 5, 1000, Some(1));
        let free = vec![
            seat(30, 5, 1000, None),
            seat(10, 5, 1000, None),
            seat(20, 5, 1000, None),
        ];

        let out = equivalent_candidates(&source, &[5], free);
        let ssids: Vec<i64> = out.iter().map(|s| s.ssid).collect();
        assert_eq!(ssids, vec![20, 30]);
    }

    proptest! {
        #[test]
        fn every_candidate_is_free_equal_priced_and_reachable(
            seats in proptest::collection::vec(
                (1..200i64, 1..8i64, prop::sample::select(vec![500i64, 750, 1000]), proptest::option::of(1..50i64)),
                0..40,
            ),
            reachable in proptest::collection::vec(1..8i64, 0..6),
        ) {
            let source = seat(0, reachable.first().copied().unwrap_or(1), 750, Some(9));
            let pool: Vec<ShowSeat> = seats
                .into_iter()
                .map(|(ssid, sid, price, bid)| seat(ssid, sid, price, bid))
                .collect();

            let out = equivalent_candidates(&source, &reachable, pool);

            for s in &out {
                prop_assert!(s.is_free());
                prop_assert_eq!(s.price, source.price);
                prop_assert!(reachable.contains(&s.sid));
                prop_assert_ne!(s.ssid, source.ssid);
            }
            for pair in out.windows(2) {
                prop_assert!(pair[0].ssid <= pair[1].ssid);
            }
        }
    }
}

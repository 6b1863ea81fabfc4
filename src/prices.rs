//! Daily price generation.
//!
//! Prices are recomputed wholesale once per day (and once at game start).
//! Every catalog good gets exactly one entry: either a positive integer
//! quote or the unavailable sentinel (`None`).

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::catalog::{Good, Location};
use crate::numbers::{i64_to_f64, round_f64_to_i64};

/// Today's quotes plus the transient set of goods in an active market event.
/// The surge set is overwritten, never merged, on regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBoard {
    quotes: HashMap<String, Option<i64>>,
    surging: HashSet<String>,
}

impl PriceBoard {
    /// The quoted price for a good, or `None` when it is off the market
    /// today (or unknown to the board).
    #[must_use]
    pub fn quote(&self, good_id: &str) -> Option<i64> {
        self.quotes.get(good_id).copied().flatten()
    }

    /// Whether the good has an entry on the board at all.
    #[must_use]
    pub fn is_listed(&self, good_id: &str) -> bool {
        self.quotes.contains_key(good_id)
    }

    /// Whether today's quote for the good came from its event range.
    #[must_use]
    pub fn is_event_active(&self, good_id: &str) -> bool {
        self.surging.contains(good_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Iterate over all (good id, quote) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<i64>)> {
        self.quotes.iter().map(|(id, quote)| (id.as_str(), *quote))
    }
}

/// Generate today's price board for every good in the catalog.
///
/// Per good: Bernoulli availability, Bernoulli event activation, a uniform
/// draw from the active range, the location's category multiplier, then a
/// clamp back into the *same* range the draw came from. The clamp runs
/// after the multiplier so quotes always land inside one of the two
/// declared ranges. Total function: every good gets an entry.
pub fn generate_prices<R: Rng>(
    goods: &[Good],
    location: Option<&Location>,
    rng: &mut R,
) -> PriceBoard {
    let mut board = PriceBoard::default();
    for good in goods {
        if !rng.gen_bool(good.availability.clamp(0.0, 1.0)) {
            board.quotes.insert(good.id.clone(), None);
            continue;
        }
        let event_active = rng.gen_bool(good.event_chance.clamp(0.0, 1.0));
        let range = if event_active {
            good.event_range
        } else {
            good.normal_range
        };
        let raw = rng.gen_range(range.min..=range.max);
        let factor = location.map_or(1.0, |loc| loc.factor_for(good.category));
        let adjusted = range.clamp_f64(i64_to_f64(raw) * factor);
        let price = round_f64_to_i64(adjusted).max(range.min);

        board.quotes.insert(good.id.clone(), Some(price));
        if event_active {
            board.surging.insert(good.id.clone());
            debug!("price event active for {}: {}", good.id, price);
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn every_good_gets_exactly_one_entry() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let board = generate_prices(&catalog.goods, None, &mut rng);
        assert_eq!(board.len(), catalog.goods.len());
        for good in &catalog.goods {
            assert!(board.is_listed(&good.id));
        }
    }

    #[test]
    fn quotes_stay_inside_the_sampled_range() {
        let catalog = Catalog::builtin();
        let uptown = catalog.location("uptown").expect("uptown exists").clone();
        let mut rng = ChaCha20Rng::seed_from_u64(99);

        for trial in 0..500 {
            let location = if trial % 2 == 0 { Some(&uptown) } else { None };
            let board = generate_prices(&catalog.goods, location, &mut rng);
            for good in &catalog.goods {
                let Some(price) = board.quote(&good.id) else {
                    continue;
                };
                let range = if board.is_event_active(&good.id) {
                    good.event_range
                } else {
                    good.normal_range
                };
                assert!(
                    range.contains(price),
                    "good {} priced {price} outside {}..={}",
                    good.id,
                    range.min,
                    range.max
                );
            }
        }
    }

    #[test]
    fn surge_set_is_replaced_not_merged() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        // With enough regenerations, at least one board has no carry-over
        // from a previous board's surges.
        let mut saw_disjoint = false;
        let mut prev: Option<PriceBoard> = None;
        for _ in 0..50 {
            let board = generate_prices(&catalog.goods, None, &mut rng);
            if let Some(previous) = &prev {
                let carried = catalog.goods.iter().any(|good| {
                    previous.is_event_active(&good.id) && board.is_event_active(&good.id)
                });
                let prev_had_surge = catalog
                    .goods
                    .iter()
                    .any(|good| previous.is_event_active(&good.id));
                if prev_had_surge && !carried {
                    saw_disjoint = true;
                }
            }
            prev = Some(board);
        }
        assert!(saw_disjoint, "surge state appears to persist across boards");
    }

    #[test]
    fn unknown_good_is_not_listed() {
        let board = PriceBoard::default();
        assert!(!board.is_listed("ghost"));
        assert_eq!(board.quote("ghost"), None);
        assert!(!board.is_event_active("ghost"));
    }
}

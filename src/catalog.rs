//! Static market catalog: trading locations and tradable goods.
//!
//! Catalog data is immutable after load. The crate ships a builtin catalog;
//! hosts may override it with `Catalog::from_json`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoodCategory {
    Luxury,
    Vice,
    Medicine,
    Tech,
    Contraband,
}

impl GoodCategory {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Luxury => "luxury",
            Self::Vice => "vice",
            Self::Medicine => "medicine",
            Self::Tech => "tech",
            Self::Contraband => "contraband",
        }
    }
}

/// Inclusive integer price range. Both bounds are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

impl PriceRange {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.min > 0 && self.min <= self.max
    }

    #[must_use]
    pub const fn contains(self, price: i64) -> bool {
        price >= self.min && price <= self.max
    }

    /// Clamp a raw float back into this range before rounding.
    #[must_use]
    pub fn clamp_f64(self, value: f64) -> f64 {
        let min = crate::numbers::i64_to_f64(self.min);
        let max = crate::numbers::i64_to_f64(self.max);
        value.clamp(min, max)
    }
}

/// One of the five travel destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub desc: String,
    /// Per-category price multipliers; categories not listed default to 1.0.
    #[serde(default)]
    pub price_factors: HashMap<GoodCategory, f64>,
}

impl Location {
    #[must_use]
    pub fn factor_for(&self, category: GoodCategory) -> f64 {
        self.price_factors.get(&category).copied().unwrap_or(1.0)
    }
}

/// A tradable catalog good with its own price-range and randomness knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub id: String,
    pub name: String,
    pub category: GoodCategory,
    pub desc: String,
    /// Informational reference price.
    pub base_price: i64,
    /// Informational volatility hint for presentation.
    pub volatility: f64,
    /// Daily Bernoulli probability the good is on the market at all.
    pub availability: f64,
    /// Daily Bernoulli probability a market event drives the price.
    pub event_chance: f64,
    pub normal_range: PriceRange,
    pub event_range: PriceRange,
    /// Narrative shown when the event range is active.
    pub event_flavor: String,
}

/// Container for the full immutable catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub locations: Vec<Location>,
    pub goods: Vec<Good>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// Load a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|location| location.id == id)
    }

    #[must_use]
    pub fn good(&self, id: &str) -> Option<&Good> {
        self.goods.iter().find(|good| good.id == id)
    }

    /// Resolve a display name, falling back to the raw id for unknown goods.
    #[must_use]
    pub fn good_name(&self, id: &str) -> String {
        self.good(id)
            .map_or_else(|| id.to_string(), |good| good.name.clone())
    }

    /// Check the catalog invariants: non-degenerate, strictly positive
    /// ranges and probabilities inside [0, 1].
    ///
    /// # Errors
    ///
    /// Returns a descriptive error for the first violating good.
    pub fn validate(&self) -> Result<()> {
        for good in &self.goods {
            if !good.normal_range.is_valid() {
                bail!("good '{}' has an invalid normal range", good.id);
            }
            if !good.event_range.is_valid() {
                bail!("good '{}' has an invalid event range", good.id);
            }
            if !(0.0..=1.0).contains(&good.availability) {
                bail!("good '{}' has availability outside [0,1]", good.id);
            }
            if !(0.0..=1.0).contains(&good.event_chance) {
                bail!("good '{}' has event chance outside [0,1]", good.id);
            }
        }
        Ok(())
    }

    /// The catalog baked into the crate: five districts, eight goods.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            locations: builtin_locations(),
            goods: builtin_goods(),
        }
    }
}

fn factors(entries: &[(GoodCategory, f64)]) -> HashMap<GoodCategory, f64> {
    entries.iter().copied().collect()
}

fn builtin_locations() -> Vec<Location> {
    vec![
        Location {
            id: "docks".to_string(),
            name: "The Docks".to_string(),
            desc: "Container cranes, night shifts, and nobody checking manifests twice.".to_string(),
            price_factors: factors(&[
                (GoodCategory::Contraband, 0.85),
                (GoodCategory::Tech, 0.90),
                (GoodCategory::Vice, 0.95),
            ]),
        },
        Location {
            id: "market-row".to_string(),
            name: "Market Row".to_string(),
            desc: "Stalls by day, a different economy after the shutters come down.".to_string(),
            price_factors: factors(&[
                (GoodCategory::Vice, 0.90),
                (GoodCategory::Luxury, 1.05),
            ]),
        },
        Location {
            id: "uptown".to_string(),
            name: "Uptown".to_string(),
            desc: "Doormen, private clinics, and buyers who never ask where it came from.".to_string(),
            price_factors: factors(&[
                (GoodCategory::Luxury, 1.25),
                (GoodCategory::Medicine, 1.10),
                (GoodCategory::Contraband, 1.15),
            ]),
        },
        Location {
            id: "old-quarter".to_string(),
            name: "Old Quarter".to_string(),
            desc: "Narrow lanes and old debts. Everyone knows everyone's business.".to_string(),
            price_factors: factors(&[
                (GoodCategory::Vice, 1.10),
                (GoodCategory::Tech, 1.05),
            ]),
        },
        Location {
            id: "warrens".to_string(),
            name: "The Warrens".to_string(),
            desc: "Cheap rooms and cheaper promises on the wrong side of the canal.".to_string(),
            price_factors: factors(&[
                (GoodCategory::Medicine, 1.30),
                (GoodCategory::Luxury, 0.80),
                (GoodCategory::Contraband, 1.20),
            ]),
        },
    ]
}

#[allow(clippy::too_many_lines)]
fn builtin_goods() -> Vec<Good> {
    vec![
        Good {
            id: "counterfeit-watches".to_string(),
            name: "Counterfeit Watches".to_string(),
            category: GoodCategory::Luxury,
            desc: "Swiss faces, Shenzhen hearts.".to_string(),
            base_price: 100,
            volatility: 0.4,
            availability: 0.90,
            event_chance: 0.10,
            normal_range: PriceRange::new(60, 140),
            event_range: PriceRange::new(250, 480),
            event_flavor: "A counterfeiting ring was busted; convincing fakes are suddenly scarce."
                .to_string(),
        },
        Good {
            id: "untaxed-spirits".to_string(),
            name: "Untaxed Spirits".to_string(),
            category: GoodCategory::Vice,
            desc: "Duty-free, minus the duty and the free.".to_string(),
            base_price: 30,
            volatility: 0.3,
            availability: 0.95,
            event_chance: 0.12,
            normal_range: PriceRange::new(15, 45),
            event_range: PriceRange::new(70, 140),
            event_flavor: "A customs blitz dried up the duty-free pipeline.".to_string(),
        },
        Good {
            id: "smuggled-cigars".to_string(),
            name: "Smuggled Cigars".to_string(),
            category: GoodCategory::Vice,
            desc: "Hand-rolled, embargo-flavored.".to_string(),
            base_price: 40,
            volatility: 0.35,
            availability: 0.90,
            event_chance: 0.08,
            normal_range: PriceRange::new(25, 60),
            event_range: PriceRange::new(90, 180),
            event_flavor: "An embassy reception cleaned out every humidor in town.".to_string(),
        },
        Good {
            id: "grey-antibiotics".to_string(),
            name: "Grey-Market Antibiotics".to_string(),
            category: GoodCategory::Medicine,
            desc: "Expiry dates are more of a suggestion.".to_string(),
            base_price: 200,
            volatility: 0.5,
            availability: 0.80,
            event_chance: 0.10,
            normal_range: PriceRange::new(120, 280),
            event_range: PriceRange::new(400, 900),
            event_flavor: "A clinic shortage has desperate buyers paying anything.".to_string(),
        },
        Good {
            id: "hot-circuitry".to_string(),
            name: "Hot Circuitry".to_string(),
            category: GoodCategory::Tech,
            desc: "Fell off a container. The container also fell.".to_string(),
            base_price: 320,
            volatility: 0.45,
            availability: 0.75,
            event_chance: 0.09,
            normal_range: PriceRange::new(200, 450),
            event_range: PriceRange::new(700, 1_400),
            event_flavor: "A container of components vanished from the port registry.".to_string(),
        },
        Good {
            id: "forged-permits".to_string(),
            name: "Forged Permits".to_string(),
            category: GoodCategory::Contraband,
            desc: "Stamped, sealed, and entirely fictional.".to_string(),
            base_price: 470,
            volatility: 0.55,
            availability: 0.70,
            event_chance: 0.07,
            normal_range: PriceRange::new(300, 650),
            event_range: PriceRange::new(1_000, 2_200),
            event_flavor: "A crackdown on paperwork has forgers charging a premium.".to_string(),
        },
        Good {
            id: "lifted-jewelry".to_string(),
            name: "Lifted Jewelry".to_string(),
            category: GoodCategory::Luxury,
            desc: "Provenance: don't ask.".to_string(),
            base_price: 680,
            volatility: 0.6,
            availability: 0.65,
            event_chance: 0.06,
            normal_range: PriceRange::new(450, 900),
            event_range: PriceRange::new(1_500, 3_000),
            event_flavor: "Fences are flush after a museum job went loud.".to_string(),
        },
        Good {
            id: "bootleg-pressings".to_string(),
            name: "Bootleg Pressings".to_string(),
            category: GoodCategory::Vice,
            desc: "Live recordings nobody was supposed to keep.".to_string(),
            base_price: 16,
            volatility: 0.25,
            availability: 0.95,
            event_chance: 0.15,
            normal_range: PriceRange::new(8, 25),
            event_range: PriceRange::new(40, 90),
            event_flavor: "A seized warehouse made collectors frantic.".to_string(),
        },
    ]
}

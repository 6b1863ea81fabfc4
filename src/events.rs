//! Narrative event catalog, weighted selection, and materialization.
//!
//! Catalog events are immutable templates. Dynamically-priced templates
//! (weapon offers, police raids, negotiations) get their concrete
//! parameters rolled exactly once, in `materialize`; re-renders of the
//! same pending instance never re-roll.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::constants::{
    WEAPON_OFFER_HEAVY_CHANCE, WEAPON_OFFER_PRICE_MAX, WEAPON_OFFER_PRICE_MIN,
    WEAPON_OFFER_QTY_MAX,
};
use crate::effects::{EffectList, EventEffect};
use crate::npc::{builtin_fixer, builtin_quartermaster, NpcEncounter, NpcProfile};
use crate::police::PoliceEncounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Drawn when the player arrives somewhere.
    Travel,
    /// Drawn when the player ends the day.
    DayEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A windfall or other static-effect boon.
    Fortune,
    /// A static-effect loss: theft, spoilage, injury.
    Hazard,
    /// Pure flavor, no effects.
    Rumor,
    /// Interactive: a one-time arms purchase at a rolled price.
    WeaponOffer,
    /// Interactive: the police shakedown sub-engine.
    PoliceRaid,
    /// Interactive: an NPC with a fixed deal menu.
    NpcDeal,
}

impl EventKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Fortune => "fortune",
            Self::Hazard => "hazard",
            Self::Rumor => "rumor",
            Self::WeaponOffer => "weapon_offer",
            Self::PoliceRaid => "police_raid",
            Self::NpcDeal => "npc_deal",
        }
    }

    #[must_use]
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::WeaponOffer | Self::PoliceRaid | Self::NpcDeal)
    }
}

/// Declarative mutual-exclusion table. A weapon offer and a police raid
/// may not both be active within the same day; the overlapping modal
/// interactions would deadlock the turn.
#[must_use]
pub const fn kinds_conflict(a: EventKind, b: EventKind) -> bool {
    matches!(
        (a, b),
        (EventKind::WeaponOffer, EventKind::PoliceRaid)
            | (EventKind::PoliceRaid, EventKind::WeaponOffer)
    )
}

/// A catalog event template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: String,
    pub category: EventCategory,
    pub kind: EventKind,
    pub title: String,
    pub desc: String,
    pub sentiment: Sentiment,
    /// Relative likelihood within the filtered pool for one draw;
    /// weights are never normalized.
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub effects: EffectList,
    /// Human-readable impact summary, if the effects deserve one.
    #[serde(default)]
    pub impact: Option<String>,
    /// Embedded NPC descriptor for negotiation templates.
    #[serde(default)]
    pub npc: Option<NpcProfile>,
}

fn default_weight() -> u32 {
    5
}

/// Container for all event templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    pub events: Vec<GameEvent>,
}

impl Default for EventSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EventSet {
    #[must_use]
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    #[must_use]
    pub fn from_events(events: Vec<GameEvent>) -> Self {
        Self { events }
    }

    /// Load event templates from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid templates.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self {
            events: builtin_events(),
        }
    }
}

/// A template instance resolved at trigger time: day stamped, dynamic
/// parameters rolled, interactive sub-state attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub template_id: String,
    pub category: EventCategory,
    pub kind: EventKind,
    pub title: String,
    pub desc: String,
    pub sentiment: Sentiment,
    pub day: u32,
    pub effects: EffectList,
    pub impact: Option<String>,
    #[serde(default)]
    pub weapon_offer: Option<WeaponOffer>,
    #[serde(default)]
    pub police: Option<PoliceEncounter>,
    #[serde(default)]
    pub npc: Option<NpcEncounter>,
}

/// Concrete terms of a materialized arms offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponOffer {
    pub quantity: u32,
    pub unit_price: i64,
    /// Heavy pieces change the first shot of a firefight.
    pub heavy: bool,
}

/// Probability-weighted draw over the category's candidates.
///
/// Filters to the requested trigger category, drops kinds that conflict
/// with a currently pending special event, and walks weight slices in
/// catalog order under a uniform roll in `[0, total)`. Returns `None`
/// when no candidates remain or every weight is zero.
pub fn pick_event<'a, R: Rng>(
    set: &'a EventSet,
    category: EventCategory,
    pending: Option<EventKind>,
    rng: &mut R,
) -> Option<&'a GameEvent> {
    let candidates: Vec<&GameEvent> = set
        .events
        .iter()
        .filter(|event| event.category == category)
        .filter(|event| pending.map_or(true, |active| !kinds_conflict(active, event.kind)))
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let total_weight: u32 = candidates.iter().map(|event| event.weight).sum();
    if total_weight == 0 {
        return None;
    }

    let roll = rng.gen_range(0..total_weight);
    let mut cursor = 0;
    for event in &candidates {
        cursor += event.weight;
        if roll < cursor {
            debug!("event draw: {} (roll {roll}/{total_weight})", event.id);
            return Some(event);
        }
    }
    candidates.first().copied()
}

/// Fill a template's dynamic fields at trigger time. Static templates
/// pass through with the day stamped; special kinds roll their concrete
/// parameters here and nowhere else.
pub fn materialize<R: Rng>(
    template: &GameEvent,
    day: u32,
    cash: i64,
    armed: bool,
    rng: &mut R,
) -> ResolvedEvent {
    let mut resolved = ResolvedEvent {
        template_id: template.id.clone(),
        category: template.category,
        kind: template.kind,
        title: template.title.clone(),
        desc: template.desc.clone(),
        sentiment: template.sentiment,
        day,
        effects: template.effects.clone(),
        impact: template.impact.clone(),
        weapon_offer: None,
        police: None,
        npc: None,
    };

    match template.kind {
        EventKind::WeaponOffer => {
            let quantity = rng.gen_range(1..=WEAPON_OFFER_QTY_MAX);
            let unit_price = rng.gen_range(WEAPON_OFFER_PRICE_MIN..=WEAPON_OFFER_PRICE_MAX);
            let heavy = rng.gen_bool(WEAPON_OFFER_HEAVY_CHANCE);
            let piece = if heavy { "heavy piece" } else { "piece" };
            resolved.desc = format!(
                "{} He can let {quantity} {piece}{} go for ${unit_price} each.",
                template.desc,
                if quantity == 1 { "" } else { "s" },
            );
            resolved.impact = Some(format!("${unit_price} per weapon, {quantity} on offer"));
            resolved.weapon_offer = Some(WeaponOffer {
                quantity,
                unit_price,
                heavy,
            });
        }
        EventKind::PoliceRaid => {
            let police = PoliceEncounter::roll(cash, armed, rng);
            resolved.desc = format!(
                "{} {} officer{} block the exits.",
                template.desc,
                police.officers,
                if police.officers == 1 { "" } else { "s" },
            );
            resolved.impact = Some(format!("bribe demand ${}", police.bribe_demand));
            resolved.police = Some(police);
        }
        EventKind::NpcDeal => {
            if let Some(profile) = &template.npc {
                resolved.npc = Some(NpcEncounter::new(profile.clone()));
            }
        }
        EventKind::Fortune | EventKind::Hazard | EventKind::Rumor => {}
    }

    resolved
}

#[allow(clippy::too_many_lines)]
fn builtin_events() -> Vec<GameEvent> {
    vec![
        GameEvent {
            id: "pickpocket".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::Hazard,
            title: "Pickpocket".to_string(),
            desc: "A stranger bumps into you at the crossing. Your roll is lighter.".to_string(),
            sentiment: Sentiment::Negative,
            weight: 8,
            effects: smallvec![EventEffect::Cash { amount: -150 }],
            impact: Some("-$150 cash".to_string()),
            npc: None,
        },
        GameEvent {
            id: "dropped-satchel".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::Fortune,
            title: "Dropped Satchel".to_string(),
            desc: "Someone left in a hurry. The satchel under the bench did not.".to_string(),
            sentiment: Sentiment::Positive,
            weight: 6,
            effects: smallvec![EventEffect::Cash { amount: 200 }],
            impact: Some("+$200 cash".to_string()),
            npc: None,
        },
        GameEvent {
            id: "checkpoint-shakeup".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::Hazard,
            title: "Checkpoint Shakeup".to_string(),
            desc: "A surprise checkpoint. You ditch part of the cargo to walk through clean."
                .to_string(),
            sentiment: Sentiment::Negative,
            weight: 5,
            effects: smallvec![EventEffect::Inventory { amount: -5 }],
            impact: Some("lost up to 5 units of cargo".to_string()),
            npc: None,
        },
        GameEvent {
            id: "street-tip".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::Rumor,
            title: "Street Tip".to_string(),
            desc: "A runner swears the clinics are buying again. Could be nothing.".to_string(),
            sentiment: Sentiment::Neutral,
            weight: 8,
            effects: smallvec![],
            impact: None,
            npc: None,
        },
        GameEvent {
            id: "bad-fall".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::Hazard,
            title: "Bad Fall".to_string(),
            desc: "The shortcut over the canal wall was not a shortcut.".to_string(),
            sentiment: Sentiment::Negative,
            weight: 4,
            effects: smallvec![EventEffect::Health { amount: -10 }],
            impact: Some("-10 health".to_string()),
            npc: None,
        },
        GameEvent {
            id: "gun-runner".to_string(),
            category: EventCategory::Travel,
            kind: EventKind::WeaponOffer,
            title: "Gun Runner".to_string(),
            desc: "A man with a long coat and a longer price list catches your eye.".to_string(),
            sentiment: Sentiment::Neutral,
            weight: 4,
            effects: smallvec![],
            impact: None,
            npc: None,
        },
        GameEvent {
            id: "debt-collector".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::Hazard,
            title: "Debt Collector".to_string(),
            desc: "The shark's bookkeeper finds you. Late fees, he calls them.".to_string(),
            sentiment: Sentiment::Negative,
            weight: 6,
            effects: smallvec![EventEffect::Debt { amount: 250 }],
            impact: Some("+$250 debt".to_string()),
            npc: None,
        },
        GameEvent {
            id: "warehouse-rats".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::Hazard,
            title: "Warehouse Rats".to_string(),
            desc: "Something chewed through a crate overnight.".to_string(),
            sentiment: Sentiment::Negative,
            weight: 6,
            effects: smallvec![EventEffect::Inventory { amount: -8 }],
            impact: Some("lost up to 8 units of cargo".to_string()),
            npc: None,
        },
        GameEvent {
            id: "grateful-lodger".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::Fortune,
            title: "Grateful Lodger".to_string(),
            desc: "The old man you let sleep in the stairwell slips money under your door."
                .to_string(),
            sentiment: Sentiment::Positive,
            weight: 5,
            effects: smallvec![EventEffect::Cash { amount: 100 }],
            impact: Some("+$100 cash".to_string()),
            npc: None,
        },
        GameEvent {
            id: "spare-lockup".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::Fortune,
            title: "Spare Lockup".to_string(),
            desc: "A neighbor skips town and leaves you the key to their cellar.".to_string(),
            sentiment: Sentiment::Positive,
            weight: 3,
            effects: smallvec![EventEffect::Capacity { amount: 10 }],
            impact: Some("+10 capacity".to_string()),
            npc: None,
        },
        GameEvent {
            id: "customs-sweep".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::PoliceRaid,
            title: "Customs Sweep".to_string(),
            desc: "Boots on the stairs. The sweep found your floor.".to_string(),
            sentiment: Sentiment::Negative,
            weight: 5,
            effects: smallvec![],
            impact: None,
            npc: None,
        },
        GameEvent {
            id: "the-fixer".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::NpcDeal,
            title: "The Fixer".to_string(),
            desc: "A knock, two taps, a pause. The Fixer lets herself in with a proposition."
                .to_string(),
            sentiment: Sentiment::Neutral,
            weight: 4,
            effects: smallvec![],
            impact: None,
            npc: Some(builtin_fixer()),
        },
        GameEvent {
            id: "the-quartermaster".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::NpcDeal,
            title: "The Quartermaster".to_string(),
            desc: "The Quartermaster spreads a tarp and starts laying out merchandise."
                .to_string(),
            sentiment: Sentiment::Neutral,
            weight: 3,
            effects: smallvec![],
            impact: None,
            npc: Some(builtin_quartermaster()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn builtin_set_covers_both_categories() {
        let set = EventSet::builtin();
        assert!(set
            .events
            .iter()
            .any(|event| event.category == EventCategory::Travel));
        assert!(set
            .events
            .iter()
            .any(|event| event.category == EventCategory::DayEnd));
        assert!(set
            .events
            .iter()
            .any(|event| event.kind == EventKind::PoliceRaid));
        assert!(set
            .events
            .iter()
            .any(|event| event.kind == EventKind::WeaponOffer));
    }

    #[test]
    fn pick_event_filters_by_category() {
        let set = EventSet::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        for _ in 0..200 {
            if let Some(event) = pick_event(&set, EventCategory::Travel, None, &mut rng) {
                assert_eq!(event.category, EventCategory::Travel);
            }
        }
    }

    #[test]
    fn pending_weapon_offer_excludes_police_raids() {
        let set = EventSet::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        for _ in 0..2_000 {
            let picked = pick_event(
                &set,
                EventCategory::DayEnd,
                Some(EventKind::WeaponOffer),
                &mut rng,
            );
            if let Some(event) = picked {
                assert_ne!(event.kind, EventKind::PoliceRaid);
            }
        }
    }

    #[test]
    fn pending_police_raid_excludes_weapon_offers() {
        let set = EventSet::builtin();
        let mut rng = ChaCha20Rng::seed_from_u64(29);
        for _ in 0..2_000 {
            let picked = pick_event(
                &set,
                EventCategory::Travel,
                Some(EventKind::PoliceRaid),
                &mut rng,
            );
            if let Some(event) = picked {
                assert_ne!(event.kind, EventKind::WeaponOffer);
            }
        }
    }

    #[test]
    fn empty_pool_yields_no_event() {
        let set = EventSet::empty();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(pick_event(&set, EventCategory::Travel, None, &mut rng).is_none());
    }

    #[test]
    fn weighted_draw_is_reproducible() {
        let set = EventSet::builtin();
        let mut first = ChaCha20Rng::seed_from_u64(404);
        let mut second = ChaCha20Rng::seed_from_u64(404);
        for _ in 0..50 {
            let a = pick_event(&set, EventCategory::DayEnd, None, &mut first).map(|e| e.id.clone());
            let b =
                pick_event(&set, EventCategory::DayEnd, None, &mut second).map(|e| e.id.clone());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn materialize_stamps_day_and_keeps_static_effects() {
        let set = EventSet::builtin();
        let template = set
            .events
            .iter()
            .find(|event| event.id == "pickpocket")
            .expect("template exists");
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let resolved = materialize(template, 14, 2_000, false, &mut rng);
        assert_eq!(resolved.day, 14);
        assert_eq!(resolved.effects, template.effects);
        assert!(resolved.police.is_none());
        assert!(resolved.weapon_offer.is_none());
    }

    #[test]
    fn materialized_weapon_offer_rolls_terms_once() {
        let set = EventSet::builtin();
        let template = set
            .events
            .iter()
            .find(|event| event.kind == EventKind::WeaponOffer)
            .expect("offer template exists");
        let mut rng = ChaCha20Rng::seed_from_u64(77);
        let resolved = materialize(template, 3, 2_000, false, &mut rng);
        let offer = resolved.weapon_offer.expect("terms rolled");
        assert!((1..=WEAPON_OFFER_QTY_MAX).contains(&offer.quantity));
        assert!((WEAPON_OFFER_PRICE_MIN..=WEAPON_OFFER_PRICE_MAX).contains(&offer.unit_price));
        assert!(resolved.desc.contains(&format!("${}", offer.unit_price)));
        // The resolved instance owns its terms; nothing re-rolls on re-read.
        let again = resolved.clone();
        assert_eq!(again.weapon_offer, resolved.weapon_offer);
    }

    #[test]
    fn materialized_raid_embeds_encounter_state() {
        let set = EventSet::builtin();
        let template = set
            .events
            .iter()
            .find(|event| event.kind == EventKind::PoliceRaid)
            .expect("raid template exists");
        let mut rng = ChaCha20Rng::seed_from_u64(55);
        let resolved = materialize(template, 8, 4_000, true, &mut rng);
        let police = resolved.police.expect("encounter rolled");
        assert!(police.officers >= 1);
        assert!(police.bribe_demand >= 100);
        assert!(police.armed_at_start);
    }
}

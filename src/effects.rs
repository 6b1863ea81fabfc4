//! Typed event effects and their application to the player aggregate.
//!
//! `apply_effects` is a total function: every effect produces a defined
//! result for every reachable state, including zero cash and an empty
//! inventory. Effects apply in list order; later effects see the results
//! of earlier ones.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::HEALTH_MAX;
use crate::state::PlayerState;

/// Events carry at most a handful of effects.
pub type EffectList = SmallVec<[EventEffect; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    /// Cash delta, floored at zero.
    Cash { amount: i64 },
    /// Debt delta, floored at zero.
    Debt { amount: i64 },
    /// Health delta, clamped into 0..=100.
    Health { amount: i32 },
    /// Capacity delta. Capacity only grows through this path, so there is
    /// no upper clamp.
    Capacity { amount: i32 },
    /// Weapon-count delta, floored at zero.
    Guns { amount: i32 },
    /// Inventory shrinkage: `|amount|` units are torn out of one randomly
    /// chosen entry, not spread across the whole inventory. Only the
    /// everything-lost case touches more than one entry.
    Inventory { amount: i32 },
}

pub fn apply_effects(state: &mut PlayerState, effects: &[EventEffect]) {
    for effect in effects {
        apply_one(state, *effect);
    }
}

fn apply_one(state: &mut PlayerState, effect: EventEffect) {
    match effect {
        EventEffect::Cash { amount } => {
            state.cash = state.cash.saturating_add(amount).max(0);
        }
        EventEffect::Debt { amount } => {
            state.debt = state.debt.saturating_add(amount).max(0);
        }
        EventEffect::Health { amount } => {
            state.health = state.health.saturating_add(amount).clamp(0, HEALTH_MAX);
        }
        EventEffect::Capacity { amount } => {
            let widened = i64::from(state.capacity) + i64::from(amount);
            state.capacity = u32::try_from(widened.max(0)).unwrap_or(u32::MAX);
        }
        EventEffect::Guns { amount } => {
            let widened = i64::from(state.guns) + i64::from(amount);
            state.guns = u32::try_from(widened.max(0)).unwrap_or(u32::MAX);
        }
        EventEffect::Inventory { amount } => {
            if amount < 0 {
                shrink_inventory(state, amount.unsigned_abs());
            }
        }
    }
}

fn shrink_inventory(state: &mut PlayerState, count: u32) {
    let total = state.total_inventory();
    if total == 0 || count == 0 {
        return;
    }
    if count >= total {
        state.inventory.clear();
        return;
    }
    let idx = match state.rng.as_mut() {
        Some(rng) => rng.gen_range(0..state.inventory.len()),
        None => 0,
    };
    let Some(entry) = state.inventory.get_mut(idx) else {
        return;
    };
    entry.quantity = entry.quantity.saturating_sub(count);
    if entry.quantity == 0 {
        state.inventory.remove(idx);
    }
}

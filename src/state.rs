//! The root mutable aggregate: one player, one game.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::constants::{
    EVENT_HISTORY_MAX, LOG_GAME_START, START_BANK, START_CAPACITY, START_CASH, START_DEBT,
    START_HEALTH, TOTAL_DAYS,
};
use crate::constants::{BANK_RATE_PCT, DEBT_RATE_PCT};
use crate::events::{EventKind, EventSet, ResolvedEvent};
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::prices::{generate_prices, PriceBoard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    NotStarted,
    InProgress,
    Ended,
}

/// Transient sub-phase inside an in-progress day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnStep {
    #[default]
    Traveling,
    Trading,
}

/// One held good. Zero-quantity entries are pruned immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub good_id: String,
    pub quantity: u32,
    /// Quantity-weighted average purchase price; only changes on acquisition.
    pub avg_cost: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Buy,
    Sell,
}

/// Append-only trade record, used for historical reconstruction and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub kind: TransactionKind,
    pub good_id: String,
    pub good_name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
    pub day: u32,
    pub location_id: Option<String>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub phase: GamePhase,
    pub step: TurnStep,
    pub seed: u64,
    pub day: u32,
    pub total_days: u32,
    pub cash: i64,
    /// Fixed reference for profit and growth-rate math.
    pub starting_cash: i64,
    pub bank: i64,
    pub bank_rate_pct: u32,
    pub debt: i64,
    /// Fixed reference for the reconstructed net-worth series.
    pub starting_debt: i64,
    pub debt_rate_pct: u32,
    pub health: i32,
    pub guns: u32,
    /// Set when a heavy weapon offer has been accepted.
    pub heavy_weapon: bool,
    pub capacity: u32,
    /// Nullable before the first travel of a game.
    pub location_id: Option<String>,
    pub prices: PriceBoard,
    pub inventory: Vec<InventoryEntry>,
    pub transactions: Vec<Transaction>,
    pub event_history: Vec<ResolvedEvent>,
    pub visits: HashMap<String, u32>,
    /// Mutual-exclusion gate: no draw and no day progression while set.
    pub pending_event: Option<ResolvedEvent>,
    pub day_end_event_rolled: bool,
    pub logs: Vec<String>,
    pub next_txn_id: u64,
    #[serde(skip)]
    pub catalog: Catalog,
    #[serde(skip)]
    pub events: EventSet,
    #[serde(skip)]
    pub rng: Option<ChaCha20Rng>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            phase: GamePhase::NotStarted,
            step: TurnStep::Traveling,
            seed: 0,
            day: 1,
            total_days: TOTAL_DAYS,
            cash: START_CASH,
            starting_cash: START_CASH,
            bank: START_BANK,
            bank_rate_pct: BANK_RATE_PCT,
            debt: START_DEBT,
            starting_debt: START_DEBT,
            debt_rate_pct: DEBT_RATE_PCT,
            health: START_HEALTH,
            guns: 0,
            heavy_weapon: false,
            capacity: START_CAPACITY,
            location_id: None,
            prices: PriceBoard::default(),
            inventory: Vec::new(),
            transactions: Vec::new(),
            event_history: Vec::new(),
            visits: HashMap::new(),
            pending_event: None,
            day_end_event_rolled: false,
            logs: Vec::new(),
            next_txn_id: 1,
            catalog: Catalog::default(),
            events: EventSet::default(),
            rng: None,
        }
    }
}

impl PlayerState {
    /// Start a brand new game with fixed defaults and day-1 prices.
    /// Day-1 prices carry no location multiplier; none has been visited yet.
    #[must_use]
    pub fn new_game(seed: u64) -> Self {
        let mut state = Self {
            phase: GamePhase::InProgress,
            seed,
            rng: Some(ChaCha20Rng::seed_from_u64(seed)),
            ..Self::default()
        };
        if let Some(rng) = state.rng.as_mut() {
            state.prices = generate_prices(&state.catalog.goods, None, rng);
        }
        state.logs.push(String::from(LOG_GAME_START));
        state
    }

    /// Replace the builtin catalogs, regenerating day-1 prices so the board
    /// matches the data actually in play.
    #[must_use]
    pub fn with_data(mut self, catalog: Catalog, events: EventSet) -> Self {
        self.catalog = catalog;
        self.events = events;
        if self.phase == GamePhase::InProgress && self.day == 1 {
            if let Some(rng) = self.rng.as_mut() {
                self.prices = generate_prices(&self.catalog.goods, None, rng);
            }
        }
        self
    }

    /// Restore the skip-serialized fields after a load.
    #[must_use]
    pub fn rehydrate(mut self, catalog: Catalog, events: EventSet) -> Self {
        self.rng = Some(ChaCha20Rng::seed_from_u64(self.seed));
        self.catalog = catalog;
        self.events = events;
        self
    }

    /// Total units held across all inventory entries.
    #[must_use]
    pub fn total_inventory(&self) -> u32 {
        self.inventory.iter().map(|entry| entry.quantity).sum()
    }

    #[must_use]
    pub fn entry(&self, good_id: &str) -> Option<&InventoryEntry> {
        self.inventory.iter().find(|entry| entry.good_id == good_id)
    }

    #[must_use]
    pub fn held_quantity(&self, good_id: &str) -> u32 {
        self.entry(good_id).map_or(0, |entry| entry.quantity)
    }

    /// Add units of a good, recomputing the weighted-average cost basis.
    /// Capacity and funds checks belong to the transaction engine; this is
    /// pure bookkeeping.
    pub(crate) fn add_units(&mut self, good_id: &str, quantity: u32, unit_price: i64) {
        if quantity == 0 {
            return;
        }
        if let Some(entry) = self
            .inventory
            .iter_mut()
            .find(|entry| entry.good_id == good_id)
        {
            let old_qty = i64_to_f64(i64::from(entry.quantity));
            let new_qty = i64_to_f64(i64::from(quantity));
            let blended = (i64_to_f64(entry.avg_cost) * old_qty + i64_to_f64(unit_price) * new_qty)
                / (old_qty + new_qty);
            entry.avg_cost = round_f64_to_i64(blended);
            entry.quantity += quantity;
        } else {
            self.inventory.push(InventoryEntry {
                good_id: good_id.to_string(),
                quantity,
                avg_cost: unit_price,
            });
        }
    }

    /// Remove units of a good, pruning the entry at zero. Returns false
    /// when fewer units are held than requested; nothing changes then.
    pub(crate) fn remove_units(&mut self, good_id: &str, quantity: u32) -> bool {
        let Some(entry) = self
            .inventory
            .iter_mut()
            .find(|entry| entry.good_id == good_id)
        else {
            return false;
        };
        if entry.quantity < quantity {
            return false;
        }
        entry.quantity -= quantity;
        if entry.quantity == 0 {
            self.inventory.retain(|entry| entry.good_id != good_id);
        }
        true
    }

    pub(crate) fn record_transaction(
        &mut self,
        kind: TransactionKind,
        good_id: &str,
        quantity: u32,
        unit_price: i64,
    ) {
        let total = unit_price.saturating_mul(i64::from(quantity));
        let record = Transaction {
            id: self.next_txn_id,
            kind,
            good_id: good_id.to_string(),
            good_name: self.catalog.good_name(good_id),
            quantity,
            unit_price,
            total,
            day: self.day,
            location_id: self.location_id.clone(),
        };
        self.next_txn_id += 1;
        self.transactions.push(record);
    }

    pub(crate) fn push_event_history(&mut self, event: ResolvedEvent) {
        if self.event_history.len() >= EVENT_HISTORY_MAX {
            self.event_history.remove(0);
        }
        self.event_history.push(event);
    }

    /// Sync the history copy of the pending event after interactive
    /// encounters mutate it in place.
    pub(crate) fn sync_pending_into_history(&mut self) {
        let Some(pending) = self.pending_event.clone() else {
            return;
        };
        if let Some(slot) = self
            .event_history
            .iter_mut()
            .rev()
            .find(|recorded| recorded.template_id == pending.template_id && recorded.day == pending.day)
        {
            *slot = pending;
        }
    }

    #[must_use]
    pub fn pending_kind(&self) -> Option<EventKind> {
        self.pending_event.as_ref().map(|event| event.kind)
    }

    /// Net worth: cash + bank - debt, the primary scoring quantity.
    #[must_use]
    pub fn net_worth(&self) -> i64 {
        self.cash + self.bank - self.debt
    }

    /// Narrative for an unusual quote, when the good is in an active event.
    #[must_use]
    pub fn price_flavor(&self, good_id: &str) -> Option<&str> {
        if !self.prices.is_event_active(good_id) {
            return None;
        }
        self.catalog
            .good(good_id)
            .map(|good| good.event_flavor.as_str())
    }

    #[must_use]
    pub fn visits_to(&self, location_id: &str) -> u32 {
        self.visits.get(location_id).copied().unwrap_or(0)
    }
}

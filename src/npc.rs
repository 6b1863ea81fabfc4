//! NPC encounters and their fixed deal menus.
//!
//! An NPC event offers a short menu of take-it-or-leave-it deals. The
//! player may execute at most one; prices are the NPC's own and ignore
//! the day's market board.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{HEALTH_MAX, LOG_DEAL_PREFIX};
use crate::numbers::{i64_to_f64, round_f64_to_i64, u32_to_f64};
use crate::state::{PlayerState, TransactionKind};
use crate::trade::TradeError;

/// Static NPC descriptor carried on the event template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcProfile {
    pub id: String,
    pub name: String,
    pub greeting: String,
    pub deals: Vec<Deal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: DealKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "deal", rename_all = "snake_case")]
pub enum DealKind {
    /// The NPC sells goods to the player at a stated price.
    SellGoods {
        good_id: String,
        quantity: u32,
        unit_price: i64,
    },
    /// The NPC buys goods off the player at a stated price.
    BuyGoods {
        good_id: String,
        quantity: u32,
        unit_price: i64,
    },
    /// Straight barter, no cash involved.
    SwapGoods {
        give_good_id: String,
        give_quantity: u32,
        get_good_id: String,
        get_quantity: u32,
    },
    /// Pay cash to strike part of the debt.
    DebtRelief { amount: i64, price: i64 },
    /// Pay cash for permanent extra carrying space.
    CapacityBoost { amount: u32, price: i64 },
    /// Pay cash to restore health to full.
    FullHeal { price: i64 },
}

/// Live negotiation state, embedded in the triggering event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcEncounter {
    pub profile: NpcProfile,
    pub completed: bool,
    pub executed_deal: Option<String>,
}

impl NpcEncounter {
    #[must_use]
    pub fn new(profile: NpcProfile) -> Self {
        Self {
            profile,
            completed: false,
            executed_deal: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DealError {
    #[error("no negotiation is pending")]
    NoEncounter,
    #[error("the negotiation is already settled")]
    AlreadyCompleted,
    #[error("unknown deal: {0}")]
    UnknownDeal(String),
    #[error("the deal does not apply right now")]
    Unavailable,
    #[error(transparent)]
    Trade(#[from] TradeError),
}

/// Whether a deal is worth presenting in the player's current situation.
/// Executing an unavailable deal is rejected with the same rule.
#[must_use]
pub fn deal_available(state: &PlayerState, deal: &Deal) -> bool {
    match &deal.kind {
        DealKind::SellGoods { .. } | DealKind::CapacityBoost { .. } => true,
        DealKind::BuyGoods {
            good_id, quantity, ..
        } => state.held_quantity(good_id) >= *quantity,
        DealKind::SwapGoods {
            give_good_id,
            give_quantity,
            ..
        } => state.held_quantity(give_good_id) >= *give_quantity,
        DealKind::DebtRelief { .. } => state.debt > 0,
        DealKind::FullHeal { .. } => state.health < HEALTH_MAX,
    }
}

/// Execute one deal from the pending NPC encounter. At most one deal
/// per encounter; success settles the negotiation.
///
/// # Errors
///
/// Fails when no negotiation is pending, the deal id is unknown, the
/// deal does not apply, the encounter is already settled, or the player
/// cannot cover the deal's cash, cargo, or capacity requirements.
pub fn execute_deal(state: &mut PlayerState, deal_id: &str) -> Result<(), DealError> {
    let encounter = state
        .pending_event
        .as_ref()
        .and_then(|event| event.npc.as_ref())
        .ok_or(DealError::NoEncounter)?;
    if encounter.completed {
        return Err(DealError::AlreadyCompleted);
    }
    let deal = encounter
        .profile
        .deals
        .iter()
        .find(|deal| deal.id == deal_id)
        .cloned()
        .ok_or_else(|| DealError::UnknownDeal(deal_id.to_string()))?;
    if !deal_available(state, &deal) {
        return Err(DealError::Unavailable);
    }

    apply_deal(state, &deal)?;

    if let Some(encounter) = state
        .pending_event
        .as_mut()
        .and_then(|event| event.npc.as_mut())
    {
        encounter.completed = true;
        encounter.executed_deal = Some(deal.id.clone());
    }
    state.logs.push(format!("{LOG_DEAL_PREFIX}{}", deal.id));
    state.sync_pending_into_history();
    Ok(())
}

fn apply_deal(state: &mut PlayerState, deal: &Deal) -> Result<(), DealError> {
    match &deal.kind {
        DealKind::SellGoods {
            good_id,
            quantity,
            unit_price,
        } => {
            let cost = unit_price.saturating_mul(i64::from(*quantity));
            if cost > state.cash {
                return Err(TradeError::InsufficientFunds {
                    required: cost,
                    available: state.cash,
                }
                .into());
            }
            let free_space = state.capacity.saturating_sub(state.total_inventory());
            if *quantity > free_space {
                return Err(TradeError::InsufficientCapacity {
                    required: *quantity,
                    available: free_space,
                }
                .into());
            }
            state.cash -= cost;
            state.add_units(good_id, *quantity, *unit_price);
            state.record_transaction(TransactionKind::Buy, good_id, *quantity, *unit_price);
        }
        DealKind::BuyGoods {
            good_id,
            quantity,
            unit_price,
        } => {
            if !state.remove_units(good_id, *quantity) {
                return Err(TradeError::InsufficientInventory {
                    held: state.held_quantity(good_id),
                    requested: *quantity,
                }
                .into());
            }
            state.cash += unit_price.saturating_mul(i64::from(*quantity));
            state.record_transaction(TransactionKind::Sell, good_id, *quantity, *unit_price);
        }
        DealKind::SwapGoods {
            give_good_id,
            give_quantity,
            get_good_id,
            get_quantity,
        } => {
            let held = state.held_quantity(give_good_id);
            if held < *give_quantity {
                return Err(TradeError::InsufficientInventory {
                    held,
                    requested: *give_quantity,
                }
                .into());
            }
            let free_after_give =
                state.capacity.saturating_sub(state.total_inventory()) + give_quantity;
            if *get_quantity > free_after_give {
                return Err(TradeError::InsufficientCapacity {
                    required: *get_quantity,
                    available: free_after_give,
                }
                .into());
            }
            // Received units inherit the book value of what was traded away.
            let give_cost = state
                .entry(give_good_id)
                .map_or(0, |entry| entry.avg_cost);
            let inherited = if *get_quantity == 0 {
                0
            } else {
                round_f64_to_i64(
                    i64_to_f64(give_cost) * u32_to_f64(*give_quantity)
                        / u32_to_f64(*get_quantity),
                )
            };
            state.remove_units(give_good_id, *give_quantity);
            state.add_units(get_good_id, *get_quantity, inherited);
        }
        DealKind::DebtRelief { amount, price } => {
            take_cash(state, *price)?;
            state.debt = (state.debt - amount).max(0);
        }
        DealKind::CapacityBoost { amount, price } => {
            take_cash(state, *price)?;
            state.capacity += amount;
        }
        DealKind::FullHeal { price } => {
            take_cash(state, *price)?;
            state.health = HEALTH_MAX;
        }
    }
    Ok(())
}

fn take_cash(state: &mut PlayerState, price: i64) -> Result<(), DealError> {
    if price > state.cash {
        return Err(TradeError::InsufficientFunds {
            required: price,
            available: state.cash,
        }
        .into());
    }
    state.cash -= price;
    Ok(())
}

#[must_use]
pub fn builtin_fixer() -> NpcProfile {
    NpcProfile {
        id: "fixer".to_string(),
        name: "The Fixer".to_string(),
        greeting: "Everything has a price, and tonight the prices are mine.".to_string(),
        deals: vec![
            Deal {
                id: "fixer-debt-cut".to_string(),
                label: "She can make a third of the shark's ledger disappear.".to_string(),
                kind: DealKind::DebtRelief {
                    amount: 2_000,
                    price: 1_200,
                },
            },
            Deal {
                id: "fixer-patch-up".to_string(),
                label: "She knows a discreet doctor who works nights.".to_string(),
                kind: DealKind::FullHeal { price: 600 },
            },
            Deal {
                id: "fixer-permit-swap".to_string(),
                label: "Two crates of spirits for a forged permit, straight across.".to_string(),
                kind: DealKind::SwapGoods {
                    give_good_id: "untaxed-spirits".to_string(),
                    give_quantity: 20,
                    get_good_id: "forged-permits".to_string(),
                    get_quantity: 1,
                },
            },
        ],
    }
}

#[must_use]
pub fn builtin_quartermaster() -> NpcProfile {
    NpcProfile {
        id: "quartermaster".to_string(),
        name: "The Quartermaster".to_string(),
        greeting: "Fell off a truck. The truck fell off a ship. Interested?".to_string(),
        deals: vec![
            Deal {
                id: "qm-cheap-circuitry".to_string(),
                label: "Crated circuitry, well under street price.".to_string(),
                kind: DealKind::SellGoods {
                    good_id: "hot-circuitry".to_string(),
                    quantity: 4,
                    unit_price: 180,
                },
            },
            Deal {
                id: "qm-bulk-spirits".to_string(),
                label: "He takes spirits in volume, cash on the spot.".to_string(),
                kind: DealKind::BuyGoods {
                    good_id: "untaxed-spirits".to_string(),
                    quantity: 15,
                    unit_price: 50,
                },
            },
            Deal {
                id: "qm-false-floor".to_string(),
                label: "A false floor for the cart. Room for twenty more.".to_string(),
                kind: DealKind::CapacityBoost {
                    amount: 20,
                    price: 900,
                },
            },
        ],
    }
}

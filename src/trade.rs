//! Market transactions and money movement.
//!
//! Every operation here validates completely before touching the
//! aggregate. A rejected transaction leaves the player state unchanged,
//! including the transaction journal and logs.

use log::debug;
use thiserror::Error;

use crate::constants::{
    LOG_BANK_DEPOSIT, LOG_BANK_WITHDRAW, LOG_DEBT_PAYMENT, LOG_TRADE_BUY, LOG_TRADE_SELL,
    LOG_WEAPON_BOUGHT,
};
use crate::state::{GamePhase, PlayerState, TransactionKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeError {
    #[error("no game in progress")]
    GameNotActive,
    #[error("unknown good: {0}")]
    UnknownGood(String),
    #[error("{0} is off the market today")]
    NotOnMarket(String),
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("need ${required}, have ${available}")]
    InsufficientFunds { required: i64, available: i64 },
    #[error("need {required} units of space, have {available}")]
    InsufficientCapacity { required: u32, available: u32 },
    #[error("holding {held} units, tried to move {requested}")]
    InsufficientInventory { held: u32, requested: u32 },
    #[error("payment of ${offered} exceeds debt of ${owed}")]
    OverpaymentRejected { offered: i64, owed: i64 },
}

fn require_active(state: &PlayerState) -> Result<(), TradeError> {
    if state.phase == GamePhase::InProgress {
        Ok(())
    } else {
        Err(TradeError::GameNotActive)
    }
}

fn quoted_price(state: &PlayerState, good_id: &str) -> Result<i64, TradeError> {
    if state.catalog.good(good_id).is_none() {
        return Err(TradeError::UnknownGood(good_id.to_string()));
    }
    state
        .prices
        .quote(good_id)
        .ok_or_else(|| TradeError::NotOnMarket(good_id.to_string()))
}

/// Buy `quantity` units of a good at today's quote.
///
/// # Errors
///
/// Rejects zero quantities, goods missing from the catalog or today's
/// market, purchases the player cannot pay for, and purchases that would
/// overflow remaining capacity.
pub fn buy(state: &mut PlayerState, good_id: &str, quantity: u32) -> Result<(), TradeError> {
    require_active(state)?;
    if quantity == 0 {
        return Err(TradeError::InvalidAmount);
    }
    let unit_price = quoted_price(state, good_id)?;
    let cost = unit_price.saturating_mul(i64::from(quantity));
    if cost > state.cash {
        return Err(TradeError::InsufficientFunds {
            required: cost,
            available: state.cash,
        });
    }
    let free_space = state.capacity.saturating_sub(state.total_inventory());
    if quantity > free_space {
        return Err(TradeError::InsufficientCapacity {
            required: quantity,
            available: free_space,
        });
    }

    state.cash -= cost;
    state.add_units(good_id, quantity, unit_price);
    state.record_transaction(TransactionKind::Buy, good_id, quantity, unit_price);
    state.logs.push(String::from(LOG_TRADE_BUY));
    debug!("bought {quantity} x {good_id} at ${unit_price}");
    Ok(())
}

/// Sell `quantity` units of a held good at today's quote.
///
/// # Errors
///
/// Rejects zero quantities, goods off today's market, and sales of more
/// units than are held.
pub fn sell(state: &mut PlayerState, good_id: &str, quantity: u32) -> Result<(), TradeError> {
    require_active(state)?;
    if quantity == 0 {
        return Err(TradeError::InvalidAmount);
    }
    let unit_price = quoted_price(state, good_id)?;
    let held = state.held_quantity(good_id);
    if quantity > held {
        return Err(TradeError::InsufficientInventory {
            held,
            requested: quantity,
        });
    }

    state.remove_units(good_id, quantity);
    state.cash += unit_price.saturating_mul(i64::from(quantity));
    state.record_transaction(TransactionKind::Sell, good_id, quantity, unit_price);
    state.logs.push(String::from(LOG_TRADE_SELL));
    debug!("sold {quantity} x {good_id} at ${unit_price}");
    Ok(())
}

/// Move cash into the interest-bearing bank account.
///
/// # Errors
///
/// Rejects non-positive amounts and amounts above cash on hand.
pub fn deposit(state: &mut PlayerState, amount: i64) -> Result<(), TradeError> {
    require_active(state)?;
    if amount <= 0 {
        return Err(TradeError::InvalidAmount);
    }
    if amount > state.cash {
        return Err(TradeError::InsufficientFunds {
            required: amount,
            available: state.cash,
        });
    }
    state.cash -= amount;
    state.bank += amount;
    state.logs.push(String::from(LOG_BANK_DEPOSIT));
    Ok(())
}

/// Move banked money back into cash.
///
/// # Errors
///
/// Rejects non-positive amounts and amounts above the bank balance.
pub fn withdraw(state: &mut PlayerState, amount: i64) -> Result<(), TradeError> {
    require_active(state)?;
    if amount <= 0 {
        return Err(TradeError::InvalidAmount);
    }
    if amount > state.bank {
        return Err(TradeError::InsufficientFunds {
            required: amount,
            available: state.bank,
        });
    }
    state.bank -= amount;
    state.cash += amount;
    state.logs.push(String::from(LOG_BANK_WITHDRAW));
    Ok(())
}

/// Pay down the loan-shark debt from cash.
///
/// # Errors
///
/// Rejects non-positive amounts, payments above cash on hand, and
/// payments above what is actually owed.
pub fn pay_debt(state: &mut PlayerState, amount: i64) -> Result<(), TradeError> {
    require_active(state)?;
    if amount <= 0 {
        return Err(TradeError::InvalidAmount);
    }
    if amount > state.cash {
        return Err(TradeError::InsufficientFunds {
            required: amount,
            available: state.cash,
        });
    }
    if amount > state.debt {
        return Err(TradeError::OverpaymentRejected {
            offered: amount,
            owed: state.debt,
        });
    }
    state.cash -= amount;
    state.debt -= amount;
    state.logs.push(String::from(LOG_DEBT_PAYMENT));
    Ok(())
}

/// Buy weapons outright at a stated unit price. The interactive offer
/// path funnels through here after its terms are fixed.
///
/// # Errors
///
/// Rejects zero quantities and purchases the player cannot pay for.
pub fn buy_weapons(
    state: &mut PlayerState,
    quantity: u32,
    unit_price: i64,
    heavy: bool,
) -> Result<(), TradeError> {
    require_active(state)?;
    if quantity == 0 || unit_price < 0 {
        return Err(TradeError::InvalidAmount);
    }
    let cost = unit_price.saturating_mul(i64::from(quantity));
    if cost > state.cash {
        return Err(TradeError::InsufficientFunds {
            required: cost,
            available: state.cash,
        });
    }
    state.cash -= cost;
    state.guns += quantity;
    if heavy {
        state.heavy_weapon = true;
    }
    state.logs.push(String::from(LOG_WEAPON_BOUGHT));
    Ok(())
}

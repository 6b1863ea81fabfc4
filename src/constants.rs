//! Centralized balance and tuning constants for Undermarket game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_GAME_START: &str = "log.game-start";
pub(crate) const LOG_GAME_OVER: &str = "log.game-over";
pub(crate) const LOG_RESTART: &str = "log.restart";
pub(crate) const LOG_TRAVELED: &str = "log.traveled";
pub(crate) const LOG_TRAVEL_BLOCKED: &str = "log.travel-blocked";
pub(crate) const LOG_DAY_END: &str = "log.day-end";
pub(crate) const LOG_DAY_BLOCKED: &str = "log.day-blocked";
pub(crate) const LOG_EVENT_PREFIX: &str = "log.event.";
pub(crate) const LOG_EVENT_DISMISSED: &str = "log.event.dismissed";
pub(crate) const LOG_TRADE_BUY: &str = "log.trade.buy";
pub(crate) const LOG_TRADE_SELL: &str = "log.trade.sell";
pub(crate) const LOG_BANK_DEPOSIT: &str = "log.bank.deposit";
pub(crate) const LOG_BANK_WITHDRAW: &str = "log.bank.withdraw";
pub(crate) const LOG_DEBT_PAYMENT: &str = "log.debt.payment";
pub(crate) const LOG_WEAPON_BOUGHT: &str = "log.weapon.bought";
pub(crate) const LOG_WEAPON_OFFER_TAKEN: &str = "log.weapon.offer-taken";
pub(crate) const LOG_POLICE_FLED: &str = "log.police.fled";
pub(crate) const LOG_POLICE_CORNERED: &str = "log.police.cornered";
pub(crate) const LOG_POLICE_CARGO_DROPPED: &str = "log.police.cargo-dropped";
pub(crate) const LOG_POLICE_FIGHT_ROUND: &str = "log.police.fight-round";
pub(crate) const LOG_POLICE_DEFEATED_ALL: &str = "log.police.defeated-all";
pub(crate) const LOG_POLICE_SUBDUED: &str = "log.police.subdued";
pub(crate) const LOG_POLICE_BRIBED: &str = "log.police.bribed";
pub(crate) const LOG_POLICE_RECOVERY: &str = "log.police.recovery";
pub(crate) const LOG_DEAL_PREFIX: &str = "log.deal.";

// Starting aggregate -------------------------------------------------------
pub(crate) const START_CASH: i64 = 2_000;
pub(crate) const START_DEBT: i64 = 5_500;
pub(crate) const START_BANK: i64 = 0;
pub(crate) const START_HEALTH: i32 = 100;
pub(crate) const START_CAPACITY: u32 = 100;
pub(crate) const TOTAL_DAYS: u32 = 30;
pub(crate) const DEBT_RATE_PCT: u32 = 10;
pub(crate) const BANK_RATE_PCT: u32 = 5;
pub(crate) const HEALTH_MAX: i32 = 100;

// Event pipeline -----------------------------------------------------------
pub(crate) const TRAVEL_EVENT_CHANCE: f64 = 0.20;
pub(crate) const DAY_END_EVENT_CHANCE: f64 = 0.30;
pub(crate) const EVENT_HISTORY_MAX: usize = 64;

// Weapon offers ------------------------------------------------------------
pub(crate) const WEAPON_OFFER_PRICE_MIN: i64 = 300;
pub(crate) const WEAPON_OFFER_PRICE_MAX: i64 = 800;
pub(crate) const WEAPON_OFFER_QTY_MAX: u32 = 2;
pub(crate) const WEAPON_OFFER_HEAVY_CHANCE: f64 = 0.25;

// Police shakedowns --------------------------------------------------------
pub(crate) const POLICE_OFFICERS_MIN: u32 = 1;
pub(crate) const POLICE_OFFICERS_MAX: u32 = 4;
pub(crate) const FLEE_SUCCESS_CHANCE: f64 = 0.40;
pub(crate) const FLEE_DROP_CHANCE: f64 = 0.70;
pub(crate) const FLEE_DROP_MAX_FRACTION: f64 = 0.25;
pub(crate) const FIGHT_MAX_SHOTS: u32 = 2;
pub(crate) const SHOT_HIT_CHANCE: f64 = 0.40;
pub(crate) const HEAVY_SHOT_DOWN_MIN: u32 = 1;
pub(crate) const HEAVY_SHOT_DOWN_MAX: u32 = 5;
pub(crate) const OFFICER_HIT_CHANCE: f64 = 0.35;
pub(crate) const OFFICER_DAMAGE_MIN: i32 = 12;
pub(crate) const OFFICER_DAMAGE_MAX: i32 = 20;
pub(crate) const BRIBE_MIN_FRACTION: f64 = 0.25;
pub(crate) const BRIBE_MAX_FRACTION: f64 = 0.50;
pub(crate) const BRIBE_FLOOR: i64 = 100;
pub(crate) const BRIBE_ARMED_MULTIPLIER: f64 = 1.5;
pub(crate) const RECOVERY_COST_MIN: i64 = 1_000;
pub(crate) const RECOVERY_COST_MAX: i64 = 2_500;

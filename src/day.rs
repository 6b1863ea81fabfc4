//! The turn loop: travel, trade, end the day.
//!
//! A day runs travel -> trade -> day end. Narrative events can fire on
//! arrival and at day end; a fired event must be resolved and dismissed
//! before the clock moves. Compounding and the terminal check live in
//! `advance_day`, the single place a day ever ends.

use log::{debug, info};
use rand::Rng;
use thiserror::Error;

use crate::constants::{
    DAY_END_EVENT_CHANCE, LOG_DAY_BLOCKED, LOG_DAY_END, LOG_EVENT_DISMISSED, LOG_EVENT_PREFIX,
    LOG_GAME_OVER, LOG_RESTART, LOG_TRAVELED, LOG_TRAVEL_BLOCKED, LOG_WEAPON_OFFER_TAKEN,
    TRAVEL_EVENT_CHANCE,
};
use crate::effects::apply_effects;
use crate::events::{kinds_conflict, materialize, pick_event, EventCategory, EventKind};
use crate::prices::generate_prices;
use crate::state::{GamePhase, PlayerState, TurnStep};
use crate::trade::{buy_weapons, TradeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelOutcome {
    /// Travel is not possible right now; nothing changed.
    Blocked,
    Moved { event_fired: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    /// The day cannot end right now; nothing changed.
    Blocked,
    /// An event fired (or was already waiting) and must be dismissed first.
    EventPending,
    /// The clock moved to the next morning.
    Advanced,
    /// That was the final day; the game is over.
    Finished,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DayError {
    #[error("unknown location: {0}")]
    UnknownLocation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfferError {
    #[error("no weapon offer is pending")]
    NoOffer,
    #[error(transparent)]
    Trade(#[from] TradeError),
}

impl PlayerState {
    /// Move to a location and maybe trip a travel event. One move per
    /// day; a pending event blocks the road. The price board is a
    /// morning draw and does not change mid-day.
    ///
    /// # Errors
    ///
    /// Fails when the location id is not in the catalog.
    pub fn travel_to(&mut self, location_id: &str) -> Result<TravelOutcome, DayError> {
        if self.catalog.location(location_id).is_none() {
            return Err(DayError::UnknownLocation(location_id.to_string()));
        }
        if self.phase != GamePhase::InProgress
            || self.step != TurnStep::Traveling
            || self.pending_event.is_some()
        {
            self.logs.push(String::from(LOG_TRAVEL_BLOCKED));
            return Ok(TravelOutcome::Blocked);
        }

        self.location_id = Some(location_id.to_string());
        *self.visits.entry(location_id.to_string()).or_insert(0) += 1;
        self.step = TurnStep::Trading;
        self.logs.push(String::from(LOG_TRAVELED));
        info!("arrived at {location_id} on day {}", self.day);

        let event_fired = self.maybe_fire(EventCategory::Travel, TRAVEL_EVENT_CHANCE);
        Ok(TravelOutcome::Moved { event_fired })
    }

    /// Close out the day. The first call each evening rolls the day-end
    /// event once; a fired event parks the clock until it is dismissed.
    pub fn end_day(&mut self) -> DayOutcome {
        if self.phase != GamePhase::InProgress {
            self.logs.push(String::from(LOG_DAY_BLOCKED));
            return DayOutcome::Blocked;
        }
        if self.pending_event.is_some() {
            return DayOutcome::EventPending;
        }
        if !self.day_end_event_rolled {
            self.day_end_event_rolled = true;
            if self.maybe_fire(EventCategory::DayEnd, DAY_END_EVENT_CHANCE) {
                return DayOutcome::EventPending;
            }
        }
        self.advance_day();
        if self.phase == GamePhase::Ended {
            DayOutcome::Finished
        } else {
            DayOutcome::Advanced
        }
    }

    /// Roll the clock forward one day: fresh prices, compounded debt and
    /// bank balances, and the terminal check.
    pub(crate) fn advance_day(&mut self) {
        if self.phase != GamePhase::InProgress {
            return;
        }
        self.day += 1;
        self.debt = compound(self.debt, self.debt_rate_pct);
        self.bank = compound(self.bank, self.bank_rate_pct);

        let location = self
            .location_id
            .as_ref()
            .and_then(|id| self.catalog.location(id))
            .cloned();
        if let Some(rng) = self.rng.as_mut() {
            self.prices = generate_prices(&self.catalog.goods, location.as_ref(), rng);
        }
        self.day_end_event_rolled = false;
        self.step = TurnStep::Traveling;

        if self.day > self.total_days {
            self.day = self.total_days;
            self.phase = GamePhase::Ended;
            self.logs.push(String::from(LOG_GAME_OVER));
            info!("game over after day {}", self.total_days);
        } else {
            self.logs.push(String::from(LOG_DAY_END));
            debug!("day {} begins; debt {} bank {}", self.day, self.debt, self.bank);
        }
    }

    /// Acknowledge the pending event. Refused while a police encounter
    /// inside it is still unresolved.
    pub fn dismiss_event(&mut self) -> bool {
        let Some(pending) = self.pending_event.as_ref() else {
            return false;
        };
        if pending
            .police
            .as_ref()
            .is_some_and(crate::police::PoliceEncounter::is_active)
        {
            return false;
        }
        self.sync_pending_into_history();
        self.pending_event = None;
        self.logs.push(String::from(LOG_EVENT_DISMISSED));
        true
    }

    /// Take the pending arms offer at its rolled terms. Success concludes
    /// and dismisses the event.
    ///
    /// # Errors
    ///
    /// Fails when no weapon offer is pending or the purchase itself is
    /// rejected.
    pub fn accept_weapon_offer(&mut self) -> Result<(), OfferError> {
        let offer = self
            .pending_event
            .as_ref()
            .and_then(|event| event.weapon_offer)
            .ok_or(OfferError::NoOffer)?;
        buy_weapons(self, offer.quantity, offer.unit_price, offer.heavy)?;
        self.logs.push(String::from(LOG_WEAPON_OFFER_TAKEN));
        self.sync_pending_into_history();
        self.pending_event = None;
        Ok(())
    }

    /// Throw the run away and start over on a new seed. Loaded catalogs
    /// survive the restart.
    pub fn restart(&mut self, seed: u64) {
        let catalog = std::mem::take(&mut self.catalog);
        let events = std::mem::take(&mut self.events);
        *self = Self::new_game(seed).with_data(catalog, events);
        self.logs.push(String::from(LOG_RESTART));
    }

    /// One event roll: gate on chance, draw a template honoring today's
    /// mutual exclusions, materialize it, apply its static effects, and
    /// park it as the pending event.
    fn maybe_fire(&mut self, category: EventCategory, chance: f64) -> bool {
        let blocking = self.blocking_kind();
        let (day, cash, armed) = (self.day, self.cash, self.guns > 0);
        let Some(rng) = self.rng.as_mut() else {
            return false;
        };
        if !rng.gen_bool(chance) {
            return false;
        }
        let Some(template) = pick_event(&self.events, category, blocking, rng).cloned() else {
            return false;
        };
        let resolved = materialize(&template, day, cash, armed, rng);

        self.logs
            .push(format!("{LOG_EVENT_PREFIX}{}", resolved.template_id));
        let effects = resolved.effects.clone();
        apply_effects(self, &effects);
        self.push_event_history(resolved.clone());
        self.pending_event = Some(resolved);
        true
    }

    /// The interactive kind (if any) already seen today, for the
    /// mutual-exclusion filter.
    fn blocking_kind(&self) -> Option<EventKind> {
        if let Some(kind) = self.pending_kind() {
            return Some(kind);
        }
        self.event_history
            .iter()
            .rev()
            .take_while(|event| event.day == self.day)
            .map(|event| event.kind)
            .find(|kind| kinds_conflict(*kind, EventKind::WeaponOffer)
                || kinds_conflict(*kind, EventKind::PoliceRaid))
    }
}

fn compound(balance: i64, rate_pct: u32) -> i64 {
    if balance <= 0 {
        return balance.max(0);
    }
    let multiplier = 1.0 + crate::numbers::u32_to_f64(rate_pct) / 100.0;
    crate::numbers::round_f64_to_i64(crate::numbers::i64_to_f64(balance) * multiplier)
}

//! The police shakedown sub-engine.
//!
//! An encounter is rolled once when its event materializes and then
//! lives inside the pending event. Every resolution path mutates that
//! embedded copy in place; the day cannot advance while the encounter
//! is still `Active`.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BRIBE_ARMED_MULTIPLIER, BRIBE_FLOOR, BRIBE_MAX_FRACTION, BRIBE_MIN_FRACTION,
    FIGHT_MAX_SHOTS, FLEE_DROP_CHANCE, FLEE_DROP_MAX_FRACTION, FLEE_SUCCESS_CHANCE,
    HEALTH_MAX, HEAVY_SHOT_DOWN_MAX, HEAVY_SHOT_DOWN_MIN, LOG_POLICE_BRIBED,
    LOG_POLICE_CARGO_DROPPED, LOG_POLICE_CORNERED, LOG_POLICE_DEFEATED_ALL,
    LOG_POLICE_FIGHT_ROUND, LOG_POLICE_FLED, LOG_POLICE_RECOVERY, LOG_POLICE_SUBDUED,
    OFFICER_DAMAGE_MAX, OFFICER_DAMAGE_MIN, OFFICER_HIT_CHANCE, POLICE_OFFICERS_MAX,
    POLICE_OFFICERS_MIN, RECOVERY_COST_MAX, RECOVERY_COST_MIN, SHOT_HIT_CHANCE,
};
use crate::numbers::{i64_to_f64, round_f64_to_i32, round_f64_to_i64, u32_to_f64};
use crate::state::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoliceStatus {
    /// Unresolved; blocks day progression.
    Active,
    /// The player got away.
    Escaped,
    /// The demand was paid.
    Bribed,
    /// Every officer went down.
    Defeated,
    /// The player went down; recovery is owed.
    Subdued,
}

/// Rolled shakedown state, embedded in the triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliceEncounter {
    pub officers: u32,
    pub initial_officers: u32,
    pub bribe_demand: i64,
    pub armed_at_start: bool,
    pub status: PoliceStatus,
    /// Set once every officer is down; consumed by `accept_recovery`.
    pub recovery_cost: Option<i64>,
    pub rounds: u32,
}

impl PoliceEncounter {
    /// Roll a fresh encounter. The bribe scales with cash on hand and
    /// stiffens when the player is visibly armed, but never exceeds
    /// what the player can actually pay.
    #[must_use]
    pub fn roll<R: Rng>(cash: i64, armed: bool, rng: &mut R) -> Self {
        let officers = rng.gen_range(POLICE_OFFICERS_MIN..=POLICE_OFFICERS_MAX);
        let fraction = rng.gen_range(BRIBE_MIN_FRACTION..=BRIBE_MAX_FRACTION);
        let mut demand = round_f64_to_i64(i64_to_f64(cash) * fraction).max(BRIBE_FLOOR);
        if armed {
            demand = round_f64_to_i64(i64_to_f64(demand) * BRIBE_ARMED_MULTIPLIER);
        }
        Self {
            officers,
            initial_officers: officers,
            bribe_demand: demand.min(cash.max(0)),
            armed_at_start: armed,
            status: PoliceStatus::Active,
            recovery_cost: None,
            rounds: 0,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, PoliceStatus::Active)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoliceError {
    #[error("no police encounter is pending")]
    NoEncounter,
    #[error("the encounter is already resolved")]
    AlreadyResolved,
    #[error("no recovery is on offer")]
    NoRecoveryOffer,
    #[error("cannot pay the ${demand} bribe with ${cash}")]
    CannotAfford { demand: i64, cash: i64 },
    #[error("cannot pay the ${cost} recovery bill with ${cash}")]
    RecoveryUnaffordable { cost: i64, cash: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleeOutcome {
    /// Away clean, minus whatever cargo was left behind in the scramble.
    Escaped { units_dropped: u32 },
    /// Still surrounded; nothing was lost, nothing was resolved.
    Cornered,
}

/// One round of gunfire, both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FightRound {
    pub shots_fired: u32,
    pub officers_down: u32,
    pub damage_taken: i32,
    pub status: PoliceStatus,
}

fn active_encounter(state: &mut PlayerState) -> Result<&mut PoliceEncounter, PoliceError> {
    let encounter = state
        .pending_event
        .as_mut()
        .and_then(|event| event.police.as_mut())
        .ok_or(PoliceError::NoEncounter)?;
    if encounter.is_active() {
        Ok(encounter)
    } else {
        Err(PoliceError::AlreadyResolved)
    }
}

/// Try to run. A successful escape resolves the encounter but may cost
/// a slice of every cargo stack on the way out; a failed attempt leaves
/// the encounter active and the cargo untouched.
///
/// # Errors
///
/// Fails when no active police encounter is pending.
pub fn attempt_flee(state: &mut PlayerState) -> Result<FleeOutcome, PoliceError> {
    active_encounter(state)?;
    let Some(rng) = state.rng.as_mut() else {
        return Err(PoliceError::NoEncounter);
    };

    if !rng.gen_bool(FLEE_SUCCESS_CHANCE) {
        if let Some(encounter) = state
            .pending_event
            .as_mut()
            .and_then(|event| event.police.as_mut())
        {
            encounter.rounds += 1;
        }
        state.logs.push(String::from(LOG_POLICE_CORNERED));
        state.sync_pending_into_history();
        return Ok(FleeOutcome::Cornered);
    }

    let mut units_dropped = 0;
    if rng.gen_bool(FLEE_DROP_CHANCE) {
        let fraction = rng.gen_range(0.0..=FLEE_DROP_MAX_FRACTION);
        for entry in &mut state.inventory {
            let lost = round_f64_to_i32(u32_to_f64(entry.quantity) * fraction);
            let lost = u32::try_from(lost.max(0)).unwrap_or(0).min(entry.quantity);
            entry.quantity -= lost;
            units_dropped += lost;
        }
        state.inventory.retain(|entry| entry.quantity > 0);
        if units_dropped > 0 {
            state.logs.push(String::from(LOG_POLICE_CARGO_DROPPED));
        }
    }
    if let Some(encounter) = state
        .pending_event
        .as_mut()
        .and_then(|event| event.police.as_mut())
    {
        encounter.status = PoliceStatus::Escaped;
        encounter.rounds += 1;
    }
    state.logs.push(String::from(LOG_POLICE_FLED));
    state.sync_pending_into_history();
    debug!("escaped the sweep, dropped {units_dropped} units");
    Ok(FleeOutcome::Escaped { units_dropped })
}

/// Trade one round of fire. The player shoots first with up to two
/// weapons; a heavy piece turns the opening shot into a burst.
/// Surviving officers return fire.
///
/// # Errors
///
/// Fails when no active police encounter is pending.
pub fn fight_round(state: &mut PlayerState) -> Result<FightRound, PoliceError> {
    let (guns, heavy) = (state.guns, state.heavy_weapon);
    active_encounter(state)?;
    let Some(rng) = state.rng.as_mut() else {
        return Err(PoliceError::NoEncounter);
    };

    let mut officers = state
        .pending_event
        .as_ref()
        .and_then(|event| event.police.as_ref())
        .map_or(0, |encounter| encounter.officers);

    let shots_fired = guns.min(FIGHT_MAX_SHOTS);
    let mut officers_down = 0;
    for shot in 0..shots_fired {
        if officers == 0 {
            break;
        }
        if !rng.gen_bool(SHOT_HIT_CHANCE) {
            continue;
        }
        let down = if heavy && shot == 0 {
            rng.gen_range(HEAVY_SHOT_DOWN_MIN..=HEAVY_SHOT_DOWN_MAX)
        } else {
            1
        };
        let down = down.min(officers);
        officers -= down;
        officers_down += down;
    }

    let mut damage_taken = 0;
    for _ in 0..officers {
        if rng.gen_bool(OFFICER_HIT_CHANCE) {
            damage_taken += rng.gen_range(OFFICER_DAMAGE_MIN..=OFFICER_DAMAGE_MAX);
        }
    }
    state.health = (state.health - damage_taken).max(0);

    let status = if officers == 0 {
        PoliceStatus::Defeated
    } else if state.health == 0 {
        PoliceStatus::Subdued
    } else {
        PoliceStatus::Active
    };
    // Winning the firefight earns the paid patch-up-and-lie-low offer.
    let recovery_cost = if status == PoliceStatus::Defeated {
        Some(rng.gen_range(RECOVERY_COST_MIN..=RECOVERY_COST_MAX))
    } else {
        None
    };

    if let Some(encounter) = state
        .pending_event
        .as_mut()
        .and_then(|event| event.police.as_mut())
    {
        encounter.officers = officers;
        encounter.status = status;
        encounter.rounds += 1;
        if recovery_cost.is_some() {
            encounter.recovery_cost = recovery_cost;
        }
    }

    state.logs.push(String::from(LOG_POLICE_FIGHT_ROUND));
    match status {
        PoliceStatus::Defeated => state.logs.push(String::from(LOG_POLICE_DEFEATED_ALL)),
        PoliceStatus::Subdued => state.logs.push(String::from(LOG_POLICE_SUBDUED)),
        _ => {}
    }
    state.sync_pending_into_history();

    Ok(FightRound {
        shots_fired,
        officers_down,
        damage_taken,
        status,
    })
}

/// Pay the rolled demand and walk away.
///
/// # Errors
///
/// Fails when no active encounter is pending or the demand exceeds cash
/// on hand.
pub fn pay_bribe(state: &mut PlayerState) -> Result<(), PoliceError> {
    let demand = active_encounter(state)?.bribe_demand;
    if demand > state.cash {
        return Err(PoliceError::CannotAfford {
            demand,
            cash: state.cash,
        });
    }
    state.cash -= demand;
    if let Some(encounter) = state
        .pending_event
        .as_mut()
        .and_then(|event| event.police.as_mut())
    {
        encounter.status = PoliceStatus::Bribed;
    }
    state.logs.push(String::from(LOG_POLICE_BRIBED));
    state.sync_pending_into_history();
    Ok(())
}

/// Take the recovery offer earned by putting every officer down: pay
/// the rolled bill, restore health, dismiss the encounter, and lose a
/// full extra day lying low on top of the day the encounter already
/// blocked.
///
/// # Errors
///
/// Fails unless a defeated encounter with a rolled recovery cost is
/// pending, or when the bill exceeds cash on hand.
pub fn accept_recovery(state: &mut PlayerState) -> Result<(), PoliceError> {
    let encounter = state
        .pending_event
        .as_ref()
        .and_then(|event| event.police.as_ref())
        .ok_or(PoliceError::NoEncounter)?;
    if encounter.status != PoliceStatus::Defeated {
        return Err(PoliceError::NoRecoveryOffer);
    }
    let Some(cost) = encounter.recovery_cost else {
        return Err(PoliceError::NoRecoveryOffer);
    };
    if cost > state.cash {
        return Err(PoliceError::RecoveryUnaffordable {
            cost,
            cash: state.cash,
        });
    }

    state.cash -= cost;
    state.health = HEALTH_MAX;
    state.sync_pending_into_history();
    state.pending_event = None;
    state.day_end_event_rolled = false;
    state.logs.push(String::from(LOG_POLICE_RECOVERY));
    // The blocked day ends, then a full day is lost to recovery.
    state.advance_day();
    state.advance_day();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventCategory, EventKind, ResolvedEvent, Sentiment};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use smallvec::smallvec;

    fn pending_raid(state: &mut PlayerState, encounter: PoliceEncounter) {
        let event = ResolvedEvent {
            template_id: "customs-sweep".to_string(),
            category: EventCategory::DayEnd,
            kind: EventKind::PoliceRaid,
            title: "Customs Sweep".to_string(),
            desc: String::new(),
            sentiment: Sentiment::Negative,
            day: state.day,
            effects: smallvec![],
            impact: None,
            weapon_offer: None,
            police: Some(encounter),
            npc: None,
        };
        state.push_event_history(event.clone());
        state.pending_event = Some(event);
    }

    fn raid_state(seed: u64, guns: u32) -> PlayerState {
        let mut state = PlayerState::new_game(seed);
        state.guns = guns;
        let encounter = {
            let armed = guns > 0;
            let cash = state.cash;
            let rng = state.rng.as_mut().expect("rng present");
            PoliceEncounter::roll(cash, armed, rng)
        };
        pending_raid(&mut state, encounter);
        state
    }

    #[test]
    fn rolled_bribe_stays_within_reach() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        for _ in 0..500 {
            let encounter = PoliceEncounter::roll(2_000, false, &mut rng);
            assert!((1..=4).contains(&encounter.officers));
            assert!(encounter.bribe_demand <= 2_000);
            assert!(encounter.bribe_demand >= 100);
        }
    }

    #[test]
    fn armed_players_pay_more_on_average() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let unarmed: i64 = (0..300)
            .map(|_| PoliceEncounter::roll(2_000, false, &mut rng).bribe_demand)
            .sum();
        let armed: i64 = (0..300)
            .map(|_| PoliceEncounter::roll(2_000, true, &mut rng).bribe_demand)
            .sum();
        assert!(armed > unarmed);
    }

    #[test]
    fn broke_player_gets_a_demand_capped_at_cash() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let encounter = PoliceEncounter::roll(40, false, &mut rng);
        assert!(encounter.bribe_demand <= 40);
    }

    #[test]
    fn bribe_resolves_the_encounter() {
        let mut state = raid_state(5, 0);
        let demand = state
            .pending_event
            .as_ref()
            .and_then(|event| event.police.as_ref())
            .expect("encounter pending")
            .bribe_demand;
        let cash_before = state.cash;
        pay_bribe(&mut state).expect("bribe succeeds");
        assert_eq!(state.cash, cash_before - demand);
        let status = state
            .pending_event
            .as_ref()
            .and_then(|event| event.police.as_ref())
            .expect("still pending until dismissed")
            .status;
        assert_eq!(status, PoliceStatus::Bribed);
        assert!(pay_bribe(&mut state).is_err(), "cannot pay twice");
    }

    #[test]
    fn unaffordable_bribe_is_rejected_without_side_effects() {
        let mut state = raid_state(5, 0);
        state.cash = 0;
        if let Some(encounter) = state
            .pending_event
            .as_mut()
            .and_then(|event| event.police.as_mut())
        {
            encounter.bribe_demand = 500;
        }
        let err = pay_bribe(&mut state).expect_err("rejected");
        assert_eq!(
            err,
            PoliceError::CannotAfford {
                demand: 500,
                cash: 0,
            }
        );
        assert_eq!(state.cash, 0);
    }

    #[test]
    fn flee_eventually_succeeds_or_corners() {
        let mut escaped = 0;
        let mut cornered = 0;
        for seed in 0..60 {
            let mut state = raid_state(seed, 0);
            match attempt_flee(&mut state).expect("encounter pending") {
                FleeOutcome::Escaped { .. } => escaped += 1,
                FleeOutcome::Cornered => cornered += 1,
            }
        }
        assert!(escaped > 0, "flee never succeeded across 60 seeds");
        assert!(cornered > 0, "flee never failed across 60 seeds");
    }

    #[test]
    fn cargo_drops_only_when_the_escape_succeeds() {
        let mut drops_on_escape = 0;
        for seed in 0..120 {
            let mut state = raid_state(seed, 0);
            state.add_units("untaxed-spirits", 40, 20);
            state.add_units("hot-circuitry", 8, 300);
            match attempt_flee(&mut state).expect("encounter pending") {
                FleeOutcome::Cornered => {
                    assert_eq!(state.held_quantity("untaxed-spirits"), 40);
                    assert_eq!(state.held_quantity("hot-circuitry"), 8);
                    let status = state
                        .pending_event
                        .as_ref()
                        .and_then(|event| event.police.as_ref())
                        .expect("still pending")
                        .status;
                    assert_eq!(status, PoliceStatus::Active);
                }
                FleeOutcome::Escaped { units_dropped } => {
                    if units_dropped > 0 {
                        drops_on_escape += 1;
                    }
                    let lost = 48 - state.total_inventory();
                    assert_eq!(lost, units_dropped);
                }
            }
        }
        assert!(drops_on_escape > 0, "no escape ever dropped cargo");
    }

    #[test]
    fn escape_drops_never_exceed_a_quarter_per_stack() {
        for seed in 0..80 {
            let mut state = raid_state(seed, 0);
            state.add_units("untaxed-spirits", 40, 20);
            state.add_units("hot-circuitry", 8, 300);
            if let FleeOutcome::Escaped { .. } =
                attempt_flee(&mut state).expect("encounter pending")
            {
                assert!(state.held_quantity("untaxed-spirits") >= 30);
                assert!(state.held_quantity("hot-circuitry") >= 6);
            }
        }
    }

    #[test]
    fn unarmed_fighter_fires_no_shots() {
        let mut state = raid_state(3, 0);
        let round = fight_round(&mut state).expect("encounter pending");
        assert_eq!(round.shots_fired, 0);
        assert_eq!(round.officers_down, 0);
    }

    #[test]
    fn fighting_to_the_end_reaches_a_terminal_status() {
        for seed in 0..30 {
            let mut state = raid_state(seed, 2);
            state.heavy_weapon = true;
            let mut terminal = None;
            for _ in 0..60 {
                let round = fight_round(&mut state).expect("encounter pending");
                if round.status != PoliceStatus::Active {
                    terminal = Some(round.status);
                    break;
                }
            }
            let status = terminal.expect("fight resolves within 60 rounds");
            assert!(matches!(
                status,
                PoliceStatus::Defeated | PoliceStatus::Subdued
            ));
            let recovery = state
                .pending_event
                .as_ref()
                .and_then(|event| event.police.as_ref())
                .and_then(|encounter| encounter.recovery_cost);
            match status {
                PoliceStatus::Defeated => {
                    let cost = recovery.expect("winning the fight rolls a recovery offer");
                    assert!((1_000..=2_500).contains(&cost));
                }
                _ => {
                    assert_eq!(state.health, 0);
                    assert!(recovery.is_none(), "losing earns no recovery offer");
                }
            }
        }
    }

    #[test]
    fn defeating_every_officer_unlocks_recovery() {
        let mut state = raid_state(7, 0);
        state.health = 35;
        let day_before = state.day;
        if let Some(encounter) = state
            .pending_event
            .as_mut()
            .and_then(|event| event.police.as_mut())
        {
            encounter.officers = 0;
            encounter.status = PoliceStatus::Defeated;
            encounter.recovery_cost = Some(1_500);
        }
        state.cash = 1_700;
        accept_recovery(&mut state).expect("recovery succeeds");
        assert_eq!(state.health, 100);
        assert_eq!(state.cash, 200);
        assert!(state.pending_event.is_none());
        assert_eq!(state.day, day_before + 2);
    }

    #[test]
    fn unaffordable_recovery_is_rejected_without_side_effects() {
        let mut state = raid_state(7, 0);
        state.health = 35;
        if let Some(encounter) = state
            .pending_event
            .as_mut()
            .and_then(|event| event.police.as_mut())
        {
            encounter.officers = 0;
            encounter.status = PoliceStatus::Defeated;
            encounter.recovery_cost = Some(1_500);
        }
        state.cash = 900;
        assert_eq!(
            accept_recovery(&mut state),
            Err(PoliceError::RecoveryUnaffordable {
                cost: 1_500,
                cash: 900,
            })
        );
        assert_eq!(state.cash, 900);
        assert_eq!(state.health, 35);
        assert!(state.pending_event.is_some());
    }

    #[test]
    fn recovery_requires_a_defeated_encounter() {
        let mut state = raid_state(9, 0);
        assert_eq!(accept_recovery(&mut state), Err(PoliceError::NoRecoveryOffer));
        if let Some(encounter) = state
            .pending_event
            .as_mut()
            .and_then(|event| event.police.as_mut())
        {
            encounter.status = PoliceStatus::Subdued;
        }
        assert_eq!(accept_recovery(&mut state), Err(PoliceError::NoRecoveryOffer));
        state.pending_event = None;
        assert_eq!(accept_recovery(&mut state), Err(PoliceError::NoEncounter));
    }
}

//! Undermarket Game Engine
//!
//! Platform-agnostic core logic for the Undermarket trading game: a
//! 30-day run of buying low, selling high, dodging the law, and paying
//! off the shark. This crate provides all game mechanics without UI or
//! platform-specific dependencies.

pub mod catalog;
pub mod constants;
pub mod day;
pub mod effects;
pub mod events;
pub mod leaderboard;
pub mod npc;
pub mod numbers;
pub mod police;
pub mod prices;
pub mod score;
pub mod state;
pub mod trade;

// Re-export commonly used types
pub use catalog::{Catalog, Good, GoodCategory, Location, PriceRange};
pub use day::{DayError, DayOutcome, OfferError, TravelOutcome};
pub use effects::{apply_effects, EffectList, EventEffect};
pub use events::{
    kinds_conflict, materialize, pick_event, EventCategory, EventKind, EventSet, GameEvent,
    ResolvedEvent, Sentiment, WeaponOffer,
};
pub use leaderboard::{
    AggregateStats, LeaderboardClient, ScoreRow, ScoreSubmission, SubmissionError, SubmitReceipt,
    TOP_SCORES_LIMIT,
};
pub use npc::{deal_available, execute_deal, Deal, DealError, DealKind, NpcEncounter, NpcProfile};
pub use police::{
    accept_recovery, attempt_flee, fight_round, pay_bribe, FightRound, FleeOutcome, PoliceEncounter,
    PoliceError, PoliceStatus,
};
pub use prices::{generate_prices, PriceBoard};
pub use score::{
    daily_snapshots, final_score, growth_rate_pct, profit, summarize, DailySnapshot, ResultSummary,
};
pub use state::{
    GamePhase, InventoryEntry, PlayerState, Transaction, TransactionKind, TurnStep,
};
pub use trade::{buy, buy_weapons, deposit, pay_debt, sell, withdraw, TradeError};

/// Trait for abstracting data loading operations.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the goods and locations catalog from the platform-specific
    /// source.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;

    /// Load the narrative event templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the event data cannot be loaded.
    fn load_events(&self) -> Result<EventSet, Self::Error>;
}

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, state: &PlayerState) -> Result<(), Self::Error>;

    /// Load game state.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<PlayerState>, Self::Error>;

    /// Delete saved game.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine for managing game instances
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Create a new game with the specified seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog or event data cannot be loaded.
    pub fn create_game(&self, seed: u64) -> Result<PlayerState, L::Error> {
        let catalog = self.data_loader.load_catalog()?;
        let events = self.data_loader.load_events()?;
        Ok(PlayerState::new_game(seed).with_data(catalog, events))
    }

    /// Save a game state.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, state: &PlayerState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, state)
    }

    /// Load a game state, rehydrating the fields that never touch disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded or rehydrated.
    pub fn load_game(&self, save_name: &str) -> Result<Option<PlayerState>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(state) = self.storage.load_game(save_name).map_err(Into::into)? {
            let catalog = self.data_loader.load_catalog().map_err(Into::into)?;
            let events = self.data_loader.load_events().map_err(Into::into)?;
            Ok(Some(state.rehydrate(catalog, events)))
        } else {
            Ok(None)
        }
    }

    /// Load the named save if one exists, otherwise start a fresh run
    /// on the given seed.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or game creation fails.
    pub fn load_or_start(&self, save_name: &str, seed: u64) -> Result<PlayerState, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(state) = self.load_game(save_name)? {
            Ok(state)
        } else {
            self.create_game(seed).map_err(Into::into)
        }
    }

    /// Delete a saved game.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<Catalog, Self::Error> {
            Ok(Catalog::builtin())
        }

        fn load_events(&self) -> Result<EventSet, Self::Error> {
            Ok(EventSet::empty())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, PlayerState>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, state: &PlayerState) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), state.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<PlayerState>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    fn engine() -> GameEngine<FixtureLoader, MemoryStorage> {
        GameEngine::new(FixtureLoader, MemoryStorage::default())
    }

    #[test]
    fn created_games_use_loaded_data() {
        let engine = engine();
        let state = engine.create_game(12).expect("infallible");
        assert_eq!(state.phase, GamePhase::InProgress);
        assert_eq!(state.seed, 12);
        assert!(state.events.events.is_empty(), "fixture events are empty");
        assert!(!state.catalog.goods.is_empty());
    }

    #[test]
    fn save_load_round_trip_preserves_the_run() {
        let engine = engine();
        let mut state = engine.create_game(12).expect("infallible");
        state.travel_to("docks").expect("location exists");
        state.cash = 777;
        engine.save_game("slot-1", &state).expect("infallible");

        let loaded = engine
            .load_game("slot-1")
            .expect("loads")
            .expect("save exists");
        assert_eq!(loaded.cash, 777);
        assert_eq!(loaded.location_id.as_deref(), Some("docks"));
        assert!(loaded.rng.is_some(), "loads come back rehydrated");
    }

    #[test]
    fn load_or_start_falls_back_to_a_fresh_run() {
        let engine = engine();
        let state = engine.load_or_start("missing", 5).expect("starts fresh");
        assert_eq!(state.seed, 5);
        assert_eq!(state.day, 1);
    }

    #[test]
    fn deleted_saves_stay_deleted() {
        let engine = engine();
        let state = engine.create_game(1).expect("infallible");
        engine.save_game("slot-1", &state).expect("infallible");
        engine.delete_save("slot-1").expect("infallible");
        assert!(engine.load_game("slot-1").expect("loads").is_none());
    }
}

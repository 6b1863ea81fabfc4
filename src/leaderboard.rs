//! Leaderboard collaborator interface.
//!
//! The game core validates and shapes submissions; transport and
//! storage are platform concerns behind `LeaderboardClient`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::{daily_snapshots, DailySnapshot, ResultSummary};
use crate::state::{GamePhase, PlayerState, Transaction};

/// How many rows a standings view asks for by default.
pub const TOP_SCORES_LIMIT: usize = 10;

const NAME_MAX_CHARS: usize = 100;

/// A finished run offered to the board, balances and history included
/// so the board can audit the claimed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub player_name: String,
    pub score: i64,
    pub growth_rate_pct: f64,
    pub days_played: u32,
    pub seed: u64,
    pub final_cash: i64,
    pub final_bank: i64,
    pub final_debt: i64,
    pub transactions: Vec<Transaction>,
    pub snapshots: Vec<DailySnapshot>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player name exceeds {NAME_MAX_CHARS} characters")]
    NameTooLong,
    #[error("days played must be between 1 and {max}, got {got}")]
    DaysOutOfRange { got: u32, max: u32 },
    #[error("only finished runs can be submitted")]
    RunStillOpen,
}

impl ScoreSubmission {
    /// Shape a submission from a finished run.
    ///
    /// # Errors
    ///
    /// Fails while the run is still in progress.
    pub fn from_run(
        state: &PlayerState,
        summary: &ResultSummary,
        player_name: &str,
    ) -> Result<Self, SubmissionError> {
        if state.phase != GamePhase::Ended {
            return Err(SubmissionError::RunStillOpen);
        }
        let submission = Self {
            player_name: player_name.trim().to_string(),
            score: summary.score,
            growth_rate_pct: summary.growth_rate_pct,
            days_played: summary.days_played,
            seed: summary.seed,
            final_cash: state.cash,
            final_bank: state.bank,
            final_debt: state.debt,
            transactions: state.transactions.clone(),
            snapshots: daily_snapshots(state),
        };
        submission.validate(state.total_days)?;
        Ok(submission)
    }

    /// Check the submission against the board's acceptance rules.
    ///
    /// # Errors
    ///
    /// Rejects blank or oversized names and day counts outside the
    /// run's playable range.
    pub fn validate(&self, total_days: u32) -> Result<(), SubmissionError> {
        if self.player_name.trim().is_empty() {
            return Err(SubmissionError::EmptyName);
        }
        if self.player_name.chars().count() > NAME_MAX_CHARS {
            return Err(SubmissionError::NameTooLong);
        }
        if self.days_played == 0 || self.days_played > total_days {
            return Err(SubmissionError::DaysOutOfRange {
                got: self.days_played,
                max: total_days,
            });
        }
        Ok(())
    }
}

/// One standings row as the board reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub rank: u32,
    pub player_name: String,
    pub score: i64,
    pub growth_rate_pct: f64,
    pub days_played: u32,
}

/// Board-wide aggregates for a stats footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub games_started: u64,
    pub games_completed: u64,
    pub best_score: i64,
    pub mean_score: f64,
    /// When the board last changed, as the board reports it.
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub accepted: bool,
    /// Rank earned, when the board discloses it.
    pub rank: Option<u32>,
}

/// Trait for abstracting leaderboard transport.
/// Platform-specific implementations should provide this.
pub trait LeaderboardClient {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Count a new run against the board's games-started tally.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be reached.
    fn record_game_started(&self, seed: u64) -> Result<(), Self::Error>;

    /// Submit a validated score.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be reached or rejects the
    /// submission outright.
    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmitReceipt, Self::Error>;

    /// Fetch the top standings, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be reached.
    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRow>, Self::Error>;

    /// Fetch board-wide aggregates.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be reached.
    fn stats(&self) -> Result<AggregateStats, Self::Error>;
}

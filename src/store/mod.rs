//! Shared game store: the single source of truth for game state.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::StoreResult;
use crate::types::{Answer, Game, GameId, GamePhase, Player, PlayerId, Vote};

/// Which table a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Games,
    Players,
    Answers,
    Votes,
}

/// Change notification emitted after every successful insert/update.
///
/// Delivery is at-least-once and bursts may coalesce; subscribers must
/// re-fetch the full state for the game rather than apply deltas.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub game_id: GameId,
    pub table: Table,
}

/// Partial update for a game row; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub phase: Option<GamePhase>,
    pub current_round: Option<u32>,
    pub current_question: Option<String>,
}

/// Partial update for a player row.
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    pub score: Option<u32>,
}

/// Abstract store contract. Implementations must make each method an atomic
/// unit and must notify subscribers after every successful write.
///
/// Query results are returned in stable id order so that two clients reading
/// the same state build identical snapshots.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Insert a new game. Fails with `DuplicateKey` when the join code is
    /// already taken by another game.
    async fn insert_game(&self, game: Game) -> StoreResult<Game>;

    async fn get_game(&self, game_id: &GameId) -> StoreResult<Game>;

    /// Look up a game by its join code, case-insensitively.
    async fn find_game_by_code(&self, code: &str) -> StoreResult<Option<Game>>;

    async fn update_game(&self, game_id: &GameId, update: GameUpdate) -> StoreResult<()>;

    async fn insert_player(&self, player: Player) -> StoreResult<Player>;

    async fn update_player(&self, player_id: &PlayerId, update: PlayerUpdate) -> StoreResult<()>;

    async fn players_for_game(&self, game_id: &GameId) -> StoreResult<Vec<Player>>;

    /// Insert an answer. At most one answer is admitted per
    /// `(game, player, round)`; a second insert fails with `DuplicateKey`.
    async fn insert_answer(&self, answer: Answer) -> StoreResult<Answer>;

    async fn answers_for_round(&self, game_id: &GameId, round: u32) -> StoreResult<Vec<Answer>>;

    /// Insert a vote. At most one vote is admitted per
    /// `(game, voter, round)`; a second insert fails with `DuplicateKey`.
    async fn insert_vote(&self, vote: Vote) -> StoreResult<Vote>;

    async fn votes_for_round(&self, game_id: &GameId, round: u32) -> StoreResult<Vec<Vote>>;

    /// Atomically mark `round` as scored. Returns true when this caller won
    /// the claim, false when the round was already marked; the loser of a
    /// race must not credit points again.
    async fn claim_round_scored(&self, game_id: &GameId, round: u32) -> StoreResult<bool>;

    /// Subscribe to change notifications. Events carry the game id they are
    /// scoped to; a client interested in one game filters on it. Dropping
    /// the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

//! Per-client read-only mirror of a game's state.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;

use crate::code::normalize_code;
use crate::error::GameError;
use crate::store::{GameStore, StoreEvent};
use crate::types::{Answer, AnswerId, Game, GameId, Player, PlayerId, Vote};

/// Full current-round projection of a game as seen by one client: the game
/// row, all players, and the answers/votes of the current round only.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub game: Game,
    pub players: Vec<Player>,
    pub answers: Vec<Answer>,
    pub votes: Vec<Vote>,
}

impl GameSnapshot {
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *player_id)
    }

    pub fn is_host(&self, player_id: &PlayerId) -> bool {
        self.player(player_id).map(|p| p.is_host).unwrap_or(false)
    }

    /// Whether this player's answer row for the current round has landed.
    /// A missing row reads as "not yet submitted", never as an error.
    pub fn has_answered(&self, player_id: &PlayerId) -> bool {
        self.answers.iter().any(|a| a.player_id == *player_id)
    }

    pub fn has_voted(&self, player_id: &PlayerId) -> bool {
        self.votes.iter().any(|v| v.voter_id == *player_id)
    }

    /// Recommended gate for the host's "move to voting" control.
    pub fn all_answered(&self) -> bool {
        self.players.iter().all(|p| self.has_answered(&p.id))
    }

    /// Recommended gate for the host's "show results" control.
    pub fn all_voted(&self) -> bool {
        self.players.iter().all(|p| self.has_voted(&p.id))
    }

    /// Answers this voter may vote on: everyone's except their own.
    pub fn vote_candidates(&self, voter_id: &PlayerId) -> Vec<&Answer> {
        self.answers
            .iter()
            .filter(|a| a.player_id != *voter_id)
            .collect()
    }

    /// Players this voter may guess as an author: everyone except themselves.
    pub fn guessable_players(&self, voter_id: &PlayerId) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.id != *voter_id)
            .collect()
    }

    /// Players ranked for the results and leaderboard screens: score
    /// descending, name ascending as the tiebreak.
    pub fn leaderboard(&self) -> Vec<Player> {
        let mut ranked = self.players.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        ranked
    }
}

/// Ephemeral per-client state. Never persisted to the store and reset
/// whenever `(current_round, phase)` changes, since a new round or phase
/// invalidates prior local progress markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalFlags {
    pub has_answered: bool,
    pub has_voted: bool,
    pub selected_answer: Option<AnswerId>,
    pub selected_player: Option<PlayerId>,
}

/// One client's live view of a game.
///
/// The store is the single source of truth: local state is never treated as
/// authoritative and every change notification triggers a full re-read of
/// the current-round state, replacing the previous snapshot wholesale.
pub struct GameClient {
    game_id: GameId,
    player_id: PlayerId,
    snapshot_rx: watch::Receiver<Option<GameSnapshot>>,
    flags: Arc<RwLock<LocalFlags>>,
    watcher: JoinHandle<()>,
}

impl GameClient {
    /// Subscribe to a game by code. The change subscription is opened before
    /// the initial fetch so a write landing between the two is not missed.
    pub async fn subscribe(
        store: Arc<dyn GameStore>,
        code: &str,
        player_id: PlayerId,
    ) -> Result<Self, GameError> {
        let game = store
            .find_game_by_code(&normalize_code(code))
            .await?
            .ok_or(GameError::NotFound)?;
        let game_id = game.id;

        let events = store.subscribe();
        let initial = fetch_snapshot(store.as_ref(), &game_id).await?;
        let (tx, rx) = watch::channel(Some(initial));
        let flags = Arc::new(RwLock::new(LocalFlags::default()));

        let watcher = tokio::spawn(watch_changes(
            store,
            game_id.clone(),
            tx,
            flags.clone(),
            events,
        ));

        Ok(Self {
            game_id,
            player_id,
            snapshot_rx: rx,
            flags,
            watcher,
        })
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// The latest snapshot. `None` only before the first successful fetch.
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// A receiver for awaiting snapshot changes.
    pub fn watch(&self) -> watch::Receiver<Option<GameSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn current_player(&self) -> Option<Player> {
        self.snapshot()
            .and_then(|s| s.player(&self.player_id).cloned())
    }

    pub fn is_host(&self) -> bool {
        self.current_player().map(|p| p.is_host).unwrap_or(false)
    }

    pub async fn flags(&self) -> LocalFlags {
        self.flags.read().await.clone()
    }

    pub async fn mark_answered(&self) {
        self.flags.write().await.has_answered = true;
    }

    pub async fn mark_voted(&self) {
        self.flags.write().await.has_voted = true;
    }

    pub async fn select_answer(&self, answer_id: Option<AnswerId>) {
        self.flags.write().await.selected_answer = answer_id;
    }

    pub async fn select_player(&self, player_id: Option<PlayerId>) {
        self.flags.write().await.selected_player = player_id;
    }

    /// Stop receiving change notifications. In-flight store writes are not
    /// cancellable and complete or fail independently.
    pub fn unsubscribe(self) {}
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

async fn fetch_snapshot(store: &dyn GameStore, game_id: &GameId) -> Result<GameSnapshot, GameError> {
    let game = store.get_game(game_id).await?;
    let players = store.players_for_game(game_id).await?;
    let answers = store.answers_for_round(game_id, game.current_round).await?;
    let votes = store.votes_for_round(game_id, game.current_round).await?;
    Ok(GameSnapshot {
        game,
        players,
        answers,
        votes,
    })
}

async fn watch_changes(
    store: Arc<dyn GameStore>,
    game_id: GameId,
    tx: watch::Sender<Option<GameSnapshot>>,
    flags: Arc<RwLock<LocalFlags>>,
    mut events: broadcast::Receiver<StoreEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) if event.game_id == game_id => {}
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                // A burst coalesced; the full refetch below covers it
                tracing::debug!(%game_id, skipped, "change notifications coalesced");
            }
            Err(RecvError::Closed) => break,
        }

        match fetch_snapshot(store.as_ref(), &game_id).await {
            Ok(snapshot) => {
                let prev_key = tx
                    .borrow()
                    .as_ref()
                    .map(|s| (s.game.current_round, s.game.phase));
                let new_key = (snapshot.game.current_round, snapshot.game.phase);
                if prev_key != Some(new_key) {
                    *flags.write().await = LocalFlags::default();
                }
                let _ = tx.send(Some(snapshot));
            }
            Err(e) => {
                tracing::warn!(%game_id, error = %e, "snapshot refresh failed, keeping previous state");
            }
        }
    }
}

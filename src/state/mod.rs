mod answer;
mod game;
mod round;
mod score;
mod vote;

use std::sync::Arc;

use crate::error::{GameError, StoreError};
use crate::store::GameStore;
use crate::types::{Game, GameConfig, GameId, Player, PlayerId};

/// The game state machine.
///
/// Every operation validates its preconditions against the latest store
/// state, performs its writes, and relies on the store's change notification
/// for all observers (including the caller) to converge.
#[derive(Clone)]
pub struct GameService {
    pub(crate) store: Arc<dyn GameStore>,
    pub(crate) config: GameConfig,
}

impl GameService {
    pub fn new(store: Arc<dyn GameStore>, config: GameConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> Arc<dyn GameStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fetch a game by id, mapping a missing row to the user-facing error.
    pub(crate) async fn game(&self, game_id: &GameId) -> Result<Game, GameError> {
        match self.store.get_game(game_id).await {
            Ok(game) => Ok(game),
            Err(StoreError::NotFound { .. }) => Err(GameError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a host-only intent: the actor must be seated in the game and
    /// carry the host flag.
    pub(crate) async fn require_host(
        &self,
        game_id: &GameId,
        actor: &PlayerId,
    ) -> Result<(Game, Vec<Player>), GameError> {
        let game = self.game(game_id).await?;
        let players = self.store.players_for_game(game_id).await?;
        match players.iter().find(|p| p.id == *actor) {
            Some(p) if p.is_host => Ok((game, players)),
            Some(_) => Err(GameError::Validation(
                "only the host can do that".to_string(),
            )),
            None => Err(GameError::Validation(
                "you are not part of this game".to_string(),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{GamePhase, GameTicket};

    pub fn service() -> (GameService, Arc<MemoryStore>) {
        service_with_config(GameConfig::default())
    }

    pub fn service_with_config(config: GameConfig) -> (GameService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (GameService::new(store.clone(), config), store)
    }

    /// Create a game with a host and `extra` joined players, already started
    /// into the answering phase of round 1.
    pub async fn started_game(
        service: &GameService,
        extra: usize,
    ) -> (GameTicket, Vec<GameTicket>) {
        let host = service.create_game("Host").await.unwrap();
        let mut joined = Vec::new();
        for i in 0..extra {
            joined.push(
                service
                    .join_game(&host.code, &format!("Player{}", i + 1))
                    .await
                    .unwrap(),
            );
        }
        service
            .start_game(&host.game_id, &host.player_id)
            .await
            .unwrap();
        let game = service.game(&host.game_id).await.unwrap();
        assert_eq!(game.phase, GamePhase::Answering);
        (host, joined)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use crate::store::GameStore;
    use crate::types::GamePhase;

    #[tokio::test]
    async fn test_create_game_starts_in_lobby() {
        let (service, _store) = service();
        let ticket = service.create_game("Alice").await.unwrap();

        let game = service.game(&ticket.game_id).await.unwrap();
        assert_eq!(game.phase, GamePhase::Lobby);
        assert_eq!(game.current_round, 0);
        assert_eq!(game.total_rounds, 5);
        assert_eq!(game.questions.len(), 5);
        assert_eq!(game.code.len(), 4);
    }

    #[tokio::test]
    async fn test_creator_is_seated_as_host() {
        let (service, store) = service();
        let ticket = service.create_game("Alice").await.unwrap();

        let players = store.players_for_game(&ticket.game_id).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, ticket.player_id);
        assert_eq!(players[0].name, "Alice");
        assert_eq!(players[0].score, 0);
        assert!(players[0].is_host);
    }

    #[tokio::test]
    async fn test_exactly_one_host_per_game() {
        let (service, store) = service();
        let host = service.create_game("Alice").await.unwrap();
        service.join_game(&host.code, "Bob").await.unwrap();
        service.join_game(&host.code, "Carol").await.unwrap();

        let players = store.players_for_game(&host.game_id).await.unwrap();
        assert_eq!(players.iter().filter(|p| p.is_host).count(), 1);
    }
}

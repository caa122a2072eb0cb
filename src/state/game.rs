use ulid::Ulid;

use super::GameService;
use crate::code::{generate_game_code, normalize_code};
use crate::error::{GameError, StoreError};
use crate::questions;
use crate::store::GameUpdate;
use crate::types::{Game, GamePhase, GameTicket, Player};

/// How many fresh codes to try before giving up on creation.
const CODE_RETRY_LIMIT: usize = 5;

impl GameService {
    /// Check if a phase transition is valid
    fn is_valid_phase_transition(from: GamePhase, to: GamePhase) -> bool {
        use GamePhase::*;

        match (from, to) {
            // Normal forward flow
            (Lobby, Answering) => true,
            (Answering, Voting) => true,
            (Voting, Results) => true,

            // From Results: loop back for the next round, or finish
            (Results, Answering) => true,
            (Results, Leaderboard) => true,

            // All other transitions are invalid; nothing leaves Leaderboard
            _ => false,
        }
    }

    /// Transition a game's phase, folding any extra fields into the same
    /// write. Writing the phase the game is already in is a harmless no-op,
    /// so racing host clients converge instead of erroring.
    pub(crate) async fn transition_phase(
        &self,
        game: &Game,
        to: GamePhase,
        mut update: GameUpdate,
    ) -> Result<(), GameError> {
        if game.phase == to {
            tracing::debug!(game = %game.id, phase = ?to, "phase already applied, skipping write");
            return Ok(());
        }
        if !Self::is_valid_phase_transition(game.phase, to) {
            return Err(GameError::Validation(format!(
                "invalid phase transition from {:?} to {:?}",
                game.phase, to
            )));
        }

        update.phase = Some(to);
        self.store.update_game(&game.id, update).await?;
        tracing::info!(game = %game.id, from = ?game.phase, to = ?to, "phase transition");
        Ok(())
    }

    /// Create a new game and seat the creator as its host.
    pub async fn create_game(&self, host_name: &str) -> Result<GameTicket, GameError> {
        let name = host_name.trim();
        if name.is_empty() {
            return Err(GameError::Validation(
                "player name cannot be empty".to_string(),
            ));
        }

        let questions = questions::draw(self.config.total_rounds as usize)?;

        for _ in 0..CODE_RETRY_LIMIT {
            let code = generate_game_code();
            let game = Game {
                id: Ulid::new().to_string(),
                code: code.clone(),
                phase: GamePhase::Lobby,
                current_round: 0,
                total_rounds: self.config.total_rounds,
                current_question: questions.first().cloned().unwrap_or_default(),
                questions: questions.clone(),
                scored_round: 0,
            };

            let stored = match self.store.insert_game(game).await {
                Ok(stored) => stored,
                Err(StoreError::DuplicateKey { .. }) => {
                    tracing::debug!(%code, "game code collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let host = self
                .store
                .insert_player(Player {
                    id: Ulid::new().to_string(),
                    game_id: stored.id.clone(),
                    name: name.to_string(),
                    score: 0,
                    is_host: true,
                })
                .await?;

            tracing::info!(code = %stored.code, host = %host.name, "created game");
            return Ok(GameTicket {
                game_id: stored.id,
                code: stored.code,
                player_id: host.id,
            });
        }

        Err(GameError::Validation(
            "could not allocate a unique game code, try again".to_string(),
        ))
    }

    /// Join an existing game by code while it is still in the lobby.
    pub async fn join_game(&self, code: &str, player_name: &str) -> Result<GameTicket, GameError> {
        let name = player_name.trim();
        if name.is_empty() {
            return Err(GameError::Validation(
                "player name cannot be empty".to_string(),
            ));
        }

        let code = normalize_code(code);
        let game = self
            .store
            .find_game_by_code(&code)
            .await?
            .ok_or(GameError::NotFound)?;

        if game.phase != GamePhase::Lobby {
            return Err(GameError::AlreadyStarted);
        }

        let players = self.store.players_for_game(&game.id).await?;
        if players.len() >= self.config.max_players {
            return Err(GameError::Validation(format!(
                "the game is full ({} players max)",
                self.config.max_players
            )));
        }

        let player = self
            .store
            .insert_player(Player {
                id: Ulid::new().to_string(),
                game_id: game.id.clone(),
                name: name.to_string(),
                score: 0,
                is_host: false,
            })
            .await?;

        tracing::info!(code = %game.code, player = %player.name, "player joined");
        Ok(GameTicket {
            game_id: game.id,
            code: game.code,
            player_id: player.id,
        })
    }
}

use ulid::Ulid;

use super::GameService;
use crate::error::{GameError, StoreError};
use crate::types::{Answer, GameId, GamePhase, PlayerId};

impl GameService {
    /// Record a player's answer for the current round. Only valid while the
    /// game is answering; one answer per player per round, a second
    /// submission is rejected rather than overwritten.
    pub async fn submit_answer(
        &self,
        game_id: &GameId,
        player_id: &PlayerId,
        text: &str,
    ) -> Result<Answer, GameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::Validation(
                "answer text cannot be empty".to_string(),
            ));
        }

        let game = self.game(game_id).await?;
        if game.phase != GamePhase::Answering {
            return Err(GameError::Validation(
                "answers are only accepted during the answering phase".to_string(),
            ));
        }

        let players = self.store.players_for_game(game_id).await?;
        let player = players
            .iter()
            .find(|p| p.id == *player_id)
            .ok_or_else(|| GameError::Validation("you are not part of this game".to_string()))?;

        let answer = Answer {
            id: Ulid::new().to_string(),
            game_id: game.id.clone(),
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            round: game.current_round,
            text: text.to_string(),
        };

        match self.store.insert_answer(answer).await {
            Ok(answer) => {
                tracing::debug!(game = %game.id, round = game.current_round, player = %player.name, "answer recorded");
                Ok(answer)
            }
            Err(StoreError::DuplicateKey { .. }) => Err(GameError::Validation(
                "you already answered this round".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

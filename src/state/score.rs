use std::collections::HashMap;

use super::GameService;
use crate::error::GameError;
use crate::store::{GameUpdate, PlayerUpdate};
use crate::types::{GameId, GamePhase, PlayerId};

impl GameService {
    /// Credit correct guesses for the current round, then reveal the results.
    ///
    /// Crediting runs at most once per round: callers race for the store's
    /// scored-round claim, and the loser only converges the phase. Without
    /// the claim, two host clients firing together would double-award.
    pub async fn compute_results(&self, game_id: &GameId, actor: &PlayerId) -> Result<(), GameError> {
        let (game, _players) = self.require_host(game_id, actor).await?;

        if game.phase != GamePhase::Voting && game.phase != GamePhase::Results {
            return Err(GameError::Validation(
                "results can only be computed from the voting phase".to_string(),
            ));
        }

        if self
            .store
            .claim_round_scored(game_id, game.current_round)
            .await?
        {
            let answers = self
                .store
                .answers_for_round(game_id, game.current_round)
                .await?;
            let votes = self
                .store
                .votes_for_round(game_id, game.current_round)
                .await?;

            let mut credit: HashMap<PlayerId, u32> = HashMap::new();
            for vote in &votes {
                let Some(answer) = answers.iter().find(|a| a.id == vote.answer_id) else {
                    // Tolerate a vote whose answer row has not landed yet
                    continue;
                };
                if vote.guessed_player_id == answer.player_id {
                    *credit.entry(vote.voter_id.clone()).or_insert(0) +=
                        self.config.correct_guess_points;
                }
            }

            let players = self.store.players_for_game(game_id).await?;
            for (player_id, points) in credit {
                let Some(player) = players.iter().find(|p| p.id == player_id) else {
                    continue;
                };
                self.store
                    .update_player(
                        &player_id,
                        PlayerUpdate {
                            score: Some(player.score + points),
                        },
                    )
                    .await?;
            }

            tracing::info!(game = %game.id, round = game.current_round, "round scored");
        } else {
            tracing::debug!(
                game = %game.id,
                round = game.current_round,
                "round already scored, skipping credit"
            );
        }

        self.transition_phase(&game, GamePhase::Results, GameUpdate::default())
            .await
    }
}

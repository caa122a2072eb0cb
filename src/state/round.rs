use super::GameService;
use crate::error::GameError;
use crate::store::GameUpdate;
use crate::types::{GameId, GamePhase, PlayerId};

/// A game cannot start with fewer seated players than this.
pub const MIN_PLAYERS: usize = 2;

impl GameService {
    /// Start the game: host-only, requires at least two players. On success
    /// the game enters round 1 with the first question.
    pub async fn start_game(&self, game_id: &GameId, actor: &PlayerId) -> Result<(), GameError> {
        let (game, players) = self.require_host(game_id, actor).await?;

        if players.len() < MIN_PLAYERS {
            return Err(GameError::InsufficientPlayers {
                needed: MIN_PLAYERS,
                got: players.len(),
            });
        }

        let first_question = game.questions.first().cloned().unwrap_or_default();
        self.transition_phase(
            &game,
            GamePhase::Answering,
            GameUpdate {
                current_round: Some(1),
                current_question: Some(first_question),
                ..Default::default()
            },
        )
        .await
    }

    /// Close the answering phase and open voting. The host decides readiness;
    /// "everyone answered" is a recommended UI gate, not enforced here.
    pub async fn move_to_voting(&self, game_id: &GameId, actor: &PlayerId) -> Result<(), GameError> {
        let (game, _players) = self.require_host(game_id, actor).await?;
        self.transition_phase(&game, GamePhase::Voting, GameUpdate::default())
            .await
    }

    /// Leave the results screen: either loop back into answering for the next
    /// round, or finish on the leaderboard after the final round.
    pub async fn advance_round(&self, game_id: &GameId, actor: &PlayerId) -> Result<(), GameError> {
        let (game, _players) = self.require_host(game_id, actor).await?;

        if game.current_round >= game.total_rounds {
            return self
                .transition_phase(&game, GamePhase::Leaderboard, GameUpdate::default())
                .await;
        }

        let next_round = game.current_round + 1;
        let question = game
            .questions
            .get(next_round as usize - 1)
            .cloned()
            .unwrap_or_default();
        self.transition_phase(
            &game,
            GamePhase::Answering,
            GameUpdate {
                current_round: Some(next_round),
                current_question: Some(question),
                ..Default::default()
            },
        )
        .await
    }
}

use ulid::Ulid;

use super::GameService;
use crate::error::{GameError, StoreError};
use crate::types::{AnswerId, GameId, GamePhase, PlayerId, Vote};

impl GameService {
    /// Record a voter's guess about who authored an answer. Only valid while
    /// the game is voting; the answer must belong to the current round and
    /// neither the answer nor the guess may point back at the voter.
    pub async fn submit_vote(
        &self,
        game_id: &GameId,
        voter_id: &PlayerId,
        answer_id: &AnswerId,
        guessed_player_id: &PlayerId,
    ) -> Result<Vote, GameError> {
        let game = self.game(game_id).await?;
        if game.phase != GamePhase::Voting {
            return Err(GameError::Validation(
                "votes are only accepted during the voting phase".to_string(),
            ));
        }

        let answers = self
            .store
            .answers_for_round(game_id, game.current_round)
            .await?;
        let answer = answers.iter().find(|a| a.id == *answer_id).ok_or_else(|| {
            GameError::Validation("that answer is not part of the current round".to_string())
        })?;

        if answer.player_id == *voter_id {
            return Err(GameError::Validation(
                "you cannot vote on your own answer".to_string(),
            ));
        }
        if guessed_player_id == voter_id {
            return Err(GameError::Validation(
                "you cannot guess yourself".to_string(),
            ));
        }

        let vote = Vote {
            id: Ulid::new().to_string(),
            game_id: game.id.clone(),
            round: game.current_round,
            voter_id: voter_id.clone(),
            answer_id: answer_id.clone(),
            guessed_player_id: guessed_player_id.clone(),
            ts: chrono::Utc::now().to_rfc3339(),
        };

        match self.store.insert_vote(vote).await {
            Ok(vote) => {
                tracing::debug!(game = %game.id, round = game.current_round, voter = %voter_id, "vote recorded");
                Ok(vote)
            }
            Err(StoreError::DuplicateKey { .. }) => Err(GameError::Validation(
                "you already voted this round".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::error::GameError;
    use crate::state::GameService;
    use crate::types::GameTicket;

    async fn voting_game(service: &GameService) -> (GameTicket, GameTicket, String, String) {
        let (host, players) = started_game(service, 1).await;
        let bob = players.into_iter().next().unwrap();

        let host_answer = service
            .submit_answer(&host.game_id, &host.player_id, "host answer")
            .await
            .unwrap();
        let bob_answer = service
            .submit_answer(&host.game_id, &bob.player_id, "bob answer")
            .await
            .unwrap();
        service
            .move_to_voting(&host.game_id, &host.player_id)
            .await
            .unwrap();

        (host, bob, host_answer.id, bob_answer.id)
    }

    #[tokio::test]
    async fn test_vote_happy_path() {
        let (service, _store) = service();
        let (host, bob, host_answer, _bob_answer) = voting_game(&service).await;

        let vote = service
            .submit_vote(&host.game_id, &bob.player_id, &host_answer, &host.player_id)
            .await
            .unwrap();
        assert_eq!(vote.round, 1);
        assert_eq!(vote.guessed_player_id, host.player_id);
    }

    #[tokio::test]
    async fn test_vote_outside_voting_phase_is_rejected() {
        let (service, _store) = service();
        let (host, players) = started_game(&service, 1).await;
        let bob = &players[0];

        let answer = service
            .submit_answer(&host.game_id, &host.player_id, "host answer")
            .await
            .unwrap();

        // Still answering
        let result = service
            .submit_vote(&host.game_id, &bob.player_id, &answer.id, &host.player_id)
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_for_unknown_answer_is_rejected() {
        let (service, _store) = service();
        let (host, bob, _host_answer, _bob_answer) = voting_game(&service).await;

        let result = service
            .submit_vote(
                &host.game_id,
                &bob.player_id,
                &"bogus".to_string(),
                &host.player_id,
            )
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_on_own_answer_is_rejected() {
        let (service, _store) = service();
        let (host, bob, _host_answer, bob_answer) = voting_game(&service).await;

        let result = service
            .submit_vote(&host.game_id, &bob.player_id, &bob_answer, &host.player_id)
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[tokio::test]
    async fn test_self_guess_is_rejected() {
        let (service, _store) = service();
        let (host, bob, host_answer, _bob_answer) = voting_game(&service).await;

        let result = service
            .submit_vote(&host.game_id, &bob.player_id, &host_answer, &bob.player_id)
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[tokio::test]
    async fn test_second_vote_in_same_round_is_rejected() {
        let (service, _store) = service();
        let (host, bob, host_answer, _bob_answer) = voting_game(&service).await;

        service
            .submit_vote(&host.game_id, &bob.player_id, &host_answer, &host.player_id)
            .await
            .unwrap();
        let result = service
            .submit_vote(&host.game_id, &bob.player_id, &host_answer, &host.player_id)
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_from_stale_round_answer_is_rejected() {
        let (service, _store) = service();
        let (host, bob, host_answer, _bob_answer) = voting_game(&service).await;

        // Play the round out and enter round 2's voting phase
        service
            .compute_results(&host.game_id, &host.player_id)
            .await
            .unwrap();
        service
            .advance_round(&host.game_id, &host.player_id)
            .await
            .unwrap();
        service
            .submit_answer(&host.game_id, &host.player_id, "round two")
            .await
            .unwrap();
        service
            .move_to_voting(&host.game_id, &host.player_id)
            .await
            .unwrap();

        // The round-1 answer is no longer votable
        let result = service
            .submit_vote(&host.game_id, &bob.player_id, &host_answer, &host.player_id)
            .await;
        assert!(matches!(result, Err(GameError::Validation(_))));
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::store::{GameStore, GameUpdate, PlayerUpdate, StoreEvent, Table};
use crate::types::{Answer, Game, GameId, Player, PlayerId, Vote};

/// In-memory reference implementation of the store contract.
///
/// Tables are plain maps behind RwLocks; uniqueness constraints are enforced
/// under the write lock so inserts are atomic check-then-put operations.
#[derive(Clone)]
pub struct MemoryStore {
    games: Arc<RwLock<HashMap<GameId, Game>>>,
    players: Arc<RwLock<HashMap<PlayerId, Player>>>,
    answers: Arc<RwLock<HashMap<String, Answer>>>,
    votes: Arc<RwLock<HashMap<String, Vote>>>,
    changes: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            answers: Arc::new(RwLock::new(HashMap::new())),
            votes: Arc::new(RwLock::new(HashMap::new())),
            changes: tx,
        }
    }

    fn notify(&self, game_id: &GameId, table: Table) {
        // Ignore send errors (no subscribers connected is fine)
        let _ = self.changes.send(StoreEvent {
            game_id: game_id.clone(),
            table,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_game(&self, game: Game) -> StoreResult<Game> {
        let mut games = self.games.write().await;
        if games
            .values()
            .any(|g| g.code.eq_ignore_ascii_case(&game.code))
        {
            return Err(StoreError::DuplicateKey {
                table: "games",
                key: game.code,
            });
        }
        games.insert(game.id.clone(), game.clone());
        drop(games);

        self.notify(&game.id, Table::Games);
        Ok(game)
    }

    async fn get_game(&self, game_id: &GameId) -> StoreResult<Game> {
        self.games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                table: "games",
                id: game_id.clone(),
            })
    }

    async fn find_game_by_code(&self, code: &str) -> StoreResult<Option<Game>> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .find(|g| g.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn update_game(&self, game_id: &GameId, update: GameUpdate) -> StoreResult<()> {
        let mut games = self.games.write().await;
        let game = games.get_mut(game_id).ok_or_else(|| StoreError::NotFound {
            table: "games",
            id: game_id.clone(),
        })?;

        if let Some(phase) = update.phase {
            game.phase = phase;
        }
        if let Some(round) = update.current_round {
            game.current_round = round;
        }
        if let Some(question) = update.current_question {
            game.current_question = question;
        }
        drop(games);

        self.notify(game_id, Table::Games);
        Ok(())
    }

    async fn insert_player(&self, player: Player) -> StoreResult<Player> {
        let mut players = self.players.write().await;
        if players.contains_key(&player.id) {
            return Err(StoreError::DuplicateKey {
                table: "players",
                key: player.id,
            });
        }
        players.insert(player.id.clone(), player.clone());
        drop(players);

        self.notify(&player.game_id, Table::Players);
        Ok(player)
    }

    async fn update_player(&self, player_id: &PlayerId, update: PlayerUpdate) -> StoreResult<()> {
        let mut players = self.players.write().await;
        let player = players
            .get_mut(player_id)
            .ok_or_else(|| StoreError::NotFound {
                table: "players",
                id: player_id.clone(),
            })?;

        if let Some(score) = update.score {
            player.score = score;
        }
        let game_id = player.game_id.clone();
        drop(players);

        self.notify(&game_id, Table::Players);
        Ok(())
    }

    async fn players_for_game(&self, game_id: &GameId) -> StoreResult<Vec<Player>> {
        let mut rows: Vec<Player> = self
            .players
            .read()
            .await
            .values()
            .filter(|p| p.game_id == *game_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn insert_answer(&self, answer: Answer) -> StoreResult<Answer> {
        let mut answers = self.answers.write().await;
        if answers.values().any(|a| {
            a.game_id == answer.game_id && a.player_id == answer.player_id && a.round == answer.round
        }) {
            return Err(StoreError::DuplicateKey {
                table: "answers",
                key: format!("{}/{}/r{}", answer.game_id, answer.player_id, answer.round),
            });
        }
        answers.insert(answer.id.clone(), answer.clone());
        drop(answers);

        self.notify(&answer.game_id, Table::Answers);
        Ok(answer)
    }

    async fn answers_for_round(&self, game_id: &GameId, round: u32) -> StoreResult<Vec<Answer>> {
        let mut rows: Vec<Answer> = self
            .answers
            .read()
            .await
            .values()
            .filter(|a| a.game_id == *game_id && a.round == round)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn insert_vote(&self, vote: Vote) -> StoreResult<Vote> {
        let mut votes = self.votes.write().await;
        if votes
            .values()
            .any(|v| v.game_id == vote.game_id && v.voter_id == vote.voter_id && v.round == vote.round)
        {
            return Err(StoreError::DuplicateKey {
                table: "votes",
                key: format!("{}/{}/r{}", vote.game_id, vote.voter_id, vote.round),
            });
        }
        votes.insert(vote.id.clone(), vote.clone());
        drop(votes);

        self.notify(&vote.game_id, Table::Votes);
        Ok(vote)
    }

    async fn votes_for_round(&self, game_id: &GameId, round: u32) -> StoreResult<Vec<Vote>> {
        let mut rows: Vec<Vote> = self
            .votes
            .read()
            .await
            .values()
            .filter(|v| v.game_id == *game_id && v.round == round)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn claim_round_scored(&self, game_id: &GameId, round: u32) -> StoreResult<bool> {
        let mut games = self.games.write().await;
        let game = games.get_mut(game_id).ok_or_else(|| StoreError::NotFound {
            table: "games",
            id: game_id.clone(),
        })?;

        if game.scored_round >= round {
            return Ok(false);
        }
        game.scored_round = round;
        drop(games);

        self.notify(game_id, Table::Games);
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GamePhase;
    use std::time::Duration;

    fn sample_game(code: &str) -> Game {
        Game {
            id: ulid::Ulid::new().to_string(),
            code: code.to_string(),
            phase: GamePhase::Lobby,
            current_round: 0,
            total_rounds: 5,
            current_question: "q1".to_string(),
            questions: vec!["q1".to_string(), "q2".to_string()],
            scored_round: 0,
        }
    }

    fn sample_player(game_id: &str, name: &str, is_host: bool) -> Player {
        Player {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.to_string(),
            name: name.to_string(),
            score: 0,
            is_host,
        }
    }

    fn sample_answer(game_id: &str, player_id: &str, round: u32) -> Answer {
        Answer {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.to_string(),
            player_id: player_id.to_string(),
            player_name: "someone".to_string(),
            round,
            text: "an answer".to_string(),
        }
    }

    fn sample_vote(game_id: &str, voter_id: &str, round: u32) -> Vote {
        Vote {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.to_string(),
            round,
            voter_id: voter_id.to_string(),
            answer_id: "a1".to_string(),
            guessed_player_id: "p2".to_string(),
            ts: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_insert_game_rejects_duplicate_code() {
        let store = MemoryStore::new();
        store.insert_game(sample_game("AB2C")).await.unwrap();

        let result = store.insert_game(sample_game("ab2c")).await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateKey { table: "games", .. })
        ));
    }

    #[tokio::test]
    async fn test_find_game_by_code_is_case_insensitive() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("XYZ9")).await.unwrap();

        let found = store.find_game_by_code("xyz9").await.unwrap().unwrap();
        assert_eq!(found.id, game.id);

        assert!(store.find_game_by_code("QQQQ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_game_applies_partial_fields() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("AAAA")).await.unwrap();

        store
            .update_game(
                &game.id,
                GameUpdate {
                    phase: Some(GamePhase::Answering),
                    current_round: Some(1),
                    current_question: None,
                },
            )
            .await
            .unwrap();

        let updated = store.get_game(&game.id).await.unwrap();
        assert_eq!(updated.phase, GamePhase::Answering);
        assert_eq!(updated.current_round, 1);
        // Untouched field survives the partial update
        assert_eq!(updated.current_question, "q1");
    }

    #[tokio::test]
    async fn test_update_missing_game_is_not_found() {
        let store = MemoryStore::new();
        let result = store
            .update_game(&"missing".to_string(), GameUpdate::default())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_answer_unique_per_player_and_round() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("BBBB")).await.unwrap();

        store
            .insert_answer(sample_answer(&game.id, "p1", 1))
            .await
            .unwrap();
        let dup = store.insert_answer(sample_answer(&game.id, "p1", 1)).await;
        assert!(matches!(dup, Err(StoreError::DuplicateKey { .. })));

        // Same player, next round is fine
        store
            .insert_answer(sample_answer(&game.id, "p1", 2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_vote_unique_per_voter_and_round() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("CCCC")).await.unwrap();

        store
            .insert_vote(sample_vote(&game.id, "p1", 1))
            .await
            .unwrap();
        let dup = store.insert_vote(sample_vote(&game.id, "p1", 1)).await;
        assert!(matches!(dup, Err(StoreError::DuplicateKey { .. })));

        store
            .insert_vote(sample_vote(&game.id, "p1", 2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_round_queries_filter_by_game_and_round() {
        let store = MemoryStore::new();
        let game_a = store.insert_game(sample_game("DDDD")).await.unwrap();
        let game_b = store.insert_game(sample_game("EEEE")).await.unwrap();

        store
            .insert_answer(sample_answer(&game_a.id, "p1", 1))
            .await
            .unwrap();
        store
            .insert_answer(sample_answer(&game_a.id, "p2", 2))
            .await
            .unwrap();
        store
            .insert_answer(sample_answer(&game_b.id, "p3", 1))
            .await
            .unwrap();

        let round_1 = store.answers_for_round(&game_a.id, 1).await.unwrap();
        assert_eq!(round_1.len(), 1);
        assert_eq!(round_1[0].player_id, "p1");

        let round_2 = store.answers_for_round(&game_a.id, 2).await.unwrap();
        assert_eq!(round_2.len(), 1);
        assert_eq!(round_2[0].player_id, "p2");
    }

    #[tokio::test]
    async fn test_claim_round_scored_wins_exactly_once() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("FFFF")).await.unwrap();

        assert!(store.claim_round_scored(&game.id, 1).await.unwrap());
        assert!(!store.claim_round_scored(&game.id, 1).await.unwrap());

        // Next round is a fresh claim
        assert!(store.claim_round_scored(&game.id, 2).await.unwrap());
        assert!(!store.claim_round_scored(&game.id, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_changes_are_scoped_to_the_written_game() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        let game = store.insert_game(sample_game("GGGG")).await.unwrap();
        store
            .insert_player(sample_player(&game.id, "Alice", true))
            .await
            .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.game_id, game.id);
        assert_eq!(first.table, Table::Games);

        let second = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.game_id, game.id);
        assert_eq!(second.table, Table::Players);
    }

    #[tokio::test]
    async fn test_players_for_game_returns_stable_order() {
        let store = MemoryStore::new();
        let game = store.insert_game(sample_game("HHHH")).await.unwrap();

        for name in ["Alice", "Bob", "Carol"] {
            store
                .insert_player(sample_player(&game.id, name, false))
                .await
                .unwrap();
        }

        let first = store.players_for_game(&game.id).await.unwrap();
        let second = store.players_for_game(&game.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}

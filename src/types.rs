use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type PlayerId = String;
pub type AnswerId = String;
pub type VoteId = String;

/// One stage of the fixed game lifecycle. Transitions are monotonic through
/// the sequence, with the single results -> answering loop-back for the next
/// round; leaderboard is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Lobby,
    Answering,
    Voting,
    Results,
    Leaderboard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub code: String,
    pub phase: GamePhase,
    pub current_round: u32,
    pub total_rounds: u32,
    pub current_question: String,
    pub questions: Vec<String>,
    /// Highest round already credited by results computation (0 = none).
    /// Checked-and-set atomically so a racing host cannot double-award.
    pub scored_round: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub game_id: GameId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
}

/// An anonymous answer to the current question. `player_name` is denormalized
/// so the results view never needs a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub game_id: GameId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub round: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub game_id: GameId,
    pub round: u32,
    pub voter_id: PlayerId,
    pub answer_id: AnswerId,
    pub guessed_player_id: PlayerId,
    pub ts: String,
}

/// Everything a client needs to enter a game it created or joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameTicket {
    pub game_id: GameId,
    pub code: String,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub total_rounds: u32,
    pub max_players: usize,
    pub correct_guess_points: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: 5,
            max_players: 8,
            correct_guess_points: 100,
        }
    }
}

impl GameConfig {
    /// Load game config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self {
            total_rounds: env_or("TOTAL_ROUNDS", defaults.total_rounds),
            max_players: env_or("MAX_PLAYERS", defaults.max_players),
            correct_guess_points: env_or("CORRECT_GUESS_POINTS", defaults.correct_guess_points),
        };
        if config.total_rounds == 0 {
            tracing::warn!("TOTAL_ROUNDS must be at least 1, using default");
            config.total_rounds = defaults.total_rounds;
        }
        if config.max_players < 2 {
            tracing::warn!("MAX_PLAYERS must be at least 2, using default");
            config.max_players = defaults.max_players;
        }
        config
    }
}

fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("ignoring invalid {}={:?}, using default {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

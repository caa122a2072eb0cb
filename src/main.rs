use std::sync::Arc;

use futures::future::try_join_all;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whosaidit::client::GameClient;
use whosaidit::error::GameError;
use whosaidit::identity::IdentityStore;
use whosaidit::state::GameService;
use whosaidit::store::{GameStore, MemoryStore};
use whosaidit::types::{GameConfig, GamePhase};

const PLAYER_NAMES: &[&str] = &["Alex", "Billie", "Charlie", "Devon", "Emerson", "Frankie"];

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whosaidit=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting whosaidit self-play demo...");

    let config = GameConfig::from_env();
    let guest_count: usize = std::env::var("DEMO_PLAYERS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(3)
        .clamp(1, PLAYER_NAMES.len());

    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let service = GameService::new(store.clone(), config);

    if let Err(e) = run_demo(service, store, guest_count).await {
        tracing::error!("demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run_demo(
    service: GameService,
    store: Arc<dyn GameStore>,
    guest_count: usize,
) -> Result<(), GameError> {
    let host = service.create_game("Dana").await?;
    tracing::info!(code = %host.code, "game open");

    // The device identity survives the session, like a returning phone would
    let identity = IdentityStore::from_env();
    if let Err(e) = identity.save(&host.player_id) {
        tracing::warn!(error = %e, "could not persist device identity");
    }

    let mut guests = Vec::new();
    for name in PLAYER_NAMES.iter().take(guest_count) {
        let ticket = service.join_game(&host.code, name).await?;
        let client =
            GameClient::subscribe(store.clone(), &host.code, ticket.player_id.clone()).await?;
        guests.push(tokio::spawn(run_player(service.clone(), client)));
    }

    let host_client =
        GameClient::subscribe(store.clone(), &host.code, host.player_id.clone()).await?;
    let seated = guest_count + 1;
    let host_task = tokio::spawn(run_host(service.clone(), host_client, seated));

    host_task
        .await
        .map_err(|e| GameError::Validation(format!("host task panicked: {}", e)))??;
    let results = try_join_all(guests)
        .await
        .map_err(|e| GameError::Validation(format!("player task panicked: {}", e)))?;
    for result in results {
        result?;
    }

    Ok(())
}

/// Drive one non-host player: answer each round, then vote, until the
/// leaderboard comes up.
async fn run_player(service: GameService, client: GameClient) -> Result<(), GameError> {
    let mut rx = client.watch();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if let Some(snapshot) = snapshot {
            // One handler per phase; adding a phase is a compile-time change
            match snapshot.game.phase {
                GamePhase::Lobby => {}
                GamePhase::Answering => maybe_answer(&service, &client, &snapshot).await?,
                GamePhase::Voting => maybe_vote(&service, &client, &snapshot).await?,
                GamePhase::Results => {}
                GamePhase::Leaderboard => break,
            }
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Drive the host: seat everyone, then push the game through its phases as
/// the table becomes ready. The host plays along like everyone else.
async fn run_host(
    service: GameService,
    client: GameClient,
    seated: usize,
) -> Result<(), GameError> {
    let mut rx = client.watch();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if let Some(snapshot) = snapshot {
            match snapshot.game.phase {
                GamePhase::Lobby => {
                    if snapshot.players.len() >= seated {
                        service
                            .start_game(client.game_id(), client.player_id())
                            .await?;
                    }
                }
                GamePhase::Answering => {
                    maybe_answer(&service, &client, &snapshot).await?;
                    if snapshot.all_answered() {
                        service
                            .move_to_voting(client.game_id(), client.player_id())
                            .await?;
                    }
                }
                GamePhase::Voting => {
                    maybe_vote(&service, &client, &snapshot).await?;
                    if snapshot.all_voted() {
                        service
                            .compute_results(client.game_id(), client.player_id())
                            .await?;
                    }
                }
                GamePhase::Results => {
                    for player in snapshot.leaderboard() {
                        tracing::info!(round = snapshot.game.current_round, player = %player.name, score = player.score, "standings");
                    }
                    service
                        .advance_round(client.game_id(), client.player_id())
                        .await?;
                }
                GamePhase::Leaderboard => {
                    tracing::info!("final leaderboard");
                    for (rank, player) in snapshot.leaderboard().iter().enumerate() {
                        tracing::info!("  {}. {}: {} points", rank + 1, player.name, player.score);
                    }
                    break;
                }
            }
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

async fn maybe_answer(
    service: &GameService,
    client: &GameClient,
    snapshot: &whosaidit::client::GameSnapshot,
) -> Result<(), GameError> {
    if client.flags().await.has_answered || snapshot.has_answered(client.player_id()) {
        return Ok(());
    }
    let name = snapshot
        .player(client.player_id())
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "someone".to_string());
    let text = format!(
        "{}'s take on round {}",
        name, snapshot.game.current_round
    );
    match service
        .submit_answer(client.game_id(), client.player_id(), &text)
        .await
    {
        Ok(_) => client.mark_answered().await,
        Err(GameError::Validation(msg)) => {
            tracing::warn!(player = %name, %msg, "answer not accepted");
            client.mark_answered().await;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

async fn maybe_vote(
    service: &GameService,
    client: &GameClient,
    snapshot: &whosaidit::client::GameSnapshot,
) -> Result<(), GameError> {
    if client.flags().await.has_voted || snapshot.has_voted(client.player_id()) {
        return Ok(());
    }
    let candidates = snapshot.vote_candidates(client.player_id());
    let guessable = snapshot.guessable_players(client.player_id());
    if candidates.is_empty() || guessable.is_empty() {
        return Ok(());
    }

    let (answer_id, guessed_player_id) = {
        let mut rng = rand::rng();
        let answer = candidates[rng.random_range(0..candidates.len())];
        let guess = guessable[rng.random_range(0..guessable.len())];
        (answer.id.clone(), guess.id.clone())
    };

    match service
        .submit_vote(
            client.game_id(),
            client.player_id(),
            &answer_id,
            &guessed_player_id,
        )
        .await
    {
        Ok(_) => client.mark_voted().await,
        Err(GameError::Validation(msg)) => {
            tracing::warn!(%msg, "vote not accepted");
            client.mark_voted().await;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

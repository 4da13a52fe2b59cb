//! A loto hall full of bots.
//!
//! One admin opens a room, a handful of players join and pick cards, and
//! the drawer runs. Players shout "bingo!" with numbers they saw called
//! (sometimes with one they only hoped for); the admin checks every claim
//! against the board, approves or rejects it, and starts the next game.
//! Ctrl-C stops everything.

use std::sync::Arc;
use std::time::Duration;

use lotohall::prelude::*;
use lotohall::telemetry::init_tracing;
use rand::Rng;
use rand::seq::IndexedRandom;

const ROOM: &str = "hall-1";
const ADMIN: &str = "admin";
const SECRET: &str = "open-sesame";
const PLAYERS: &[&str] = &["anna", "boris", "chen", "dana", "emil"];
/// Numbers a player needs before claiming.
const LINE: usize = 5;

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

/// What a player shouts, if anything, given the board.
fn pick_claim(called: &[u8]) -> Option<String> {
    if called.len() < LINE * 2 {
        return None;
    }
    let mut rng = rand::rng();
    if !rng.random_bool(0.1) {
        return None;
    }
    let mut nums: Vec<u8> = called.choose_multiple(&mut rng, LINE).copied().collect();
    // Now and then, wishful thinking.
    if rng.random_bool(0.3) {
        nums[0] = rng.random_range(1..=90);
    }
    let joined: Vec<String> = nums.iter().map(u8::to_string).collect();
    Some(joined.join(","))
}

async fn player<S: JoinSink>(engine: Arc<LotoEngine<S>>, name: &'static str) -> Result<(), LotoError> {
    let client = ClientInfo::new("127.0.0.1", format!("bot/{name}"));
    engine.join(ROOM, name, SECRET, &client).await?;

    let card = rand::rng().random_range(0..engine.config().room.max_cards);
    match engine.select(ROOM, name, card).await {
        Ok(()) => tracing::info!(player = name, card, "picked a card"),
        Err(e) => tracing::info!(player = name, card, error = %e, "card already taken"),
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        if !engine.ping(ROOM, name).await {
            tracing::warn!(player = name, "no longer in the room");
            return Ok(());
        }
        let snapshot = engine.state(ROOM).await?;
        if !snapshot.running || snapshot.paused {
            continue;
        }
        if let Some(nums) = pick_claim(&snapshot.called) {
            tracing::info!(player = name, %nums, "BINGO!");
            if let Err(e) = engine.bingo(ROOM, name, &nums).await {
                tracing::info!(player = name, error = %e, "too late");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

fn claim_holds(called: &[u8], nums: &str) -> bool {
    let claimed: Vec<u8> = nums
        .split(',')
        .filter_map(|n| n.trim().parse().ok())
        .collect();
    claimed.len() >= LINE && claimed.iter().all(|n| called.contains(n))
}

async fn admin<S: JoinSink>(engine: Arc<LotoEngine<S>>) -> Result<(), LotoError> {
    let mut games = 1u32;
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    loop {
        ticker.tick().await;
        engine.ping(ROOM, ADMIN).await;
        let snapshot = engine.state(ROOM).await?;

        if snapshot.bingo_ok {
            tracing::info!(
                game = games,
                winner = ?snapshot.winner,
                numbers_drawn = snapshot.called.len(),
                "game over"
            );
            engine.restart(ROOM).await?;
            engine.start(ROOM, SECRET).await?;
            games += 1;
            continue;
        }

        let Some(claim) = snapshot.bingo_queue.first() else {
            continue;
        };
        let valid = claim_holds(&snapshot.called, &claim.nums);
        match engine.bingo_result(ROOM, valid).await? {
            Verdict::Approved(winner) => {
                tracing::info!(winner = %winner.user, nums = %winner.nums, "claim approved");
            }
            Verdict::Rejected { user, remaining } => {
                tracing::info!(%user, remaining, "claim rejected");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

async fn run<S: JoinSink>(engine: LotoEngine<S>) -> Result<(), LotoError> {
    let engine = Arc::new(engine);
    let cleaner = engine.spawn_cleaner();

    let host = ClientInfo::new("127.0.0.1", "bot/admin");
    engine.create(ROOM, ADMIN, SECRET, &host).await?;
    let interval = std::env::var("HALL_INTERVAL_SECS").unwrap_or_else(|_| "1".into());
    engine.set_interval_raw(ROOM, &interval).await?;

    let mut bots = Vec::new();
    for &name in PLAYERS {
        let engine = Arc::clone(&engine);
        bots.push(tokio::spawn(async move {
            if let Err(e) = player(engine, name).await {
                tracing::warn!(player = name, error = %e, "bot stopped");
            }
        }));
    }

    engine.start(ROOM, SECRET).await?;
    tracing::info!(room = ROOM, players = PLAYERS.len(), "hall open, Ctrl-C to close");

    tokio::select! {
        result = admin(Arc::clone(&engine)) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "admin stopped");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    for bot in &bots {
        bot.abort();
    }
    cleaner.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), LotoError> {
    init_tracing();

    let config = EngineConfig::from_env();
    match config.join_log_path.clone() {
        Some(path) => {
            tracing::info!(path = %path.display(), "logging joins to file");
            run(LotoEngine::builder()
                .config(config)
                .sink(JsonLinesSink::new(path))
                .build())
            .await
        }
        None => run(LotoEngine::builder().config(config).build()).await,
    }
}

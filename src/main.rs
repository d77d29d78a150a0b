use std::time::Duration;

use crossbeam_channel::Sender;
use rand::Rng;
use tracing::{info, Level};

use arena_royale_core::config::GameConfig;
use arena_royale_core::game::game_loop::{Game, GameCommand};
use arena_royale_core::game::ids::ObjectId;
use arena_royale_core::game::lifecycle::{SpawnMode, UniformPlacement};
use arena_royale_core::game::object::{Aabb, PlayerInput};
use arena_royale_core::game::systems::combat::BulletWeapon;
use arena_royale_core::net::sync::{ObserverUpdate, UpdateSink};
use arena_royale_core::util::vec2::Vec2;

/// Headless sink: logs deliveries instead of putting them on a wire.
/// A real deployment implements [`UpdateSink`] over its transport.
#[derive(Default)]
struct LogSink {
    updates: u64,
}

impl UpdateSink for LogSink {
    fn deliver_update(&mut self, observer: ObjectId, update: ObserverUpdate) {
        self.updates += 1;
        tracing::trace!(
            observer,
            tick = update.tick,
            full = update.dirty.full.len(),
            partial = update.dirty.partial.len(),
            "update"
        );
    }

    fn deliver_snapshot(&mut self, observer: ObjectId, snapshot: &[u8]) {
        info!(observer, bytes = snapshot.len(), "snapshot delivered");
    }

    fn deliver_victory(&mut self, observer: ObjectId) {
        info!(observer, total_updates = self.updates, "victory delivered");
    }
}

fn demo_layout(config: &GameConfig) -> Vec<(Vec2, Aabb)> {
    let center = config.map_center();
    let positions = [
        center + Vec2::new(-120.0, -120.0),
        center + Vec2::new(120.0, 80.0),
        center + Vec2::new(-60.0, 140.0),
    ];
    positions
        .iter()
        .map(|&pos| {
            (
                pos,
                Aabb::new(pos - Vec2::new(15.0, 15.0), pos + Vec2::new(15.0, 15.0)),
            )
        })
        .collect()
}

/// Scripted players so a standalone instance plays out a full match
async fn drive_bots(commands: Sender<GameCommand>, count: usize) {
    let mut bots = Vec::with_capacity(count);
    for i in 0..count {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        if commands
            .send(GameCommand::Join {
                name: format!("bot-{}", i),
                mode: SpawnMode::GasRejection,
                reply: reply_tx,
            })
            .is_err()
        {
            return;
        }
        let id = loop {
            match reply_rx.try_recv() {
                Ok(Ok(id)) => break id,
                Ok(Err(err)) => {
                    tracing::error!(?err, "bot join rejected");
                    return;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        };
        let _ = commands.send(GameCommand::Activate(id));
        bots.push(id);
    }

    loop {
        for &bot in &bots {
            let input = {
                let mut rng = rand::thread_rng();
                PlayerInput {
                    move_up: rng.gen_bool(0.4),
                    move_down: rng.gen_bool(0.4),
                    move_left: rng.gen_bool(0.4),
                    move_right: rng.gen_bool(0.4),
                    facing: rng.gen_range(0.0..std::f32::consts::TAU),
                    attack: rng.gen_bool(0.15),
                    ..Default::default()
                }
            };
            if commands
                .send(GameCommand::Input { player: bot, input })
                .is_err()
            {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Arena Royale Core v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: {}x{} map @ {} Hz",
        config.map_width, config.map_height, config.tick_rate
    );

    let (game, handles) = Game::new(
        config.clone(),
        demo_layout(&config),
        Box::new(BulletWeapon),
        Box::new(UniformPlacement),
        Box::new(LogSink::default()),
    )?;

    let bot_commands = handles.commands.clone();
    tokio::spawn(drive_bots(bot_commands, 4));

    let instance = tokio::spawn(game.run());

    let teardown = handles.teardown.clone();
    let stopped = tokio::task::spawn_blocking(move || teardown.recv());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            instance.abort();
        }
        signal = stopped => {
            if let Ok(Ok(signal)) = signal {
                info!("Instance torn down at tick {}", signal.tick);
            }
            let _ = instance.await;
        }
    }

    Ok(())
}

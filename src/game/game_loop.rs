//! Instance driver: command intake, tick body, and scheduling
//!
//! One instance owns its whole world; the tick body is the only code that
//! mutates it. Transports talk to the instance through a command channel
//! drained at the start of each tick, so every mutation lands at a tick
//! boundary and nothing in the simulation needs locking.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use rustc_hash::FxHashMap;

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::constants::{player as player_constants, tick as tick_constants};
use crate::game::ids::ObjectId;
use crate::game::lifecycle::{self, LifecycleEvent, PlacementProvider, SpawnMode};
use crate::game::object::{Aabb, Emote, KillFeedEvent, ObjectKind, Player, PlayerInput};
use crate::game::state::{GamePhase, GameState};
use crate::game::systems::combat::{self, WeaponController};
use crate::game::systems::{gas, movement, physics};
use crate::net::sync::{
    encode, GasUpdate, MapBuilding, MapDescription, ObserverUpdate, TeardownSignal, UpdateSink,
};
use crate::util::vec2::Vec2;

/// Mutations enqueued by I/O callbacks, applied at the next tick boundary
pub enum GameCommand {
    /// Reserve an id and a spawn position. The player is connected but not
    /// yet in the match until [`GameCommand::Activate`] arrives.
    Join {
        name: String,
        mode: SpawnMode,
        reply: Sender<Result<ObjectId, GameError>>,
    },
    /// The client finished loading; enter the match proper
    Activate(ObjectId),
    /// Connection closed or client quit
    Leave(ObjectId),
    /// Input frame for one player
    Input { player: ObjectId, input: PlayerInput },
    /// Ephemeral emote, relayed to observers who can see the sender
    Emote { player: ObjectId, kind: u32 },
}

/// Rolling tick-duration window, reported once per window
#[derive(Default)]
struct LoadMonitor {
    samples: VecDeque<Duration>,
}

impl LoadMonitor {
    fn record(&mut self, elapsed: Duration, budget: Duration) {
        self.samples.push_back(elapsed);
        if self.samples.len() >= tick_constants::LOAD_SAMPLE_WINDOW {
            let total: Duration = self.samples.iter().sum();
            let mean = total / self.samples.len() as u32;
            let load = mean.as_secs_f64() / budget.as_secs_f64() * 100.0;
            tracing::info!(
                mean_us = mean.as_micros() as u64,
                load_pct = format!("{:.1}", load),
                "tick load report"
            );
            self.samples.clear();
        }
    }
}

/// Channel ends the instance owner keeps
pub struct GameHandles {
    pub commands: Sender<GameCommand>,
    pub teardown: Receiver<TeardownSignal>,
}

/// One running game instance
pub struct Game {
    config: GameConfig,
    state: GameState,
    weapon: Box<dyn WeaponController>,
    placement: Box<dyn PlacementProvider>,
    sink: Box<dyn UpdateSink>,
    commands: Receiver<GameCommand>,
    teardown_tx: Sender<TeardownSignal>,
    teardown_sent: bool,
    /// Map description, encoded once and replayed to every joiner
    initial_snapshot: Vec<u8>,
    load: LoadMonitor,
}

impl Game {
    pub fn new(
        config: GameConfig,
        layout: Vec<(Vec2, Aabb)>,
        weapon: Box<dyn WeaponController>,
        placement: Box<dyn PlacementProvider>,
        sink: Box<dyn UpdateSink>,
    ) -> Result<(Self, GameHandles), GameError> {
        let mut state = GameState::new(&config);
        let mut buildings = Vec::with_capacity(layout.len());
        for (position, scope_volume) in layout {
            let id = state.add_building(position, scope_volume)?;
            buildings.push(MapBuilding {
                id,
                position,
                scope_min: scope_volume.min,
                scope_max: scope_volume.max,
            });
        }
        let initial_snapshot = encode(&MapDescription {
            width: config.map_width,
            height: config.map_height,
            buildings,
        })?;

        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (teardown_tx, teardown_rx) = crossbeam_channel::unbounded();

        let game = Self {
            config,
            state,
            weapon,
            placement,
            sink,
            commands: command_rx,
            teardown_tx,
            teardown_sent: false,
            initial_snapshot,
            load: LoadMonitor::default(),
        };
        let handles = GameHandles {
            commands: command_tx,
            teardown: teardown_rx,
        };
        Ok((game, handles))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Direct world access for embedding and scenario setup
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                GameCommand::Join { name, mode, reply } => {
                    let result = self.add_player(name, mode);
                    let _ = reply.send(result);
                }
                GameCommand::Activate(id) => self.activate_player(id),
                GameCommand::Leave(id) => self.remove_player(id),
                GameCommand::Input { player, input } => {
                    // After the match is decided inputs are dead letters;
                    // accepting them would undo the winner's cleared input
                    if self.state.match_state.phase == GamePhase::Over {
                        continue;
                    }
                    if let Some(p) = self.state.players.get_mut(&player) {
                        if p.connected && !p.dead {
                            p.input = input;
                        }
                    }
                }
                GameCommand::Emote { player, kind } => {
                    if self.state.alive_players.contains(&player) {
                        self.state.emotes.push(Emote { player, kind });
                    }
                }
            }
        }
    }

    /// Reserve identity and position for a joiner. Not yet part of the
    /// match: no world object is visible until activation.
    fn add_player(&mut self, name: String, mode: SpawnMode) -> Result<ObjectId, GameError> {
        let bounds = Vec2::new(self.config.map_width, self.config.map_height);
        let position =
            lifecycle::spawn_position(mode, &self.state.gas, bounds, self.placement.as_mut());
        let id = self.state.ids.allocate()?;
        let mut player = Player::new(id, name, position);
        player.invuln_timer = Some(
            (player_constants::SPAWN_INVULN_DURATION * self.config.tick_rate as f32).ceil() as u32,
        );
        self.state.players.insert(id, player);
        self.state.connected_players.insert(id);
        tracing::debug!(id, "player reserved");
        Ok(id)
    }

    fn activate_player(&mut self, id: ObjectId) {
        let Some(player) = self.state.players.get_mut(&id) else {
            tracing::warn!(id, "activate for unknown player");
            return;
        };
        if player.joined || !player.connected {
            return;
        }
        player.joined = true;
        self.state.alive_players.insert(id);
        self.state.dirty.mark_full(id);
        self.state.force_visibility_refresh = true;
        self.state.kill_feed.push(KillFeedEvent::Joined { player: id });
        self.sink.deliver_snapshot(id, &self.initial_snapshot);
        tracing::info!(id, players = self.state.alive_count(), "player joined");
    }

    fn remove_player(&mut self, id: ObjectId) {
        let Some(player) = self.state.players.get_mut(&id) else {
            return;
        };
        player.connected = false;
        player.input.clear();
        let was_dead = player.dead;
        let joined = player.joined;
        self.state.connected_players.remove(&id);
        if joined && !was_dead {
            self.state.kill_feed.push(KillFeedEvent::Left { player: id });
        }

        if self.config.allow_despawn {
            self.state.alive_players.remove(&id);
            self.state.players.remove(&id);
            self.state.delete_object(id);
            for p in self.state.players.values_mut() {
                if p.spectating == Some(id) {
                    p.spectating = None;
                }
            }
        }
        // Without despawn the player stays frozen in place and can still
        // win or die to the gas
        tracing::info!(id, "player left");
    }

    /// One simulation step. Returns Ok(false) once the instance has
    /// stopped; a stopped instance does no work and must not reschedule.
    pub fn tick(&mut self) -> Result<bool, GameError> {
        if self.state.stopped {
            return Ok(false);
        }

        self.drain_commands();
        self.state.tick += 1;

        physics::update(&mut self.state, &self.config);
        combat::update(&mut self.state, self.config.dt());
        gas::update(&mut self.state, self.config.tick_rate);
        movement::update(&mut self.state, &self.config, self.weapon.as_mut());

        self.sync_observers()?;
        self.state.reset_tick_scratch();

        for event in lifecycle::evaluate(&mut self.state, &self.config) {
            match event {
                LifecycleEvent::MatchStarted => {}
                LifecycleEvent::VictoryDecided { winner } => {
                    if !self.state.match_state.victory_sent {
                        self.state.match_state.victory_sent = true;
                        self.sink.deliver_victory(winner);
                    }
                }
                LifecycleEvent::Teardown => {
                    if !self.teardown_sent {
                        self.teardown_sent = true;
                        let signal = TeardownSignal {
                            tick: self.state.tick,
                        };
                        if self.teardown_tx.send(signal).is_err() {
                            tracing::warn!("teardown receiver dropped");
                        }
                    }
                }
            }
        }

        Ok(!self.state.stopped)
    }

    /// Rebuild the spatial index, recompute stale visible sets, and emit one
    /// narrowed update per observer. Dead observers receive their spectate
    /// target's update instead of their own.
    fn sync_observers(&mut self) -> Result<(), GameError> {
        let Self {
            config,
            state,
            sink,
            ..
        } = self;

        let positions = state.dynamic_positions();
        state.visibility.rebuild_dynamic(positions.iter().copied());

        let gas_update = state.gas.is_dirty().then(|| GasUpdate {
            position: state.gas.position,
            radius: state.gas.radius,
            dps: state.gas.dps,
        });

        let observers: Vec<ObjectId> = state
            .players
            .values()
            .filter(|p| p.joined && p.connected && !p.dead)
            .map(|p| p.id)
            .collect();

        let mut produced: FxHashMap<ObjectId, ObserverUpdate> = FxHashMap::default();
        for id in observers {
            let (position, zoom, stale) = {
                let Some(p) = state.players.get(&id) else {
                    continue;
                };
                (
                    p.position,
                    p.zoom,
                    state.force_visibility_refresh
                        || p.moves_since_recompute >= config.visibility_recompute_moves,
                )
            };
            // On recompute, keep the pre-refresh set: deleted objects only
            // exist in it, the refreshed grid has already dropped them
            let previous = if stale {
                let visible = state.visibility.visible_set(position, zoom)?;
                let Some(p) = state.players.get_mut(&id) else {
                    continue;
                };
                let previous = std::mem::replace(&mut p.visible, visible);
                p.moves_since_recompute = 0;
                Some(previous)
            } else {
                None
            };

            let Some(player) = state.players.get(&id) else {
                continue;
            };
            let dirty = state.dirty.narrow_for_observer(
                id,
                &player.visible,
                previous.as_ref().unwrap_or(&player.visible),
            );
            let emotes: Vec<Emote> = state
                .emotes
                .iter()
                .filter(|e| e.player == id || player.visible.contains(&e.player))
                .copied()
                .collect();
            let spawned: Vec<(ObjectId, ObjectKind)> = dirty
                .full
                .iter()
                .filter_map(|&fid| state.object_kind(fid).map(|kind| (fid, kind)))
                .collect();

            let update = ObserverUpdate {
                observer: id,
                tick: state.tick,
                dirty,
                spawned,
                kill_feed: state.kill_feed.clone(),
                emotes,
                gas: gas_update,
            };
            if update.is_empty() {
                continue;
            }
            sink.deliver_update(id, update.clone());
            produced.insert(id, update);
        }

        // Spectators ride along on their target's stream. A target that is
        // gone or dead triggers reassignment to any remaining live player.
        let spectators: Vec<ObjectId> = state
            .players
            .values()
            .filter(|p| p.joined && p.connected && p.dead)
            .map(|p| p.id)
            .collect();
        for spectator in spectators {
            let target = {
                let current = state.players.get(&spectator).and_then(|p| p.spectating);
                match current {
                    Some(t) if state.players.get(&t).is_some_and(|p| p.spectatable()) => Some(t),
                    _ => state
                        .players
                        .values()
                        .find(|p| p.spectatable())
                        .map(|p| p.id),
                }
            };
            if let Some(p) = state.players.get_mut(&spectator) {
                p.spectating = target;
            }
            if let Some(update) = target.and_then(|t| produced.get(&t)) {
                sink.deliver_update(spectator, update.clone());
            }
        }

        Ok(())
    }

    /// Drive the instance at the configured cadence until it stops.
    ///
    /// Each iteration runs one tick, then sleeps for whatever remains of
    /// the tick interval. A tick that overruns gets a zero sleep and the
    /// next tick starts immediately; there is no catch-up of missed ticks.
    pub async fn run(mut self) {
        let interval = self.config.tick_interval();
        tracing::info!(
            tick_rate = self.config.tick_rate,
            "game loop started"
        );
        loop {
            let started = Instant::now();
            match self.tick() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    tracing::error!(?err, "tick failed, stopping instance");
                    break;
                }
            }
            let elapsed = started.elapsed();
            self.load.record(elapsed, interval);
            tokio::time::sleep(interval.saturating_sub(elapsed)).await;
        }
        tracing::info!(tick = self.state.tick, "game loop exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::game::systems::combat::{BulletWeapon, DamageCause, DamageRecord};
    use crate::game::lifecycle::UniformPlacement;

    #[derive(Default, Clone)]
    struct RecordingSink {
        updates: Arc<Mutex<Vec<(ObjectId, ObserverUpdate)>>>,
        snapshots: Arc<Mutex<Vec<ObjectId>>>,
        victories: Arc<Mutex<Vec<ObjectId>>>,
    }

    impl UpdateSink for RecordingSink {
        fn deliver_update(&mut self, observer: ObjectId, update: ObserverUpdate) {
            self.updates.lock().unwrap().push((observer, update));
        }
        fn deliver_snapshot(&mut self, observer: ObjectId, _snapshot: &[u8]) {
            self.snapshots.lock().unwrap().push(observer);
        }
        fn deliver_victory(&mut self, observer: ObjectId) {
            self.victories.lock().unwrap().push(observer);
        }
    }

    fn test_game(config: GameConfig) -> (Game, GameHandles, RecordingSink) {
        let sink = RecordingSink::default();
        let (game, handles) = Game::new(
            config,
            Vec::new(),
            Box::new(BulletWeapon),
            Box::new(UniformPlacement),
            Box::new(sink.clone()),
        )
        .unwrap();
        (game, handles, sink)
    }

    fn join(handles: &GameHandles, game: &mut Game, pos: Vec2) -> ObjectId {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        handles
            .commands
            .send(GameCommand::Join {
                name: "p".to_string(),
                mode: SpawnMode::Fixed(pos),
                reply: reply_tx,
            })
            .unwrap();
        game.tick().unwrap();
        let id = reply_rx.try_recv().unwrap().unwrap();
        handles.commands.send(GameCommand::Activate(id)).unwrap();
        game.tick().unwrap();
        id
    }

    #[test]
    fn test_join_delivers_snapshot_and_full_update() {
        let (mut game, handles, sink) = test_game(GameConfig::default());
        let id = join(&handles, &mut game, Vec2::new(100.0, 100.0));

        assert_eq!(*sink.snapshots.lock().unwrap(), vec![id]);
        let updates = sink.updates.lock().unwrap();
        let (observer, update) = updates.last().expect("activation update");
        assert_eq!(*observer, id);
        assert!(update.dirty.full.contains(&id));
        assert!(update.spawned.contains(&(id, ObjectKind::Player)));
        assert!(update
            .kill_feed
            .contains(&KillFeedEvent::Joined { player: id }));
        // spawn protection is armed on join and runs on a deadline
        assert!(game.state().players[&id].invulnerable);
        assert!(game.state().players[&id].invuln_timer.is_some());
    }

    #[test]
    fn test_countdown_cancelled_by_leave() {
        let (mut game, handles, _sink) = test_game(GameConfig::default());
        join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));
        game.tick().unwrap();
        assert!(game.state().match_state.start_timer.is_some());

        handles.commands.send(GameCommand::Leave(b)).unwrap();
        game.tick().unwrap();
        assert!(game.state().match_state.start_timer.is_none());
        assert_eq!(game.state().match_state.phase, GamePhase::Waiting);
    }

    #[test]
    fn test_full_match_flow() {
        let config = GameConfig {
            start_delay: 0.1,
            over_delay: 0.1,
            ..Default::default()
        };
        let (mut game, handles, sink) = test_game(config.clone());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));

        for _ in 0..config.start_delay_ticks() + 1 {
            game.tick().unwrap();
        }
        assert_eq!(game.state().match_state.phase, GamePhase::Active);

        combat::apply_damage(
            game.state_mut(),
            DamageRecord {
                target: b,
                amount: 1000.0,
                source: Some(a),
                cause: DamageCause::Gas,
            },
        );
        game.tick().unwrap();
        assert_eq!(game.state().match_state.phase, GamePhase::Over);
        assert_eq!(*sink.victories.lock().unwrap(), vec![a]);

        for _ in 0..config.over_delay_ticks() + 1 {
            game.tick().unwrap();
        }
        assert_eq!(game.state().match_state.phase, GamePhase::Stopped);
        assert_eq!(handles.teardown.try_iter().count(), 1);

        // stopped instances refuse further work
        assert!(!game.tick().unwrap());
        assert_eq!(*sink.victories.lock().unwrap(), vec![a]);
    }

    #[test]
    fn test_input_rejected_once_match_is_over() {
        let config = GameConfig {
            start_delay: 0.1,
            over_delay: 10.0,
            ..Default::default()
        };
        let (mut game, handles, _sink) = test_game(config.clone());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));
        for _ in 0..config.start_delay_ticks() + 1 {
            game.tick().unwrap();
        }
        combat::apply_damage(
            game.state_mut(),
            DamageRecord {
                target: b,
                amount: 1000.0,
                source: Some(a),
                cause: DamageCause::Gas,
            },
        );
        game.tick().unwrap();
        assert_eq!(game.state().match_state.phase, GamePhase::Over);

        let frozen_at = game.state().players[&a].position;
        handles
            .commands
            .send(GameCommand::Input {
                player: a,
                input: PlayerInput {
                    move_right: true,
                    ..Default::default()
                },
            })
            .unwrap();
        game.tick().unwrap();
        assert_eq!(game.state().players[&a].position, frozen_at);
    }

    #[test]
    fn test_input_moves_player_next_tick() {
        let (mut game, handles, _sink) = test_game(GameConfig::default());
        let id = join(&handles, &mut game, Vec2::new(100.0, 100.0));

        handles
            .commands
            .send(GameCommand::Input {
                player: id,
                input: PlayerInput {
                    move_right: true,
                    ..Default::default()
                },
            })
            .unwrap();
        // input applies at the next tick boundary, not between ticks
        assert_eq!(game.state().players[&id].position.x, 100.0);
        game.tick().unwrap();
        assert!(game.state().players[&id].position.x > 100.0);
    }

    #[test]
    fn test_spectator_rides_target_stream() {
        let config = GameConfig {
            start_delay: 0.1,
            ..Default::default()
        };
        let (mut game, handles, sink) = test_game(config.clone());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));
        let c = join(&handles, &mut game, Vec2::new(110.0, 100.0));
        for _ in 0..config.start_delay_ticks() + 1 {
            game.tick().unwrap();
        }

        combat::apply_damage(
            game.state_mut(),
            DamageRecord {
                target: c,
                amount: 1000.0,
                source: Some(a),
                cause: DamageCause::Gas,
            },
        );
        // something must be dirty for the targets to produce an update
        game.state_mut().dirty.mark_partial(a);
        game.state_mut().dirty.mark_partial(b);
        sink.updates.lock().unwrap().clear();
        game.tick().unwrap();

        let updates = sink.updates.lock().unwrap();
        let spectated: Vec<_> = updates
            .iter()
            .filter(|(recipient, _)| *recipient == c)
            .collect();
        assert_eq!(spectated.len(), 1);
        // the spectator receives the stream of a live player, not its own
        assert_ne!(spectated[0].1.observer, c);
        assert!(game.state().players[&c].spectating.is_some());
    }

    #[test]
    fn test_emote_relayed_to_nearby_observers_only() {
        let (mut game, handles, sink) = test_game(GameConfig::default());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));
        let far = join(&handles, &mut game, Vec2::new(600.0, 600.0));

        sink.updates.lock().unwrap().clear();
        handles
            .commands
            .send(GameCommand::Emote { player: a, kind: 3 })
            .unwrap();
        game.tick().unwrap();

        let updates = sink.updates.lock().unwrap();
        let recipients: Vec<ObjectId> = updates
            .iter()
            .filter(|(_, u)| !u.emotes.is_empty())
            .map(|(r, _)| *r)
            .collect();
        assert!(recipients.contains(&a));
        assert!(recipients.contains(&b));
        assert!(!recipients.contains(&far));
    }

    #[test]
    fn test_despawn_notifies_observers_that_saw_the_object() {
        let (mut game, handles, sink) = test_game(GameConfig::default());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let b = join(&handles, &mut game, Vec2::new(105.0, 100.0));

        sink.updates.lock().unwrap().clear();
        handles.commands.send(GameCommand::Leave(b)).unwrap();
        game.tick().unwrap();

        let updates = sink.updates.lock().unwrap();
        let notified = updates
            .iter()
            .any(|(recipient, u)| *recipient == a && u.dirty.deleted.contains(&b));
        assert!(notified, "observer was not told to remove the despawned player");
    }

    #[test]
    fn test_expired_bullet_removal_reaches_observers() {
        let (mut game, handles, sink) = test_game(GameConfig::default());
        let a = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        let bullet = game
            .state_mut()
            .spawn_bullet(a, Vec2::new(102.0, 100.0), Vec2::new(1.0, 0.0))
            .unwrap();
        // a short fuse keeps the expiry inside the shooter's viewport
        game.state_mut().bullets[0].max_distance = 15.0;

        for _ in 0..10 {
            game.tick().unwrap();
        }
        let updates = sink.updates.lock().unwrap();
        assert!(updates
            .iter()
            .any(|(recipient, u)| *recipient == a && u.dirty.deleted.contains(&bullet)));
    }

    #[test]
    fn test_leave_despawns_and_frees_id() {
        let (mut game, handles, _sink) = test_game(GameConfig::default());
        let id = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        handles.commands.send(GameCommand::Leave(id)).unwrap();
        game.tick().unwrap();
        assert!(!game.state().players.contains_key(&id));
        assert!(!game.state().alive_players.contains(&id));

        let next = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        assert_eq!(next, id);
    }

    #[test]
    fn test_frozen_leave_keeps_player_in_world() {
        let config = GameConfig {
            allow_despawn: false,
            ..Default::default()
        };
        let (mut game, handles, _sink) = test_game(config);
        let id = join(&handles, &mut game, Vec2::new(100.0, 100.0));
        handles.commands.send(GameCommand::Leave(id)).unwrap();
        game.tick().unwrap();
        assert!(game.state().players.contains_key(&id));
        assert!(game.state().alive_players.contains(&id));
        assert!(!game.state().players[&id].connected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_drives_match_to_teardown() {
        let config = GameConfig {
            tick_rate: 100,
            start_delay: 0.05,
            over_delay: 0.05,
            ..Default::default()
        };
        let sink = RecordingSink::default();
        let (game, handles) = Game::new(
            config,
            Vec::new(),
            Box::new(BulletWeapon),
            Box::new(UniformPlacement),
            Box::new(sink.clone()),
        )
        .unwrap();
        let loop_task = tokio::spawn(game.run());

        let mut ids = Vec::new();
        for pos in [Vec2::new(100.0, 100.0), Vec2::new(105.0, 100.0)] {
            let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
            handles
                .commands
                .send(GameCommand::Join {
                    name: "p".to_string(),
                    mode: SpawnMode::Fixed(pos),
                    reply: reply_tx,
                })
                .unwrap();
            let id = tokio::task::spawn_blocking(move || {
                reply_rx.recv_timeout(Duration::from_secs(5)).unwrap()
            })
            .await
            .unwrap()
            .unwrap();
            handles.commands.send(GameCommand::Activate(id)).unwrap();
            ids.push(id);
        }

        // let the start countdown elapse, then collapse the match
        tokio::time::sleep(Duration::from_millis(300)).await;
        handles.commands.send(GameCommand::Leave(ids[1])).unwrap();

        let teardown = handles.teardown.clone();
        let signal = tokio::task::spawn_blocking(move || {
            teardown.recv_timeout(Duration::from_secs(5)).unwrap()
        })
        .await
        .unwrap();
        assert!(signal.tick > 0);
        assert_eq!(*sink.victories.lock().unwrap(), vec![ids[0]]);

        loop_task.await.unwrap();
    }
}

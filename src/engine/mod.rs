use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::types::{
    Direction, GameOverReason, GameSummary, MapView, Personality, RuntimeEvent, Snapshot, Vec2,
};
use crate::world::{Tile, TileMap};

pub mod mode_timer;
pub mod personality;
pub mod player;
pub mod pursuer;

mod collision_system;
mod spawn_system;

use self::mode_timer::{broadcast_global_mode, frighten_all, release_frightened};
use self::mode_timer::{FrightenedTimer, ModeTimer};
use self::personality::TargetContext;
use self::player::Player;
use self::pursuer::Pursuer;

#[derive(Clone, Debug, Default)]
struct RoundStats {
    pellets_eaten: u32,
    pursuers_eaten: u32,
}

#[derive(Clone, Debug, Default)]
pub struct GameEngineOptions {
    /// Ends the round as a timeout after this many ticks.
    pub tick_limit: Option<u64>,
}

/// One round of play. Owns the map, both mode clocks, the player and the
/// pursuers; `step` advances everything by exactly one tick.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: SimulationConfig,
    pub map: TileMap,

    rng: StdRng,
    player: Player,
    pursuers: Vec<Pursuer>,
    mode_timer: ModeTimer,
    frightened_timer: FrightenedTimer,
    events: Vec<RuntimeEvent>,
    stats: RoundStats,
    options: GameEngineOptions,

    tick_counter: u64,
    ended: bool,
    end_reason: Option<GameOverReason>,
    next_id_counter: u64,
}

impl GameEngine {
    pub fn new(
        map: TileMap,
        config: SimulationConfig,
        seed: u64,
        options: GameEngineOptions,
    ) -> Self {
        let config = config.sanitized();
        let mut engine = Self {
            mode_timer: ModeTimer::new(&config),
            frightened_timer: FrightenedTimer::new(&config),
            player: Player::new(Vec2::default(), config.starting_lives),
            config,
            map,
            rng: StdRng::seed_from_u64(seed),
            pursuers: Vec::new(),
            events: Vec::new(),
            stats: RoundStats::default(),
            options,
            tick_counter: 0,
            ended: false,
            end_reason: None,
            next_id_counter: 1,
        };
        engine.place_power_pellets();
        let spawn = engine.pick_player_spawn();
        engine.player.respawn(spawn);
        engine.spawn_pursuers();
        engine
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn mode_timer(&self) -> &ModeTimer {
        &self.mode_timer
    }

    pub fn frightened_timer(&self) -> &FrightenedTimer {
        &self.frightened_timer
    }

    pub fn get_map_view(&self) -> MapView {
        self.map.to_map_view()
    }

    pub fn receive_input(&mut self, dir: Direction) {
        if self.ended {
            return;
        }
        self.player.set_intended(dir);
    }

    /// Timers, then player, then pursuers, then collisions, then the win
    /// check. The order is fixed.
    pub fn step(&mut self) {
        if self.ended {
            return;
        }
        self.tick_counter += 1;

        self.update_timers();
        self.update_player();
        self.update_pursuers();
        if self.resolve_pursuer_collisions() {
            return;
        }
        self.check_victory();

        if !self.ended
            && self
                .options
                .tick_limit
                .is_some_and(|limit| self.tick_counter >= limit)
        {
            self.finish(GameOverReason::Timeout);
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            global_mode: self.mode_timer.current(),
            frightened_remaining: self.frightened_timer.remaining(),
            player: self.player.to_view(),
            pursuers: self.pursuers.iter().map(Pursuer::to_view).collect(),
            remaining_collectibles: self.map.remaining_collectibles(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
            outcome: self.end_reason,
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            reason: self.end_reason.unwrap_or(GameOverReason::Timeout),
            ticks: self.tick_counter,
            score: self.player.score,
            lives_left: self.player.lives,
            pursuers_eaten: self.stats.pursuers_eaten,
            pellets_eaten: self.stats.pellets_eaten,
        }
    }

    fn update_timers(&mut self) {
        if let Some(mode) = self.mode_timer.tick() {
            debug!(tick = self.tick_counter, ?mode, "global mode switched");
            broadcast_global_mode(&mut self.pursuers, mode);
            self.events.push(RuntimeEvent::ModeChanged { mode });
        }
        if self.frightened_timer.tick() {
            let resumed_mode = self.mode_timer.current();
            debug!(tick = self.tick_counter, ?resumed_mode, "frightened expired");
            release_frightened(&mut self.pursuers, resumed_mode);
            self.events
                .push(RuntimeEvent::FrightenedEnded { resumed_mode });
        }
    }

    fn update_player(&mut self) {
        if let Some(entered) = self.player.step(&self.map) {
            self.consume_tile(entered);
        }
    }

    fn consume_tile(&mut self, pos: Vec2) {
        match self.map.tile_value(pos) {
            Some(Tile::Pellet) => {
                self.map.set_tile(pos, Tile::Empty);
                self.player.score += self.config.pellet_score;
                self.stats.pellets_eaten += 1;
                self.events.push(RuntimeEvent::PelletEaten { x: pos.x, y: pos.y });
            }
            Some(Tile::PowerPellet) => {
                self.map.set_tile(pos, Tile::Empty);
                self.player.score += self.config.power_pellet_score;
                self.stats.pellets_eaten += 1;
                self.events
                    .push(RuntimeEvent::PowerPelletEaten { x: pos.x, y: pos.y });
                self.activate_frightened();
            }
            _ => {}
        }
    }

    fn activate_frightened(&mut self) {
        self.frightened_timer.activate();
        frighten_all(&mut self.pursuers);
        self.events.push(RuntimeEvent::FrightenedStarted {
            units: self.frightened_timer.duration(),
        });
    }

    fn update_pursuers(&mut self) {
        for idx in 0..self.pursuers.len() {
            let direct_position = self
                .pursuers
                .iter()
                .find(|p| p.personality == Personality::Direct)
                .map(|p| p.position);
            let ctx = TargetContext {
                map: &self.map,
                player_position: self.player.position,
                player_direction: self.player.direction,
                player_intended: self.player.intended,
                pursuer_position: self.pursuers[idx].position,
                direct_position,
            };
            let pursuer = &mut self.pursuers[idx];
            pursuer.update(&ctx);
            pursuer.update_direction(&self.map, &mut self.rng);
            pursuer.advance(&self.map, self.config.frightened_speed);
        }
    }

    fn check_victory(&mut self) {
        if self.ended || self.map.has_collectibles() {
            return;
        }
        self.finish(GameOverReason::Victory);
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.ended = true;
        self.end_reason = Some(reason);
        self.events.push(match reason {
            GameOverReason::Victory => RuntimeEvent::RoundWon,
            GameOverReason::Caught => RuntimeEvent::RoundLost,
            GameOverReason::Timeout => RuntimeEvent::RoundTimedOut,
        });
        info!(
            map = self.map.name(),
            tick = self.tick_counter,
            score = self.player.score,
            ?reason,
            "round finished"
        );
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id_counter);
        self.next_id_counter = self.next_id_counter.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimulationConfig;
    use crate::engine::personality::TargetContext;
    use crate::engine::{GameEngine, GameEngineOptions};
    use crate::types::{Direction, GameOverReason, Personality, PursuerMode, RuntimeEvent, Vec2};
    use crate::world::{parse_test_map, Tile, TileMap};

    const MINI: [&str; 7] = [
        "11111111111",
        "10000000001",
        "10111011101",
        "00022222000",
        "10111011101",
        "10000000001",
        "11111111111",
    ];

    // Pursuers live in the bottom corridor, the player in the top one.
    const SPLIT: [&str; 5] = [
        "1111111",
        "1000001",
        "1111111",
        "1322231",
        "1111111",
    ];

    fn quiet_config() -> SimulationConfig {
        SimulationConfig {
            power_pellets_per_round: 0,
            ..SimulationConfig::default()
        }
    }

    fn engine_on(rows: &[&str], seed: u64) -> GameEngine {
        GameEngine::new(
            parse_test_map(rows),
            quiet_config(),
            seed,
            GameEngineOptions::default(),
        )
    }

    #[test]
    fn spawns_four_personalities_around_the_middle_house_tile() {
        let engine = engine_on(&MINI, 1);
        let placed: Vec<(Personality, Vec2)> = engine
            .pursuers()
            .iter()
            .map(|p| (p.personality, p.position))
            .collect();
        assert_eq!(
            placed,
            vec![
                (Personality::Direct, Vec2::new(5, 3)),
                (Personality::Ambush, Vec2::new(4, 3)),
                (Personality::Cautious, Vec2::new(6, 3)),
                (Personality::Flanker, Vec2::new(7, 3)),
            ]
        );
        assert!(engine
            .pursuers()
            .iter()
            .all(|p| p.mode == PursuerMode::Scatter));
    }

    #[test]
    fn small_house_spawns_only_the_pursuers_that_fit() {
        let engine = engine_on(&["1111", "1221", "1001", "1111"], 1);
        let personalities: Vec<Personality> =
            engine.pursuers().iter().map(|p| p.personality).collect();
        assert_eq!(personalities, vec![Personality::Direct, Personality::Ambush]);
        assert_eq!(engine.pursuers()[0].position, Vec2::new(2, 1));
    }

    #[test]
    fn map_without_house_runs_with_zero_pursuers() {
        let mut engine = engine_on(&["11111", "10001", "11111"], 3);
        assert!(engine.pursuers().is_empty());
        for _ in 0..20 {
            engine.step();
        }
        assert!(!engine.is_ended());
    }

    #[test]
    fn empty_map_does_not_panic() {
        let mut engine = GameEngine::new(
            TileMap::empty("void"),
            quiet_config(),
            9,
            GameEngineOptions::default(),
        );
        engine.receive_input(Direction::Left);
        engine.step();
        assert!(engine.pursuers().is_empty());
        assert_eq!(engine.end_reason(), Some(GameOverReason::Victory));
    }

    #[test]
    fn player_spawn_tile_is_cleared_without_scoring() {
        let engine = engine_on(&MINI, 5);
        let spawn = engine.player().position;
        assert_eq!(engine.map.tile_value(spawn), Some(Tile::Empty));
        assert_eq!(engine.player().score, 0);
    }

    #[test]
    fn round_start_places_power_pellets() {
        let engine = GameEngine::new(
            parse_test_map(&MINI),
            SimulationConfig::default(),
            11,
            GameEngineOptions::default(),
        );
        let pellets = engine.map.cells_matching(|tile| tile == Tile::PowerPellet);
        assert_eq!(pellets.len(), 2);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let map = crate::maps::builtin_maps()[0]
            .build()
            .expect("classic should build");
        let mut a = GameEngine::new(
            map.clone(),
            SimulationConfig::default(),
            424_242,
            GameEngineOptions::default(),
        );
        let mut b = GameEngine::new(
            map,
            SimulationConfig::default(),
            424_242,
            GameEngineOptions::default(),
        );
        let turns = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
        for tick in 0..400usize {
            if tick % 12 == 0 {
                a.receive_input(turns[(tick / 12) % 4]);
                b.receive_input(turns[(tick / 12) % 4]);
            }
            a.step();
            b.step();
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);
            assert_eq!(sa.player.x, sb.player.x);
            assert_eq!(sa.player.y, sb.player.y);
            assert_eq!(sa.player.score, sb.player.score);
            assert_eq!(sa.pursuers.len(), sb.pursuers.len());
            for (pa, pb) in sa.pursuers.iter().zip(sb.pursuers.iter()) {
                assert_eq!((pa.x, pa.y, pa.mode), (pb.x, pb.y, pb.mode));
            }
            if a.is_ended() || b.is_ended() {
                assert_eq!(a.end_reason(), b.end_reason());
                break;
            }
        }
    }

    #[test]
    fn global_switch_reaches_every_pursuer() {
        let mut engine = engine_on(&SPLIT, 2);
        for _ in 0..35 {
            engine.step();
        }
        assert_eq!(engine.mode_timer().current(), PursuerMode::Chase);
        assert!(engine
            .pursuers()
            .iter()
            .all(|p| p.mode == PursuerMode::Chase));
    }

    #[test]
    fn frightened_outranks_global_switch_until_it_expires() {
        let mut engine = engine_on(&SPLIT, 2);
        engine.activate_frightened();
        for _ in 0..35 {
            engine.step();
        }
        assert_eq!(engine.mode_timer().current(), PursuerMode::Chase);
        assert!(engine.pursuers().iter().all(|p| p.is_frightened()));

        for _ in 35..50 {
            engine.step();
        }
        assert!(!engine.frightened_timer().is_active());
        assert!(engine
            .pursuers()
            .iter()
            .all(|p| p.mode == PursuerMode::Chase));
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.iter().any(|e| matches!(
            e,
            RuntimeEvent::FrightenedEnded {
                resumed_mode: PursuerMode::Chase
            }
        )));
    }

    #[test]
    fn power_pellet_frightens_every_pursuer() {
        let mut engine = engine_on(&MINI, 4);
        engine.map.set_tile(Vec2::new(2, 1), Tile::PowerPellet);
        engine.player.position = Vec2::new(1, 1);
        engine.receive_input(Direction::Right);
        engine.step();

        assert_eq!(engine.player().position, Vec2::new(2, 1));
        assert_eq!(engine.player().score, 50);
        assert_eq!(engine.frightened_timer().remaining(), 10);
        assert!(engine.pursuers().iter().all(|p| p.is_frightened()));
        assert_eq!(engine.map.tile_value(Vec2::new(2, 1)), Some(Tile::Empty));
    }

    #[test]
    fn flanker_reads_the_direct_pursuers_live_position() {
        let mut engine = engine_on(&MINI, 6);
        for pursuer in &mut engine.pursuers {
            pursuer.mode = PursuerMode::Chase;
        }
        engine.player.position = Vec2::new(1, 1);
        engine.player.direction = Direction::Right;
        engine.update_pursuers();

        let direct = engine.pursuers[0].position;
        let ctx = TargetContext {
            map: &engine.map,
            player_position: Vec2::new(1, 1),
            player_direction: Direction::Right,
            player_intended: Direction::None,
            pursuer_position: engine.pursuers[3].position,
            direct_position: Some(direct),
        };
        assert_ne!(direct, Vec2::new(5, 3));
        assert_eq!(engine.pursuers[3].target, Personality::Flanker.chase_target(&ctx));
    }

    #[test]
    fn eating_a_frightened_pursuer_awards_points_and_sends_it_home() {
        let mut engine = engine_on(&MINI, 7);
        engine.player.position = Vec2::new(1, 1);
        engine.pursuers[1].mode = PursuerMode::Frightened;
        engine.pursuers[1].position = Vec2::new(1, 1);

        assert!(!engine.resolve_pursuer_collisions());
        assert_eq!(engine.player().score, 200);
        assert_eq!(engine.pursuers[1].mode, PursuerMode::Chase);
        assert_eq!(engine.pursuers[1].position, Vec2::new(5, 3));
        assert_eq!(engine.player().lives, 3);
    }

    #[test]
    fn only_one_collision_is_resolved_per_tick() {
        let mut engine = engine_on(&MINI, 7);
        engine.player.position = Vec2::new(1, 1);
        for idx in [1, 2] {
            engine.pursuers[idx].mode = PursuerMode::Frightened;
            engine.pursuers[idx].position = Vec2::new(1, 1);
        }
        engine.resolve_pursuer_collisions();
        assert_eq!(engine.player().score, 200);
        assert_eq!(engine.pursuers[2].position, Vec2::new(1, 1));
        assert!(engine.pursuers[2].is_frightened());
    }

    #[test]
    fn last_life_lost_ends_the_round_without_respawn() {
        let mut engine = engine_on(&MINI, 8);
        engine.player.lives = 1;
        engine.player.position = Vec2::new(1, 1);
        engine.pursuers[0].mode = PursuerMode::Chase;
        engine.pursuers[0].position = Vec2::new(1, 1);

        assert!(engine.resolve_pursuer_collisions());
        assert_eq!(engine.player().lives, 0);
        assert!(engine.is_ended());
        assert_eq!(engine.end_reason(), Some(GameOverReason::Caught));
        assert_eq!(engine.player().position, Vec2::new(1, 1));
        assert_eq!(engine.build_summary().reason, GameOverReason::Caught);
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RoundLost)));
        assert!(!snapshot
            .events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RoundWon)));
    }

    #[test]
    fn losing_a_life_resets_player_pursuers_and_timers() {
        let mut engine = engine_on(&MINI, 8);
        for _ in 0..12 {
            engine.mode_timer.tick();
        }
        assert_eq!(engine.mode_timer().elapsed_units(), 2);
        engine.activate_frightened();
        engine.pursuers[0].mode = PursuerMode::Scatter;
        engine.player.position = Vec2::new(1, 5);
        engine.pursuers[0].position = Vec2::new(1, 5);

        assert!(!engine.resolve_pursuer_collisions());
        assert_eq!(engine.player().lives, 2);
        assert!(!engine.is_ended());
        assert!(!engine.frightened_timer().is_active());
        assert_eq!(engine.mode_timer().elapsed_units(), 0);
        assert_eq!(engine.pursuers().len(), 4);
        assert!(engine
            .pursuers()
            .iter()
            .all(|p| p.mode == PursuerMode::Scatter && p.position.y == 3));
        assert!(engine.player().direction.is_none());
        assert_eq!(
            engine.map.tile_value(engine.player().position),
            Some(Tile::Empty)
        );
    }

    #[test]
    fn eating_the_last_collectible_wins_the_round() {
        let mut engine = engine_on(&["1111", "1001", "1111"], 10);
        assert_eq!(engine.map.remaining_collectibles(), 1);
        let toward = if engine.player().position == Vec2::new(1, 1) {
            Direction::Right
        } else {
            Direction::Left
        };
        engine.receive_input(toward);
        engine.step();
        assert!(engine.is_ended());
        assert_eq!(engine.end_reason(), Some(GameOverReason::Victory));
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.remaining_collectibles, 0);
        assert!(snapshot
            .events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RoundWon)));
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = engine_on(&MINI, 12);
        engine.activate_frightened();
        let kept = engine.build_snapshot(false);
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert!(kept.events.is_empty());
        assert_eq!(first.events.len(), 1);
        assert!(second.events.is_empty());
    }

    #[test]
    fn tick_limit_ends_the_round_as_timeout() {
        let mut engine = GameEngine::new(
            parse_test_map(&SPLIT),
            quiet_config(),
            13,
            GameEngineOptions {
                tick_limit: Some(3),
            },
        );
        for _ in 0..5 {
            engine.step();
        }
        assert_eq!(engine.tick(), 3);
        assert_eq!(engine.end_reason(), Some(GameOverReason::Timeout));
        let events = engine.build_snapshot(true).events;
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RoundTimedOut)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::RoundWon | RuntimeEvent::RoundLost)));
    }

    #[test]
    fn houseless_timeout_is_not_reported_as_a_win() {
        let mut engine = GameEngine::new(
            parse_test_map(&["111111", "100001", "111111"]),
            quiet_config(),
            14,
            GameEngineOptions {
                tick_limit: Some(2),
            },
        );
        engine.step();
        engine.step();
        assert_eq!(engine.end_reason(), Some(GameOverReason::Timeout));
        let events = engine.build_snapshot(true).events;
        assert!(!events.iter().any(|e| matches!(e, RuntimeEvent::RoundWon)));
    }
}

//! Game state and core simulation types
//!
//! The loop controller owns everything here: the player, the obstacle list,
//! the score/difficulty counters and the RNG stream used for spawning.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::{Aabb, Arena};
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of a race session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Constructed or reset, waiting for `start`
    Idle,
    /// Active gameplay
    Running,
    /// Target score reached (terminal until reset)
    Victory,
    /// Crashed into an obstacle (terminal until reset)
    GameOver,
}

/// State-change notifications for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u32, target: u32 },
    Victory { score: u32, target: u32 },
    GameOver { score: u32, target: u32 },
}

/// Input state the glue feeds the simulation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Steer left (arrow key held)
    pub left: bool,
    /// Steer right (arrow key held)
    pub right: bool,
    /// One-shot steering target in canvas pixels, consumed by the next frame
    pub pointer_x: Option<f32>,
}

/// Rival team liveries (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Mercedes,
    Ferrari,
    RedBull,
    Alpine,
    AstonMartin,
}

impl Team {
    pub const ALL: [Team; 5] = [
        Team::Mercedes,
        Team::Ferrari,
        Team::RedBull,
        Team::Alpine,
        Team::AstonMartin,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// The player's car
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Aabb,
    /// Lateral distance per frame while an intent is held
    pub speed: f32,
    pub moving_left: bool,
    pub moving_right: bool,
}

impl Player {
    pub fn at(body: Aabb, speed: f32) -> Self {
        Self {
            body,
            speed,
            moving_left: false,
            moving_right: false,
        }
    }

    /// Starting grid slot: centred, just above the bottom edge
    pub fn on_grid(arena: &Arena, tuning: &Tuning) -> Self {
        let width = CAR_WIDTH * arena.scale;
        let height = CAR_HEIGHT * arena.scale;
        let body = Aabb::new(
            arena.width / 2.0 - width / 2.0,
            arena.height - height - PLAYER_BOTTOM_GAP * arena.scale,
            width,
            height,
        );
        Self::at(body, tuning.player_speed * arena.scale)
    }

    pub fn set_intent(&mut self, left: bool, right: bool) {
        self.moving_left = left;
        self.moving_right = right;
    }

    /// Centre the car on a pointer position, staying on the road
    pub fn steer_to(&mut self, pointer_x: f32, arena: &Arena) {
        if !pointer_x.is_finite() {
            return;
        }
        self.body.x = arena.clamp_x(pointer_x - self.body.width / 2.0, self.body.width);
    }

    /// Apply held intents for one frame
    pub fn update(&mut self, arena: &Arena) {
        if self.moving_left {
            self.body.x -= self.speed;
        }
        if self.moving_right {
            self.body.x += self.speed;
        }
        self.body.x = arena.clamp_x(self.body.x, self.body.width);
    }
}

/// A rival car scrolling down the road
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub body: Aabb,
    /// Downward distance per frame, fixed at spawn
    pub speed: f32,
    pub team: Team,
}

impl Obstacle {
    /// New car just above the top edge at a random horizontal position.
    /// Its speed is locked to the game speed at the moment of spawning.
    pub fn spawn(id: u32, arena: &Arena, tuning: &Tuning, game_speed: f32, rng: &mut impl Rng) -> Self {
        let width = CAR_WIDTH * arena.scale;
        let height = CAR_HEIGHT * arena.scale;
        let x = rng.random::<f32>() * (arena.width - width).max(0.0);
        let base = tuning.obstacle_speed_min + rng.random::<f32>() * tuning.obstacle_speed_range;
        Self {
            id,
            body: Aabb::new(x, -height, width, height),
            speed: base * arena.scale * game_speed,
            team: Team::random(rng),
        }
    }

    /// Move down one frame. Returns true once the top edge is below the arena.
    pub fn update(&mut self, arena: &Arena) -> bool {
        self.body.y += self.speed;
        self.is_offscreen(arena)
    }

    #[inline]
    pub fn is_offscreen(&self, arena: &Arena) -> bool {
        self.body.top() > arena.height
    }
}

/// Read-only view handed to the renderer each frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub arena: Arena,
    pub phase: GamePhase,
    pub player: &'a Player,
    pub obstacles: &'a [Obstacle],
    pub score: u32,
    pub target_score: u32,
    pub speed: f32,
    /// Vertical phase of the dashed lane markings
    pub lane_offset: f32,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    pub arena: Arena,
    pub phase: GamePhase,
    pub score: u32,
    pub target_score: u32,
    /// Current game speed (pure function of score)
    pub speed: f32,
    /// Milliseconds accumulated since the last spawn attempt
    pub spawn_timer: f32,
    /// Current gap between spawn attempts
    pub spawn_interval: f32,
    pub player: Player,
    /// Rivals in spawn order (also draw order)
    pub obstacles: Vec<Obstacle>,
    /// Held input, applied at the start of every frame
    pub input: TickInput,
    /// Simulated time since start (drives lane markings)
    pub elapsed_ms: f32,
    /// Frames simulated since start
    pub frame: u64,
    /// Events not yet consumed by the glue
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle race with the given balance, canvas and RNG seed
    pub fn new(tuning: Tuning, arena: Arena, seed: u64) -> Self {
        let player = Player::on_grid(&arena, &tuning);
        Self {
            target_score: tuning.target_score,
            speed: tuning.base_speed,
            spawn_interval: tuning.spawn_interval_ms,
            tuning,
            arena,
            phase: GamePhase::Idle,
            score: 0,
            spawn_timer: 0.0,
            player,
            obstacles: Vec::new(),
            input: TickInput::default(),
            elapsed_ms: 0.0,
            frame: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Back to the freshly constructed idle state (RNG stream continues)
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.score = 0;
        self.target_score = self.tuning.target_score;
        self.speed = self.tuning.base_speed;
        self.spawn_timer = 0.0;
        self.spawn_interval = self.tuning.spawn_interval_ms;
        self.player = Player::on_grid(&self.arena, &self.tuning);
        self.obstacles.clear();
        self.input = TickInput::default();
        self.elapsed_ms = 0.0;
        self.frame = 0;
        self.events.clear();
        self.next_id = 1;
        log::info!("Race reset");
    }

    /// Idle -> Running. Returns false (and does nothing) from any other phase.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Idle {
            log::warn!("start() ignored in phase {:?}", self.phase);
            return false;
        }
        self.phase = GamePhase::Running;
        log::info!(
            "Race started: target {} cars, spawn every {}ms",
            self.target_score,
            self.spawn_interval
        );
        true
    }

    /// Canvas resized: keep entities, re-clamp the player onto the road
    pub fn resize(&mut self, arena: Arena) {
        self.arena = arena;
        self.player.body.x = arena.clamp_x(self.player.body.x, self.player.body.width);
        self.player.body.y = (arena.height - self.player.body.height
            - PLAYER_BOTTOM_GAP * arena.scale)
            .max(0.0);
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_winning(&self) -> bool {
        self.phase == GamePhase::Victory
    }

    /// Arrow keys / touch release. Takes effect on the next frame.
    pub fn set_horizontal_intent(&mut self, left: bool, right: bool) {
        self.input.left = left;
        self.input.right = right;
    }

    /// Mouse/touch steering. Moves the car immediately.
    pub fn set_pointer_target_x(&mut self, x: f32) {
        let arena = self.arena;
        self.player.steer_to(x, &arena);
    }

    /// Allocate a new obstacle ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn one rival at the current game speed
    pub fn spawn_obstacle(&mut self) {
        let id = self.next_entity_id();
        let obstacle = Obstacle::spawn(id, &self.arena, &self.tuning, self.speed, &mut self.rng);
        log::debug!(
            "Obstacle {} spawned at x={:.0} speed={:.2} ({:?})",
            obstacle.id,
            obstacle.body.x,
            obstacle.speed,
            obstacle.team
        );
        self.obstacles.push(obstacle);
    }

    /// Hand pending events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Displayed speed in km/h
    pub fn speed_kmh(&self) -> u32 {
        (self.speed * 100.0).floor() as u32
    }

    /// Lane dash phase in `[0, spacing)`, scrolling with elapsed time
    pub fn lane_dash_offset(&self) -> f32 {
        (self.elapsed_ms * 0.1 * self.speed) % (LANE_DASH_SPACING * self.arena.scale)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            arena: self.arena,
            phase: self.phase,
            player: &self.player,
            obstacles: &self.obstacles,
            score: self.score,
            target_score: self.target_score,
            speed: self.speed,
            lane_offset: self.lane_dash_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_state() -> GameState {
        GameState::new(Tuning::default(), Arena::new(800.0, 600.0), 42)
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = new_state();
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(!state.is_running());
        assert!(!state.is_winning());
        assert_eq!(state.score, 0);
        assert_eq!(state.target_score, 38);
        assert_eq!(state.speed, 1.2);
        assert_eq!(state.spawn_interval, 1200.0);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_player_starts_on_grid() {
        let state = new_state();
        assert_eq!(state.player.body, Aabb::new(375.0, 500.0, 50.0, 80.0));
        assert_eq!(state.player.speed, 5.0);
    }

    #[test]
    fn test_player_scales_with_arena() {
        let state = GameState::new(Tuning::default(), Arena::new(400.0, 300.0), 1);
        assert_eq!(state.player.body, Aabb::new(187.5, 250.0, 25.0, 40.0));
        assert_eq!(state.player.speed, 2.5);
    }

    #[test]
    fn test_start_only_from_idle() {
        let mut state = new_state();
        assert!(state.start());
        assert!(state.is_running());
        assert!(!state.start());
        state.phase = GamePhase::GameOver;
        assert!(!state.start());
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_intent_moves_and_clamps() {
        let arena = Arena::new(800.0, 600.0);
        let mut player = Player::on_grid(&arena, &Tuning::default());
        player.set_intent(true, false);
        player.update(&arena);
        assert_eq!(player.body.x, 370.0);

        for _ in 0..200 {
            player.update(&arena);
        }
        assert_eq!(player.body.x, 0.0);

        player.set_intent(false, true);
        for _ in 0..200 {
            player.update(&arena);
        }
        assert_eq!(player.body.x, 750.0);

        // Both held: they cancel out
        player.set_intent(true, true);
        player.update(&arena);
        assert_eq!(player.body.x, 750.0);
    }

    #[test]
    fn test_pointer_centres_car() {
        let mut state = new_state();
        state.set_pointer_target_x(200.0);
        assert_eq!(state.player.body.x, 175.0);
        state.set_pointer_target_x(-50.0);
        assert_eq!(state.player.body.x, 0.0);
        state.set_pointer_target_x(10_000.0);
        assert_eq!(state.player.body.x, 750.0);
        state.set_pointer_target_x(f32::NAN);
        assert_eq!(state.player.body.x, 750.0);
    }

    #[test]
    fn test_obstacle_spawn_bounds() {
        let arena = Arena::new(800.0, 600.0);
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for id in 0..200 {
            let obstacle = Obstacle::spawn(id, &arena, &tuning, 1.5, &mut rng);
            assert!(obstacle.body.x >= 0.0 && obstacle.body.right() <= arena.width);
            assert_eq!(obstacle.body.y, -80.0);
            // (3..5) * scale 1.0 * speed 1.5
            assert!(obstacle.speed >= 4.5 && obstacle.speed < 7.5 + 1e-4);
        }
    }

    #[test]
    fn test_obstacle_leaves_screen() {
        let arena = Arena::new(800.0, 600.0);
        let mut obstacle = Obstacle {
            id: 1,
            body: Aabb::new(100.0, 590.0, 50.0, 80.0),
            speed: 5.0,
            team: Team::Alpine,
        };
        assert!(!obstacle.update(&arena));
        assert_eq!(obstacle.body.y, 595.0);
        assert!(!obstacle.update(&arena)); // top edge exactly at the bottom
        assert!(obstacle.update(&arena));
    }

    #[test]
    fn test_drain_events() {
        let mut state = new_state();
        state.events.push(GameEvent::ScoreChanged { score: 1, target: 38 });
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_speed_kmh() {
        let mut state = new_state();
        assert_eq!(state.speed_kmh(), 120);
        state.speed = 2.15;
        assert_eq!(state.speed_kmh(), 215);
    }

    #[test]
    fn test_resize_clamps_player() {
        let mut state = new_state();
        state.set_pointer_target_x(780.0);
        state.resize(Arena::new(400.0, 300.0));
        assert_eq!(state.player.body.x, 350.0);
        assert_eq!(state.player.body.y, 300.0 - 80.0 - 10.0);
    }
}

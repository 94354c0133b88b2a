//! Per-frame simulation step
//!
//! Core game loop: input, difficulty, spawning, motion/scoring, then the
//! win check and the crash check, in that order.

use rand::Rng;

use super::collision::find_collision;
use super::state::{GameEvent, GamePhase, GameState};

/// Sanitize a frame delta: negative or NaN becomes 0, long stalls are capped
#[inline]
pub fn clamp_frame_ms(dt_ms: f32, max_frame_ms: f32) -> f32 {
    if dt_ms.is_nan() || dt_ms <= 0.0 {
        0.0
    } else {
        dt_ms.min(max_frame_ms)
    }
}

/// Advance the race by one display frame.
///
/// Reads the input state held in `state.input`. `dt_ms` only feeds the spawn
/// timer and the lane animation; car motion is per frame. Does nothing unless
/// the race is running.
pub fn advance(state: &mut GameState, dt_ms: f32) {
    if state.phase != GamePhase::Running {
        return;
    }
    let dt_ms = clamp_frame_ms(dt_ms, state.tuning.max_frame_ms);

    state.frame += 1;
    state.elapsed_ms += dt_ms;

    // 1. Player input
    let arena = state.arena;
    if let Some(x) = state.input.pointer_x.take() {
        state.player.steer_to(x, &arena);
    }
    state.player.set_intent(state.input.left, state.input.right);
    state.player.update(&arena);

    // 2. Difficulty follows score
    state.speed = state.tuning.speed_for_score(state.score);

    // 3. Spawning
    state.spawn_timer += dt_ms;
    if state.spawn_timer > state.spawn_interval {
        let count = if state.rng.random::<f32>() < state.tuning.double_spawn_chance {
            2
        } else {
            1
        };
        for _ in 0..count {
            state.spawn_obstacle();
        }
        state.spawn_timer = 0.0;
        state.spawn_interval = (state.spawn_interval
            - state.score as f32 * state.tuning.spawn_interval_reduction_ms)
            .max(state.tuning.min_spawn_interval_ms);
    }

    // 4. Move rivals; each one that leaves the bottom edge is an overtake
    let mut passed = 0u32;
    state.obstacles.retain_mut(|obstacle| {
        let offscreen = obstacle.update(&arena);
        if offscreen {
            passed += 1;
        }
        !offscreen
    });
    for _ in 0..passed {
        state.score += 1;
        state.events.push(GameEvent::ScoreChanged {
            score: state.score,
            target: state.target_score,
        });
    }

    // 5. Win check comes before the crash check
    if state.score >= state.target_score {
        state.phase = GamePhase::Victory;
        state.events.push(GameEvent::Victory {
            score: state.score,
            target: state.target_score,
        });
        log::info!(
            "Victory: {}/{} after {} frames",
            state.score,
            state.target_score,
            state.frame
        );
        return;
    }

    // 6. Crash check
    let margin = state.tuning.collision_margin * arena.scale;
    if let Some(hit) = find_collision(&state.player, &state.obstacles, margin) {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            score: state.score,
            target: state.target_score,
        });
        log::info!(
            "Game over: hit obstacle {} at ({:.0}, {:.0}), score {}/{}",
            hit.obstacle_id,
            hit.point.x,
            hit.point.y,
            state.score,
            state.target_score
        );
    }
}

impl GameState {
    /// Convenience wrapper around [`advance`]
    pub fn advance(&mut self, dt_ms: f32) {
        advance(self, dt_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::{Aabb, Arena};
    use crate::sim::state::{Obstacle, Team, TickInput};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn running_state(seed: u64) -> GameState {
        let mut state = GameState::new(Tuning::default(), Arena::new(800.0, 600.0), seed);
        state.start();
        state
    }

    /// A parked rival that leaves the screen on the next frame, far from the player
    fn exiting_obstacle(state: &mut GameState) -> Obstacle {
        let id = state.next_entity_id();
        Obstacle {
            id,
            body: Aabb::new(0.0, 599.0, 50.0, 80.0),
            speed: 5.0,
            team: Team::Mercedes,
        }
    }

    fn count(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_idle_does_not_advance() {
        let mut state = GameState::new(Tuning::default(), Arena::new(800.0, 600.0), 1);
        advance(&mut state, 5000.0);
        assert_eq!(state.frame, 0);
        assert_eq!(state.spawn_timer, 0.0);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_clamp_frame_ms() {
        assert_eq!(clamp_frame_ms(-10.0, 50.0), 0.0);
        assert_eq!(clamp_frame_ms(f32::NAN, 50.0), 0.0);
        assert_eq!(clamp_frame_ms(16.0, 50.0), 16.0);
        assert_eq!(clamp_frame_ms(10_000.0, 50.0), 50.0);
        assert_eq!(clamp_frame_ms(f32::INFINITY, 50.0), 50.0);
    }

    #[test]
    fn test_negative_delta_does_not_rewind() {
        let mut state = running_state(3);
        state.spawn_timer = 100.0;
        advance(&mut state, -500.0);
        assert_eq!(state.spawn_timer, 100.0);
        assert_eq!(state.elapsed_ms, 0.0);
    }

    #[test]
    fn test_spawn_after_interval() {
        let mut state = running_state(11);
        // 50ms cap per frame: 24 frames reach exactly 1200, not yet past it
        for _ in 0..24 {
            advance(&mut state, 1000.0);
        }
        assert!(state.obstacles.is_empty());
        assert_eq!(state.spawn_timer, 1200.0);

        advance(&mut state, 16.0);
        let spawned = state.obstacles.len();
        assert!(spawned == 1 || spawned == 2);
        assert_eq!(state.spawn_timer, 0.0);
        // Score 0: interval unchanged
        assert_eq!(state.spawn_interval, 1200.0);
    }

    #[test]
    fn test_spawn_interval_tightens_with_score() {
        let mut state = running_state(5);
        state.score = 10;
        state.spawn_timer = 1199.0;
        advance(&mut state, 16.0);
        assert_eq!(state.spawn_interval, 1200.0 - 150.0);

        state.spawn_timer = 1050.0;
        advance(&mut state, 16.0);
        assert_eq!(state.spawn_interval, 1050.0 - 150.0);

        // Floor
        state.score = 30;
        state.spawn_timer = 1000.0;
        advance(&mut state, 16.0);
        assert_eq!(state.spawn_interval, 600.0);
    }

    #[test]
    fn test_double_spawn_ratio() {
        let mut singles = 0;
        let mut doubles = 0;
        let mut state = running_state(2024);
        for _ in 0..2000 {
            state.obstacles.clear();
            state.spawn_timer = state.spawn_interval;
            advance(&mut state, 1.0);
            match state.obstacles.len() {
                1 => singles += 1,
                2 => doubles += 1,
                n => panic!("unexpected spawn count {n}"),
            }
        }
        let ratio = doubles as f32 / 2000.0;
        assert!((0.35..0.45).contains(&ratio), "double ratio {ratio}");
        assert_eq!(singles + doubles, 2000);
    }

    #[test]
    fn test_obstacle_speed_locked_at_spawn() {
        let mut state = running_state(8);
        state.spawn_timer = 2000.0;
        advance(&mut state, 0.0);
        let first = state.obstacles[0].clone();

        // Difficulty jumps; the rival already on screen keeps its pace
        state.score = 20;
        advance(&mut state, 0.0);
        assert!(state.speed > state.tuning.base_speed);
        let same = state.obstacles.iter().find(|o| o.id == first.id).unwrap();
        assert_eq!(same.speed, first.speed);
        assert_eq!(same.body.y, first.body.y + first.speed);
    }

    #[test]
    fn test_overtake_scores_one_each() {
        let mut state = running_state(9);
        let a = exiting_obstacle(&mut state);
        let b = exiting_obstacle(&mut state);
        state.obstacles.push(a);
        state.obstacles.push(b);
        advance(&mut state, 0.0);
        assert_eq!(state.score, 2);
        assert!(state.obstacles.is_empty());
        let events = state.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::ScoreChanged { score: 1, target: 38 },
                GameEvent::ScoreChanged { score: 2, target: 38 },
            ]
        );
    }

    #[test]
    fn test_victory_after_target_overtakes() {
        let mut state = running_state(38);
        for _ in 0..38 {
            let obstacle = exiting_obstacle(&mut state);
            state.obstacles.push(obstacle);
        }
        advance(&mut state, 0.0);

        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Victory { .. })), 1);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::GameOver { .. })), 0);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::ScoreChanged { .. })), 38);
        assert_eq!(events.last(), Some(&GameEvent::Victory { score: 38, target: 38 }));
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.is_winning());
        assert!(!state.is_running());
    }

    #[test]
    fn test_victory_one_frame_at_a_time() {
        let mut state = running_state(77);
        for _ in 0..38 {
            let obstacle = exiting_obstacle(&mut state);
            state.obstacles.push(obstacle);
            advance(&mut state, 0.0);
        }
        let events = state.drain_events();
        assert_eq!(count(&events, |e| matches!(e, GameEvent::Victory { .. })), 1);
        assert_eq!(state.score, 38);
    }

    #[test]
    fn test_victory_beats_simultaneous_crash() {
        let mut state = running_state(12);
        state.score = 37;
        let exiting = exiting_obstacle(&mut state);
        state.obstacles.push(exiting);
        // Parked on top of the player as well
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            body: state.player.body,
            speed: 0.0,
            team: Team::RedBull,
        });
        advance(&mut state, 0.0);
        let events = state.drain_events();
        assert_eq!(state.phase, GamePhase::Victory);
        assert_eq!(count(&events, |e| matches!(e, GameEvent::GameOver { .. })), 0);

        // Terminal: more frames change nothing
        advance(&mut state, 16.0);
        assert!(state.drain_events().is_empty());
        assert_eq!(state.phase, GamePhase::Victory);
    }

    #[test]
    fn test_crash_ends_race_without_scoring() {
        let mut state = running_state(13);
        state.score = 5;
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            body: state.player.body,
            speed: 0.0,
            team: Team::Ferrari,
        });
        advance(&mut state, 0.0);

        let events = state.drain_events();
        assert_eq!(events, vec![GameEvent::GameOver { score: 5, target: 38 }]);
        assert_eq!(state.score, 5);
        assert_eq!(state.phase, GamePhase::GameOver);

        // Suspended: no second game over
        advance(&mut state, 16.0);
        assert!(state.drain_events().is_empty());
        assert_eq!(state.frame, 1);
    }

    #[test]
    fn test_near_miss_inside_margin() {
        let mut state = running_state(14);
        let player = state.player.body;
        let id = state.next_entity_id();
        // Side by side, boxes overlapping by 10px
        state.obstacles.push(Obstacle {
            id,
            body: Aabb::new(player.right() - 10.0, player.y, 50.0, 80.0),
            speed: 0.0,
            team: Team::Alpine,
        });
        advance(&mut state, 0.0);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_input_applied_before_collision() {
        let mut state = running_state(15);
        let player = state.player.body;
        let id = state.next_entity_id();
        state.obstacles.push(Obstacle {
            id,
            body: Aabb::new(player.x + 100.0, player.y, 50.0, 80.0),
            speed: 0.0,
            team: Team::AstonMartin,
        });
        state.input = TickInput {
            pointer_x: Some(player.center().x + 100.0),
            ..Default::default()
        };
        advance(&mut state, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_reset_restores_construction_state() {
        let fresh = GameState::new(Tuning::default(), Arena::new(800.0, 600.0), 99);
        let mut state = fresh.clone();
        state.start();
        state.set_pointer_target_x(100.0);
        for _ in 0..300 {
            advance(&mut state, 16.7);
        }
        state.phase = GamePhase::GameOver;
        state.reset();

        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.score, fresh.score);
        assert_eq!(state.speed, fresh.speed);
        assert_eq!(state.spawn_timer, fresh.spawn_timer);
        assert_eq!(state.spawn_interval, fresh.spawn_interval);
        assert_eq!(state.player, fresh.player);
        assert!(state.obstacles.is_empty());
        assert!(state.events.is_empty());
        assert!(state.start());
    }

    #[test]
    fn test_reset_after_victory() {
        let fresh = GameState::new(Tuning::default(), Arena::new(800.0, 600.0), 5);
        let mut state = fresh.clone();
        state.start();
        for _ in 0..38 {
            let obstacle = exiting_obstacle(&mut state);
            state.obstacles.push(obstacle);
        }
        advance(&mut state, 0.0);
        assert_eq!(state.phase, GamePhase::Victory);
        assert_eq!(state.score, 38);
        assert!(state.is_winning());

        state.reset();
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(!state.is_winning());
        assert!(!state.is_running());
        assert_eq!(state.score, 0);
        assert_eq!(state.speed, fresh.speed);
        assert_eq!(state.spawn_timer, fresh.spawn_timer);
        assert_eq!(state.spawn_interval, fresh.spawn_interval);
        assert_eq!(state.player, fresh.player);
        assert!(state.obstacles.is_empty());
        assert!(state.events.is_empty());

        // A second race runs normally from the reset state
        assert!(state.start());
        advance(&mut state, 16.7);
        assert!(state.is_running());
    }

    #[test]
    fn test_determinism() {
        let mut a = running_state(4242);
        let mut b = running_state(4242);
        let inputs = [
            TickInput { left: true, ..Default::default() },
            TickInput { pointer_x: Some(600.0), ..Default::default() },
            TickInput::default(),
        ];
        for i in 0..600 {
            a.input = inputs[i % inputs.len()].clone();
            b.input = inputs[i % inputs.len()].clone();
            advance(&mut a, 16.7);
            advance(&mut b, 16.7);
        }
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score, b.score);
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.player, b.player);
    }

    proptest! {
        #[test]
        fn prop_player_stays_on_road(
            moves in prop::collection::vec((any::<bool>(), any::<bool>(), prop::option::of(-5000.0f32..5000.0)), 1..200),
            seed in any::<u64>(),
        ) {
            let mut state = running_state(seed);
            for (left, right, pointer_x) in moves {
                state.input = TickInput { left, right, pointer_x };
                advance(&mut state, 16.7);
                let x = state.player.body.x;
                prop_assert!(x >= 0.0);
                prop_assert!(x <= state.arena.width - state.player.body.width);
                if !state.is_running() {
                    break;
                }
            }
        }

        #[test]
        fn prop_speed_monotonic(score in 0u32..10_000) {
            let tuning = Tuning::default();
            prop_assert!(tuning.speed_for_score(score + 1) >= tuning.speed_for_score(score));
        }

        #[test]
        fn prop_spawn_interval_floor(
            scores in prop::collection::vec(0u32..38, 1..50),
            seed in any::<u64>(),
        ) {
            let mut state = running_state(seed);
            for score in scores {
                state.obstacles.clear();
                state.score = score;
                state.spawn_timer = state.spawn_interval;
                advance(&mut state, 1.0);
                prop_assert!(state.spawn_interval >= state.tuning.min_spawn_interval_ms);
            }
        }
    }
}

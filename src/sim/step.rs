/// The step function: advances a level by one frame.
///
/// Processing order (fixed; later stages read what earlier ones wrote):
///   1. World shift: apply last frame's camera shift to every non-player
///      layer, age dust effects
///   2. Input: direction and facing, plus jump
///   3. Horizontal collision pass (relative to the applied shift)
///   4. Vertical collision pass (gravity included)
///   5. Landing dust: edge-triggered on airborne → grounded
///   6. Camera: world shift for the next frame, player speed for now
///   7. Coin pickup
///   8. Win check: player box intersects the goal
///   9. Death check: player fell below the screen
///
/// A finished level (won or lost) is left untouched.

use glam::Vec2;

use crate::domain::camera;
use crate::domain::entity::{Effect, EffectKind, FrameInput};
use crate::domain::physics;
use super::event::LevelEvent;
use super::world::{LevelState, Outcome};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(level: &mut LevelState, input: FrameInput) -> Vec<LevelEvent> {
    if level.is_finished() { return vec![]; }

    let mut events: Vec<LevelEvent> = Vec::new();
    level.frame += 1;

    let shift = resolve_world_shift(level);
    resolve_input(level, input, &mut events);
    physics::horizontal_pass(&mut level.player, &level.terrain, shift);
    let was_grounded = level.player.on_ground;
    let gravity = level.gravity();
    physics::vertical_pass(&mut level.player, &level.terrain, &gravity);
    level.player.sync_position();
    level.player.update_status();
    resolve_landing_dust(level, was_grounded, &mut events);
    resolve_camera(level);
    resolve_coins(level, &mut events);
    if resolve_win(level, &mut events) { return events; }
    resolve_death(level, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Stages
// ══════════════════════════════════════════════════════════════

/// Returns the shift applied this frame.
fn resolve_world_shift(level: &mut LevelState) -> f32 {
    level.shift_world();
    for effect in level.effects.iter_mut() {
        effect.tick();
    }
    level.effects.retain(|e| e.is_active());
    level.world_shift
}

fn resolve_input(level: &mut LevelState, input: FrameInput, events: &mut Vec<LevelEvent>) {
    let jump_speed = level.config.jump_speed;
    let player = &mut level.player;
    player.sync_collision_rect();
    if player.apply_input(input, jump_speed) {
        let anchor = feet(level);
        level.effects.push(Effect::new(EffectKind::JumpDust, anchor, level.config.dust_frames));
        events.push(LevelEvent::Jumped);
    }
}

fn resolve_landing_dust(level: &mut LevelState, was_grounded: bool, events: &mut Vec<LevelEvent>) {
    if was_grounded || !level.player.on_ground || level.dust_active() { return; }
    let anchor = feet(level);
    level.effects.push(Effect::new(EffectKind::LandingDust, anchor, level.config.dust_frames));
    events.push(LevelEvent::Landed);
}

fn resolve_camera(level: &mut LevelState) {
    let settings = level.scroll_settings();
    let rect = level.player.rect();
    let scroll = camera::scroll(rect.center_x(), level.player.direction.x, &settings);
    level.world_shift = scroll.world_shift;
    level.player.speed = scroll.player_speed;
}

fn resolve_coins(level: &mut LevelState, events: &mut Vec<LevelEvent>) {
    let taken = level.coins.take_intersecting(&level.player.rect());
    if taken == 0 { return; }
    level.coins_collected += taken as u32;
    log::debug!("coin x{} collected ({} total)", taken, level.coins_collected);
    events.push(LevelEvent::CoinCollected { total: level.coins_collected });
}

fn resolve_win(level: &mut LevelState, events: &mut Vec<LevelEvent>) -> bool {
    let Some(goal) = level.goal_rect() else { return false };
    if !level.player.rect().intersects(&goal) { return false; }
    level.finish(Outcome::Won);
    events.push(LevelEvent::LevelWon);
    true
}

fn resolve_death(level: &mut LevelState, events: &mut Vec<LevelEvent>) {
    if level.player.rect().top() > level.config.screen_height {
        level.finish(Outcome::Lost);
        events.push(LevelEvent::LevelLost);
    }
}

/// Bottom-centre of the player's visual box.
fn feet(level: &LevelState) -> Vec2 {
    let r = level.player.rect();
    Vec2::new(r.center_x(), r.bottom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::domain::entity::MoveDir;
    use crate::sim::level::{Layout, PLAYER_LAYER};

    /// Build a level from a diagram.
    /// Legend: '#'=Terrain  '$'=Coin  'P'=Spawn  'G'=Goal  ' '=Empty
    fn level_from(rows: &[&str], config: SimConfig) -> LevelState {
        let cell = |want: char, value: i32| -> Vec<Vec<i32>> {
            rows.iter()
                .map(|r| r.chars().map(|c| if c == want { value } else { -1 }).collect())
                .collect()
        };
        let mut player = cell('P', 0);
        for (y, r) in rows.iter().enumerate() {
            for (x, c) in r.chars().enumerate() {
                if c == 'G' { player[y][x] = 1; }
            }
        }
        let mut layout = Layout::new("test");
        layout.insert("terrain", cell('#', 0));
        layout.insert("coins", cell('$', 0));
        layout.insert(PLAYER_LAYER, player);
        LevelState::from_layout(&layout, &config).unwrap()
    }

    /// Small numbers that keep float sums exact.
    fn test_config() -> SimConfig {
        SimConfig {
            tile_size: 64.0,
            screen_width: 800.0,
            screen_height: 640.0,
            gravity: 1.0,
            terminal_velocity: None,
            jump_speed: -16.0,
            player_speed: 8.0,
            scroll_speed: 8.0,
            player_width: 64.0,
            player_height: 64.0,
            collision_width: 50.0,
            dust_frames: 4,
        }
    }

    const IDLE: FrameInput = FrameInput { movement: None, jump: false };
    const RIGHT: FrameInput = FrameInput { movement: Some(MoveDir::Right), jump: false };
    const LEFT: FrameInput = FrameInput { movement: Some(MoveDir::Left), jump: false };
    const JUMP: FrameInput = FrameInput { movement: None, jump: true };

    fn assert_clear_of_terrain(level: &LevelState, frame: usize) {
        let hits: Vec<_> = level.terrain.boxes()
            .filter(|b| level.player.collision_rect.intersects(b))
            .collect();
        assert!(
            hits.is_empty(),
            "frame {frame}: {:?} overlaps {:?}", level.player.collision_rect, hits,
        );
    }

    #[test]
    fn landing_dust_fires_once_per_contact() {
        let mut level = level_from(&[
            "P  ",
            "   ",
            "   ",
            "###",
        ], test_config());

        let mut landed_frames = vec![];
        let mut first_grounded = None;
        for frame in 0..60 {
            let events = step(&mut level, IDLE);
            if level.player.on_ground && first_grounded.is_none() {
                first_grounded = Some(frame);
            }
            if events.contains(&LevelEvent::Landed) {
                landed_frames.push(frame);
            }
        }
        assert!(first_grounded.is_some());
        assert_eq!(landed_frames, vec![first_grounded.unwrap()]);
        assert_eq!(level.player.rect().bottom(), 192.0);
    }

    #[test]
    fn landing_dust_refires_after_a_new_jump() {
        let mut level = level_from(&[
            "   ",
            "   ",
            "   ",
            "P  ",
            "###",
        ], test_config());

        let mut landings = 0;
        for _ in 0..20 {
            if step(&mut level, IDLE).contains(&LevelEvent::Landed) { landings += 1; }
        }
        assert_eq!(landings, 1);
        assert!(level.player.on_ground);

        let events = step(&mut level, JUMP);
        assert!(events.contains(&LevelEvent::Jumped));
        for _ in 0..60 {
            if step(&mut level, IDLE).contains(&LevelEvent::Landed) { landings += 1; }
        }
        assert_eq!(landings, 2);
    }

    #[test]
    fn jump_dust_suppresses_landing_dust_while_active() {
        let mut config = test_config();
        config.dust_frames = 200;
        let mut level = level_from(&["P", "#"], config);
        step(&mut level, IDLE); // settle: lands
        assert!(level.player.on_ground);
        level.effects.clear();

        assert!(step(&mut level, JUMP).contains(&LevelEvent::Jumped));
        let mut landed = false;
        for _ in 0..60 {
            landed |= step(&mut level, IDLE).contains(&LevelEvent::Landed);
        }
        assert!(level.player.on_ground);
        assert!(!landed);
    }

    #[test]
    fn win_on_one_unit_overlap() {
        let mut level = level_from(&["P G", "###"], test_config());
        // Goal occupies x 128..192. Put the player's right edge at 129:
        // visual centre 97, collision box 72..122.
        level.player.collision_rect.x = 72.0;
        level.player.sync_position();
        let events = step(&mut level, IDLE);
        assert!(events.contains(&LevelEvent::LevelWon));
        assert_eq!(level.outcome, Outcome::Won);
    }

    #[test]
    fn no_win_when_only_touching() {
        let mut level = level_from(&["P G", "###"], test_config());
        // Visual box 64..128 touches the goal's left edge at 128.
        level.player.collision_rect.x = 71.0;
        level.player.sync_position();
        let events = step(&mut level, IDLE);
        assert!(!events.contains(&LevelEvent::LevelWon));
        assert_eq!(level.outcome, Outcome::Running);
    }

    #[test]
    fn death_is_strictly_below_screen() {
        let config = SimConfig { gravity: 0.0, ..test_config() };
        let mut level = level_from(&["P"], config);

        level.player.collision_rect.set_top(640.0);
        level.player.sync_position();
        let events = step(&mut level, IDLE);
        assert!(!events.contains(&LevelEvent::LevelLost));
        assert_eq!(level.player.rect().top(), 640.0);

        level.player.collision_rect.set_top(641.0);
        level.player.sync_position();
        let events = step(&mut level, IDLE);
        assert!(events.contains(&LevelEvent::LevelLost));
        assert_eq!(level.outcome, Outcome::Lost);
    }

    #[test]
    fn falling_off_the_world_is_lost_and_terminal() {
        let mut level = level_from(&["P", " "], test_config());
        let mut lost_at = None;
        for frame in 0..200 {
            if step(&mut level, IDLE).contains(&LevelEvent::LevelLost) {
                lost_at = Some(frame);
                break;
            }
        }
        assert!(lost_at.is_some());
        let y = level.player.position.y;
        assert!(step(&mut level, RIGHT).is_empty());
        assert_eq!(level.player.position.y, y);
    }

    #[test]
    fn empty_layout_never_collides() {
        let config = SimConfig { screen_height: 1.0e9, ..test_config() };
        let mut level = level_from(&["P   ", "    ", "    "], config);
        assert!(level.terrain.is_empty());
        for _ in 0..300 {
            step(&mut level, IDLE);
            let p = &level.player;
            assert!(!p.on_ground && !p.on_ceiling && !p.on_left_wall && !p.on_right_wall);
        }
        assert_eq!(level.outcome, Outcome::Running);
    }

    #[test]
    fn camera_scrolls_world_near_right_edge() {
        // 800 wide: right zone starts at centre x > 600.
        let mut level = level_from(&[
            "          P    ",
            "###############",
        ], test_config());
        step(&mut level, IDLE); // land
        // Centre is 640 + 32 = 672 > 600: first step moving right scrolls.
        let x_before = level.player.position.x;
        step(&mut level, RIGHT);
        assert_eq!(level.world_shift, -8.0);
        assert_eq!(level.player.speed, 0.0);
        // Shift applies at the start of the next frame, player stays put.
        step(&mut level, RIGHT);
        assert_eq!(level.terrain.offset(), -8.0);
        // Speed was zeroed, so only the first frame's walk moved the player.
        assert_eq!(level.player.position.x, x_before + 8.0);
    }

    #[test]
    fn walking_into_wall_stops_at_wall() {
        let mut level = level_from(&[
            "P #",
            "###",
        ], test_config());
        for _ in 0..20 {
            step(&mut level, RIGHT);
        }
        assert!(level.player.on_right_wall);
        assert_eq!(level.player.collision_rect.right(), 128.0);
    }

    #[test]
    fn releasing_key_while_scrolling_into_wall_stays_clear() {
        // Walk right in the scroll zone until the scrolling wall arrives,
        // then let go for a frame.
        let mut level = level_from(&[
            "            #",
            "          P #",
            "#############",
        ], test_config());
        for frame in 0..10 {
            step(&mut level, RIGHT);
            assert_clear_of_terrain(&level, frame);
        }
        assert_eq!(level.world_shift, -8.0);
        let y = level.player.collision_rect.y;
        step(&mut level, IDLE);
        assert_clear_of_terrain(&level, 10);
        assert_eq!(level.player.collision_rect.y, y);
        assert!(level.player.on_right_wall);
    }

    #[test]
    fn scrolling_into_walls_never_overlaps_terrain() {
        let right_wall: &[&str] = &[
            "            #",
            "          P #",
            "#############",
        ];
        let left_wall: &[&str] = &[
            "#           ",
            "# P         ",
            "############",
        ];
        for (rows, walk) in [(right_wall, RIGHT), (left_wall, LEFT)] {
            let mut level = level_from(rows, test_config());
            let mut scrolled = false;
            for frame in 0..90 {
                // Hold for two frames, release for one; jump now and then.
                let input = match frame % 9 {
                    2 | 5 => IDLE,
                    8 => JUMP,
                    _ => walk,
                };
                step(&mut level, input);
                scrolled |= level.world_shift != 0.0;
                assert_clear_of_terrain(&level, frame);
            }
            assert!(scrolled);
            assert_eq!(level.outcome(), Outcome::Running);
        }
    }

    #[test]
    fn coins_are_collected_once() {
        let mut level = level_from(&[
            "P$  ",
            "####",
        ], test_config());
        let mut total = 0;
        for _ in 0..10 {
            for e in step(&mut level, RIGHT) {
                if let LevelEvent::CoinCollected { total: t } = e { total = t; }
            }
        }
        assert_eq!(total, 1);
        assert_eq!(level.coins_collected, 1);
        assert!(level.coins.is_empty());
    }
}

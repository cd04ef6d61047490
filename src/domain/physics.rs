/// Axis-separated collision resolution against terrain.
///
/// ## Passes
///
/// Every frame runs two independent passes, horizontal first:
///
///   1. Horizontal: move the collision box by `direction.x * speed`,
///      then push it out of every intersecting terrain tile against the
///      motion relative to the terrain (own walk minus this frame's world
///      shift). An idle player is still pushed out by a wall that scrolled
///      into it. Sets `on_left_wall` / `on_right_wall`.
///   2. Vertical: integrate gravity into `direction.y`, move by it, then
///      push out of every intersecting tile. Landing zeroes the velocity
///      and sets `on_ground`; hitting a ceiling zeroes it and sets
///      `on_ceiling`.
///
/// The passes are never merged into one diagonal sweep: corner cases
/// (walking into a ledge while falling) resolve sideways first.
///
/// ## Flags
///
/// Wall flags are cleared at the start of the horizontal pass and the
/// ceiling flag at the start of the vertical pass, so a flag is only set
/// when that frame's pass asserted it. `on_ground` is the exception: it is
/// cleared by velocity, not by contact (rising, or falling faster than
/// 1 px/frame), which gives one frame of grace when walking off a ledge.
///
/// ## Tile order
///
/// Tiles are visited in catalog (row-major) order. The relative motion
/// sign is fixed before the sweep and each tile is tested against the already
/// clamped box, so the final position is the most restrictive clamp
/// regardless of order. Shared edges never count as contact.

use super::entity::PlayerBody;
use super::tile::TileCatalog;

/// Vertical acceleration settings.
#[derive(Clone, Copy, Debug)]
pub struct Gravity {
    /// Added to `direction.y` every frame.
    pub accel: f32,
    /// Maximum downward speed; `None` leaves the fall uncapped.
    pub terminal_velocity: Option<f32>,
}

/// Falling faster than this (px/frame) means the body left the ground.
const GROUNDED_MAX_FALL: f32 = 1.0;

/// `world_shift` is the shift already applied to `terrain` this frame.
pub fn horizontal_pass(player: &mut PlayerBody, terrain: &TileCatalog, world_shift: f32) {
    player.on_left_wall = false;
    player.on_right_wall = false;

    let step = player.direction.x * player.speed;
    player.collision_rect.x += step;

    let relative = step - world_shift;
    if relative == 0.0 { return; }
    let moving_left = relative < 0.0;

    for tile in terrain.boxes() {
        if !player.collision_rect.intersects(&tile) { continue; }
        if moving_left {
            player.collision_rect.set_left(tile.right());
            player.on_left_wall = true;
        } else {
            player.collision_rect.set_right(tile.left());
            player.on_right_wall = true;
        }
    }
}

pub fn vertical_pass(player: &mut PlayerBody, terrain: &TileCatalog, gravity: &Gravity) {
    player.on_ceiling = false;

    apply_gravity(player, gravity);
    let vy = player.direction.y;
    player.collision_rect.y += vy;

    let falling = vy > 0.0;
    let rising = vy < 0.0;

    if falling || rising {
        for tile in terrain.boxes() {
            if !player.collision_rect.intersects(&tile) { continue; }
            if falling {
                player.collision_rect.set_bottom(tile.top());
                player.direction.y = 0.0;
                player.on_ground = true;
            } else {
                player.collision_rect.set_top(tile.bottom());
                player.direction.y = 0.0;
                player.on_ceiling = true;
            }
        }
    }

    let vy = player.direction.y;
    if (player.on_ground && vy < 0.0) || vy > GROUNDED_MAX_FALL {
        player.on_ground = false;
    }
}

fn apply_gravity(player: &mut PlayerBody, gravity: &Gravity) {
    player.direction.y += gravity.accel;
    if let Some(cap) = gravity.terminal_velocity {
        player.direction.y = player.direction.y.min(cap);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::domain::geometry::Rect;
    use crate::domain::tile::{LayerKind, EMPTY_CELL};

    const TILE: f32 = 64.0;

    const G: Gravity = Gravity { accel: 1.0, terminal_velocity: None };

    /// Build terrain from a diagram: '#' = solid, anything else = empty.
    fn terrain(rows: &[&str]) -> TileCatalog {
        let grid: Vec<Vec<i32>> = rows.iter()
            .map(|r| r.chars().map(|c| if c == '#' { 0 } else { EMPTY_CELL }).collect())
            .collect();
        TileCatalog::from_grid(LayerKind::Terrain, &grid, TILE)
    }

    /// 50x64 collision box with its top-left at (x, y).
    fn player_at(x: f32, y: f32) -> PlayerBody {
        let mut p = PlayerBody::new(Vec2::new(x, y), Vec2::new(64.0, 64.0), 50.0, 8.0);
        p.collision_rect = Rect::new(x, y, 50.0, 64.0);
        p
    }

    fn overlaps_any(p: &PlayerBody, t: &TileCatalog) -> bool {
        t.boxes().any(|b| p.collision_rect.intersects(&b))
    }

    // ── Horizontal ──

    #[test]
    fn walking_right_into_wall_clamps_and_flags() {
        let t = terrain(&[
            "  #",
        ]);
        let mut p = player_at(70.0, 0.0); // right edge at 120, wall starts at 128
        p.direction.x = 1.0;
        p.speed = 12.0;
        horizontal_pass(&mut p, &t, 0.0);
        assert_eq!(p.collision_rect.right(), 128.0);
        assert!(p.on_right_wall);
        assert!(!p.on_left_wall);
    }

    #[test]
    fn walking_left_into_wall_clamps_and_flags() {
        let t = terrain(&[
            "#  ",
        ]);
        let mut p = player_at(70.0, 0.0);
        p.direction.x = -1.0;
        p.speed = 10.0;
        horizontal_pass(&mut p, &t, 0.0);
        assert_eq!(p.collision_rect.left(), 64.0);
        assert!(p.on_left_wall);
    }

    #[test]
    fn free_horizontal_move_clears_stale_wall_flags() {
        let t = terrain(&["   "]);
        let mut p = player_at(70.0, 0.0);
        p.on_left_wall = true;
        p.on_right_wall = true;
        p.direction.x = 1.0;
        horizontal_pass(&mut p, &t, 0.0);
        assert_eq!(p.collision_rect.x, 78.0);
        assert!(!p.on_left_wall);
        assert!(!p.on_right_wall);
    }

    #[test]
    fn horizontal_pass_idempotent_at_zero_velocity() {
        let t = terrain(&[
            "# #",
            "###",
        ]);
        let mut p = player_at(70.0, 0.0);
        p.direction.x = 0.0;
        horizontal_pass(&mut p, &t, 0.0);
        let x1 = p.collision_rect.x;
        horizontal_pass(&mut p, &t, 0.0);
        assert_eq!(p.collision_rect.x, x1);
        assert_eq!(x1, 70.0);
    }

    #[test]
    fn stacked_wall_tiles_clamp_once_to_same_edge() {
        let t = terrain(&[
            "  #",
            "  #",
        ]);
        let mut p = player_at(70.0, 32.0); // straddles both rows
        p.direction.x = 1.0;
        p.speed = 20.0;
        horizontal_pass(&mut p, &t, 0.0);
        assert_eq!(p.collision_rect.right(), 128.0);
    }

    #[test]
    fn idle_player_is_pushed_out_by_scrolled_wall() {
        let mut t = terrain(&[
            "  #",
        ]);
        let mut p = player_at(70.0, 0.0); // right edge at 120
        t.shift(-12.0); // wall now starts at 116
        horizontal_pass(&mut p, &t, -12.0);
        assert_eq!(p.collision_rect.right(), 116.0);
        assert!(p.on_right_wall);
        assert!(!overlaps_any(&p, &t));
    }

    #[test]
    fn idle_player_is_pushed_out_by_wall_scrolling_right() {
        let mut t = terrain(&[
            "#  ",
        ]);
        let mut p = player_at(70.0, 0.0);
        t.shift(10.0); // wall now ends at 74
        horizontal_pass(&mut p, &t, 10.0);
        assert_eq!(p.collision_rect.left(), 74.0);
        assert!(p.on_left_wall);
    }

    #[test]
    fn shift_without_contact_sets_no_flags() {
        let mut t = terrain(&["#   #"]);
        let mut p = player_at(100.0, 0.0);
        t.shift(-8.0);
        horizontal_pass(&mut p, &t, -8.0);
        assert_eq!(p.collision_rect.x, 100.0);
        assert!(!p.on_left_wall && !p.on_right_wall);
    }

    // ── Vertical ──

    #[test]
    fn falling_onto_floor_lands() {
        let t = terrain(&[
            "   ",
            "###",
        ]);
        let mut p = player_at(10.0, 0.0); // bottom at 64 == floor top
        p.direction.y = 5.0;
        vertical_pass(&mut p, &t, &G);
        assert_eq!(p.collision_rect.bottom(), 64.0);
        assert_eq!(p.direction.y, 0.0);
        assert!(p.on_ground);
        assert!(!overlaps_any(&p, &t));
    }

    #[test]
    fn rising_into_ceiling_uses_vertical_direction() {
        let t = terrain(&[
            "###",
            "   ",
            "   ",
        ]);
        let mut p = player_at(10.0, 70.0);
        // Moving right while rising must still resolve as a ceiling hit.
        p.direction = Vec2::new(1.0, -12.0);
        vertical_pass(&mut p, &t, &G);
        assert_eq!(p.collision_rect.top(), 64.0);
        assert_eq!(p.direction.y, 0.0);
        assert!(p.on_ceiling);
        assert!(!p.on_ground);
    }

    #[test]
    fn ceiling_flag_resets_each_pass() {
        let t = terrain(&["   ", "   "]);
        let mut p = player_at(10.0, 0.0);
        p.on_ceiling = true;
        vertical_pass(&mut p, &t, &G);
        assert!(!p.on_ceiling);
    }

    #[test]
    fn jump_clears_ground_flag() {
        let t = terrain(&["   ", "   ", "###"]);
        let mut p = player_at(10.0, 64.0);
        p.on_ground = true;
        p.direction.y = -16.0;
        vertical_pass(&mut p, &t, &G);
        assert!(!p.on_ground);
        assert_eq!(p.direction.y, -15.0);
    }

    #[test]
    fn walking_off_ledge_keeps_ground_for_one_frame() {
        let t = terrain(&["   ", "   "]);
        let g = Gravity { accel: 0.8, terminal_velocity: None };
        let mut p = player_at(10.0, 0.0);
        p.on_ground = true;
        vertical_pass(&mut p, &t, &g); // vy = 0.8
        assert!(p.on_ground);
        vertical_pass(&mut p, &t, &g); // vy = 1.6
        assert!(!p.on_ground);
    }

    #[test]
    fn standing_is_stable() {
        let t = terrain(&["   ", "###"]);
        let g = Gravity { accel: 0.8, terminal_velocity: None };
        let mut p = player_at(10.0, 0.0);
        for _ in 0..30 {
            vertical_pass(&mut p, &t, &g);
            assert!(p.on_ground);
            assert_eq!(p.collision_rect.bottom(), 64.0);
        }
    }

    #[test]
    fn terminal_velocity_caps_fall() {
        let t = terrain(&[" "]);
        let g = Gravity { accel: 4.0, terminal_velocity: Some(10.0) };
        let mut p = player_at(0.0, 0.0);
        for _ in 0..10 {
            vertical_pass(&mut p, &t, &g);
        }
        assert_eq!(p.direction.y, 10.0);
    }

    #[test]
    fn rising_under_uneven_ceiling_takes_lowest_edge() {
        // Upper-row tile is visited first in row-major order, but the
        // lower tile is the one that must stop the head.
        let t = terrain(&[
            "#  ",
            " # ",
            "   ",
            "   ",
        ]);
        let mut p = player_at(40.0, 140.0); // spans columns 0 and 1
        p.direction.y = -80.0;
        vertical_pass(&mut p, &t, &G);
        assert_eq!(p.collision_rect.top(), 128.0);
        assert!(!overlaps_any(&p, &t));
    }

    #[test]
    fn no_overlap_after_landing_on_any_step_layout() {
        let layouts: [&[&str]; 4] = [
            &["    ", "    ", "####"],
            &["    ", "  ##", "####"],
            &["    ", "#   ", " ## "],
            &["    ", " #  ", "#  #"],
        ];
        for rows in layouts {
            let t = terrain(rows);
            for start_x in [0.0_f32, 20.0, 60.0, 100.0, 150.0, 190.0] {
                let mut p = player_at(start_x, 0.0);
                for _ in 0..120 {
                    vertical_pass(&mut p, &t, &G);
                    assert!(!overlaps_any(&p, &t), "overlap at x={start_x} rows={rows:?}");
                }
            }
        }
    }

    #[test]
    fn empty_terrain_falls_forever() {
        let grid = vec![vec![EMPTY_CELL; 8]; 8];
        let t = TileCatalog::from_grid(LayerKind::Terrain, &grid, TILE);
        let mut p = player_at(0.0, 0.0);
        let mut last_y = p.collision_rect.y;
        for _ in 0..200 {
            horizontal_pass(&mut p, &t, 0.0);
            vertical_pass(&mut p, &t, &G);
            assert!(!p.on_ground && !p.on_ceiling && !p.on_left_wall && !p.on_right_wall);
            assert!(p.collision_rect.y > last_y);
            last_y = p.collision_rect.y;
        }
    }
}

/// Entities: the player body and short-lived dust effects.
///
/// The player owns two boxes:
///   - the visual box (`position` + `size`), what the renderer draws
///   - the collision box, narrower than the visual box, what physics sees
///
/// Before resolution the collision box is synced from `position`;
/// afterwards `position` is synced back from the corrected collision box.
/// Both syncs anchor on the bottom edge and the horizontal centre, so
/// turning around never moves the sprite.

use glam::Vec2;

use super::geometry::Rect;

/// Horizontal movement intent (continuous while held).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
}

/// Frame input. Movement is level-triggered, jump is a request that only
/// takes effect while grounded.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub jump: bool,
}

/// Animation status, derived from direction each frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerStatus {
    Idle,
    Run,
    Jump,
    Fall,
}

#[derive(Clone, Debug)]
pub struct PlayerBody {
    /// Top-left of the visual box.
    pub position: Vec2,
    /// Visual box size.
    pub size: Vec2,
    pub collision_rect: Rect,
    /// `x` is -1, 0 or 1; `y` is the vertical velocity in px/frame.
    pub direction: Vec2,
    /// Horizontal px/frame. Zeroed by the camera while the world scrolls.
    pub speed: f32,
    pub on_ground: bool,
    pub on_left_wall: bool,
    pub on_right_wall: bool,
    pub on_ceiling: bool,
    pub facing_right: bool,
    pub status: PlayerStatus,
}

impl PlayerBody {
    pub fn new(spawn: Vec2, size: Vec2, collision_width: f32, speed: f32) -> Self {
        PlayerBody {
            position: spawn,
            size,
            collision_rect: {
                let w = collision_width.min(size.x);
                Rect::new(spawn.x + (size.x - w) / 2.0, spawn.y, w, size.y)
            },
            direction: Vec2::ZERO,
            speed,
            on_ground: false,
            on_left_wall: false,
            on_right_wall: false,
            on_ceiling: false,
            facing_right: true,
            status: PlayerStatus::Idle,
        }
    }

    /// Visual bounding box.
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(self.position, self.size)
    }

    /// Set direction and facing from input. Returns true if a jump started.
    pub fn apply_input(&mut self, input: FrameInput, jump_speed: f32) -> bool {
        match input.movement {
            Some(MoveDir::Left) => {
                self.direction.x = -1.0;
                self.facing_right = false;
            }
            Some(MoveDir::Right) => {
                self.direction.x = 1.0;
                self.facing_right = true;
            }
            None => self.direction.x = 0.0,
        }

        if input.jump && self.on_ground {
            self.direction.y = jump_speed;
            true
        } else {
            false
        }
    }

    /// Place the collision box under the visual box.
    pub fn sync_collision_rect(&mut self) {
        let visual = self.rect();
        self.collision_rect.set_left(visual.center_x() - self.collision_rect.w / 2.0);
        self.collision_rect.set_bottom(visual.bottom());
    }

    /// Place the visual box over the (resolved) collision box.
    pub fn sync_position(&mut self) {
        let c = self.collision_rect;
        self.position = Vec2::new(c.center_x() - self.size.x / 2.0, c.bottom() - self.size.y);
    }

    pub fn update_status(&mut self) {
        self.status = if self.direction.y < 0.0 {
            PlayerStatus::Jump
        } else if self.direction.y > 1.0 {
            PlayerStatus::Fall
        } else if self.direction.x != 0.0 {
            PlayerStatus::Run
        } else {
            PlayerStatus::Idle
        };
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EffectKind {
    JumpDust,
    LandingDust,
}

/// One-shot particle effect. Scrolls with the world, expires after
/// `lifetime` frames.
#[derive(Clone, Debug)]
pub struct Effect {
    pub kind: EffectKind,
    /// Bottom-centre anchor in screen pixels.
    pub anchor: Vec2,
    pub age: u32,
    lifetime: u32,
}

impl Effect {
    pub fn new(kind: EffectKind, anchor: Vec2, lifetime: u32) -> Self {
        Effect { kind, anchor, age: 0, lifetime }
    }

    pub fn is_active(&self) -> bool {
        self.age < self.lifetime
    }

    /// Progress 0.0 (just spawned) to 1.0 (expired), for frame selection.
    pub fn progress(&self) -> f32 {
        if self.lifetime == 0 { return 1.0; }
        (self.age as f32 / self.lifetime as f32).min(1.0)
    }

    /// Age one frame. Returns true if the effect just expired.
    pub fn tick(&mut self) -> bool {
        if self.age < self.lifetime {
            self.age += 1;
        }
        !self.is_active()
    }
}

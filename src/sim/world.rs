/// LevelState: the complete state of a running level.
///
/// ## Layers
///
/// Tile layers (`terrain`, `pillars`, `chains`, `coins`, `goal`) are built
/// once from the layout and never re-instantiated. Scrolling is a single
/// scalar, `world_shift`, written by the camera at the end of a frame and
/// applied uniformly to every non-player layer (and live effects) at the
/// start of the next. The player is never shifted.
///
/// ## Outcome
///
/// `Running → Won` and `Running → Lost` are the only transitions. Both are
/// terminal: a finished level ignores further steps. Retrying means
/// building a fresh `LevelState` from the same layout.

use glam::Vec2;

use crate::config::SimConfig;
use crate::domain::camera::ScrollSettings;
use crate::domain::entity::{Effect, PlayerBody};
use crate::domain::geometry::Rect;
use crate::domain::physics::Gravity;
use crate::domain::tile::{LayerKind, TileCatalog, Visual, EMPTY_CELL};
use super::level::{self, Layout, LayoutError, PLAYER_LAYER};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Running,
    Won,
    Lost,
}

pub struct LevelState {
    // ── Tile layers ──
    pub terrain: TileCatalog,
    pub pillars: TileCatalog,
    pub chains: TileCatalog,
    pub coins: TileCatalog,
    /// Empty when the layout has no goal marker.
    pub goal: TileCatalog,

    // ── Entities ──
    pub player: PlayerBody,
    pub effects: Vec<Effect>,

    // ── Scrolling ──
    /// Shift to apply to every non-player layer on the next step.
    pub world_shift: f32,

    // ── Tracking ──
    pub outcome: Outcome,
    pub coins_collected: u32,
    pub frame: u64,
    pub name: String,

    pub config: SimConfig,
}

// ── Construction ──

impl LevelState {
    /// Instantiate every layer and the player from a parsed layout.
    pub fn from_layout(layout: &Layout, config: &SimConfig) -> Result<Self, LayoutError> {
        let ts = config.tile_size;
        let layer = |kind: LayerKind| match layout.layer(kind.name()) {
            Some(grid) => TileCatalog::from_grid(kind, grid, ts),
            None => TileCatalog::empty(kind),
        };

        let terrain = TileCatalog::from_grid(
            LayerKind::Terrain,
            layout.require(LayerKind::Terrain.name())?,
            ts,
        );
        let ((spawn_col, spawn_row), goal_cell) = level::find_markers(layout.require(PLAYER_LAYER)?)?;

        let goal = match goal_cell {
            Some((col, row)) => TileCatalog::single(LayerKind::Goal, col, row, ts, Visual::Static(0)),
            None => TileCatalog::empty(LayerKind::Goal),
        };

        let spawn = Vec2::new(spawn_col as f32 * ts, spawn_row as f32 * ts);
        let player = PlayerBody::new(
            spawn,
            Vec2::new(config.player_width, config.player_height),
            config.collision_width,
            config.player_speed,
        );

        log::info!(
            "level '{}': {} terrain tiles, {} coins, spawn ({}, {}), goal {}",
            layout.name, terrain.len(),
            layout.layer(LayerKind::Coins.name()).map_or(0, |g| count_cells(g)),
            spawn_col, spawn_row,
            if goal.is_empty() { "none" } else { "present" },
        );

        Ok(LevelState {
            terrain,
            pillars: layer(LayerKind::Pillars),
            chains: layer(LayerKind::Chains),
            coins: layer(LayerKind::Coins),
            goal,
            player,
            effects: Vec::new(),
            world_shift: 0.0,
            outcome: Outcome::Running,
            coins_collected: 0,
            frame: 0,
            name: layout.name.clone(),
            config: config.clone(),
        })
    }
}

fn count_cells(grid: &[Vec<i32>]) -> usize {
    grid.iter().flatten().filter(|&&v| v != EMPTY_CELL).count()
}

// ── Queries ──

impl LevelState {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome != Outcome::Running
    }

    /// Goal marker box on screen, if the level has one.
    pub fn goal_rect(&self) -> Option<Rect> {
        self.goal.boxes().next()
    }

    pub fn layer(&self, kind: LayerKind) -> &TileCatalog {
        match kind {
            LayerKind::Terrain => &self.terrain,
            LayerKind::Pillars => &self.pillars,
            LayerKind::Chains => &self.chains,
            LayerKind::Coins => &self.coins,
            LayerKind::Goal => &self.goal,
        }
    }

    /// Tile layers in draw order. The player goes after these, then the goal.
    pub fn render_layers(&self) -> [&TileCatalog; 4] {
        LayerKind::RENDER_ORDER.map(|kind| self.layer(kind))
    }

    /// Tiles scrolled past since the start, for display.
    pub fn distance_tiles(&self) -> f32 {
        let d = -self.terrain.offset() / self.config.tile_size;
        if d > 0.0 { d } else { 0.0 }
    }

    /// Is any dust effect still playing?
    pub fn dust_active(&self) -> bool {
        self.effects.iter().any(|e| e.is_active())
    }

    pub fn gravity(&self) -> Gravity {
        Gravity {
            accel: self.config.gravity,
            terminal_velocity: self.config.terminal_velocity,
        }
    }

    pub fn scroll_settings(&self) -> ScrollSettings {
        ScrollSettings {
            screen_width: self.config.screen_width,
            scroll_speed: self.config.scroll_speed,
            base_speed: self.config.player_speed,
        }
    }
}

// ── Mutation ──

impl LevelState {
    /// Apply the pending world shift to every non-player layer and effect.
    pub fn shift_world(&mut self) {
        let dx = self.world_shift;
        if dx == 0.0 { return; }
        self.terrain.shift(dx);
        self.pillars.shift(dx);
        self.chains.shift(dx);
        self.coins.shift(dx);
        self.goal.shift(dx);
        for effect in self.effects.iter_mut() {
            effect.anchor.x += dx;
        }
    }

    pub fn finish(&mut self, outcome: Outcome) {
        if self.outcome != Outcome::Running { return; }
        log::info!("level '{}' finished at frame {}: {:?}", self.name, self.frame, outcome);
        self.outcome = outcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(terrain: Vec<Vec<i32>>, player: Vec<Vec<i32>>) -> Layout {
        let mut l = Layout::new("test");
        l.insert("terrain", terrain);
        l.insert(PLAYER_LAYER, player);
        l
    }

    #[test]
    fn spawn_and_goal_positions_follow_grid() {
        let l = layout(
            vec![vec![-1, -1, -1], vec![0, 0, 0]],
            vec![vec![-1, 0, 1], vec![-1, -1, -1]],
        );
        let level = LevelState::from_layout(&l, &SimConfig::default()).unwrap();
        assert_eq!(level.player.position, Vec2::new(64.0, 0.0));
        assert_eq!(level.goal_rect(), Some(Rect::new(128.0, 0.0, 64.0, 64.0)));
        assert_eq!(level.terrain.len(), 3);
        assert!(level.pillars.is_empty());
        assert_eq!(level.outcome, Outcome::Running);
    }

    #[test]
    fn missing_player_layer_is_an_error() {
        let mut l = Layout::new("broken");
        l.insert("terrain", vec![vec![-1]]);
        assert!(matches!(
            LevelState::from_layout(&l, &SimConfig::default()),
            Err(LayoutError::MissingLayer(_))
        ));
    }

    #[test]
    fn shift_moves_layers_but_not_player() {
        let l = layout(vec![vec![0, 0]], vec![vec![0, 1]]);
        let mut level = LevelState::from_layout(&l, &SimConfig::default()).unwrap();
        let player_before = level.player.position;
        level.world_shift = -8.0;
        level.shift_world();
        assert_eq!(level.terrain.offset(), -8.0);
        assert_eq!(level.goal.offset(), -8.0);
        assert_eq!(level.coins.offset(), -8.0);
        assert_eq!(level.player.position, player_before);
        assert_eq!(level.distance_tiles(), 0.125);
    }

    #[test]
    fn outcome_is_terminal() {
        let l = layout(vec![vec![-1]], vec![vec![0]]);
        let mut level = LevelState::from_layout(&l, &SimConfig::default()).unwrap();
        level.finish(Outcome::Won);
        level.finish(Outcome::Lost);
        assert_eq!(level.outcome(), Outcome::Won);
        assert!(level.is_finished());
    }

    #[test]
    fn render_layers_in_draw_order() {
        let l = layout(vec![vec![-1]], vec![vec![0]]);
        let level = LevelState::from_layout(&l, &SimConfig::default()).unwrap();
        let kinds: Vec<_> = level.render_layers().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, LayerKind::RENDER_ORDER.to_vec());
    }
}

/// Tiles and tile catalogs.
///
/// A level is a stack of named layers. Each layer is a `TileCatalog`:
/// the tiles instantiated from one layout grid, in row-major order.
/// Tile boxes are fixed at construction; camera scrolling is a single
/// horizontal offset carried by the catalog, so a tile's on-screen box
/// is always `tile.rect` shifted by `catalog.offset()`.
///
/// Visual semantics are a tag on the tile, not a type per variant.
/// The renderer decides what each tag looks like.

use glam::Vec2;

use super::geometry::Rect;

/// Layout cell value meaning "nothing here".
pub const EMPTY_CELL: i32 = -1;

/// Player-layer cell values.
pub const SPAWN_CELL: i32 = 0;
pub const GOAL_CELL: i32 = 1;

/// Coins are drawn centred in their cell at this fraction of the tile size.
const COIN_SCALE: f32 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum LayerKind {
    Terrain,
    Pillars,
    Chains,
    Coins,
    Goal,
}

impl LayerKind {
    /// Tile layers in the order they are handed to the renderer.
    /// The player is drawn between `Coins` and `Goal`.
    pub const RENDER_ORDER: [LayerKind; 4] = [
        LayerKind::Terrain,
        LayerKind::Pillars,
        LayerKind::Chains,
        LayerKind::Coins,
    ];

    /// Layout layer name (also the CSV file stem).
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Terrain => "terrain",
            LayerKind::Pillars => "pillars",
            LayerKind::Chains  => "chains",
            LayerKind::Coins   => "coins",
            LayerKind::Goal    => "goal",
        }
    }

    /// Visual tag for a non-empty cell of this layer.
    fn visual_for(self, value: i32) -> Visual {
        match self {
            LayerKind::Coins => Visual::OffsetAnimated,
            _ => Visual::Static(value.max(0) as u16),
        }
    }
}

/// How a tile is drawn. Pure data; slicing and frame cycling live outside.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Visual {
    /// Fixed frame from the tile sheet.
    Static(u16),
    /// Looping animation centred inside the cell (coins).
    OffsetAnimated,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    /// Box in level coordinates (before any scrolling).
    pub rect: Rect,
    pub visual: Visual,
}

impl Tile {
    /// Tile for the grid cell at `(col, row)`.
    fn for_cell(col: usize, row: usize, tile_size: f32, visual: Visual) -> Self {
        let origin = Vec2::new(col as f32 * tile_size, row as f32 * tile_size);
        let rect = match visual {
            Visual::OffsetAnimated => {
                let center = origin + Vec2::splat(tile_size / 2.0);
                Rect::from_center(center, Vec2::splat(tile_size * COIN_SCALE))
            }
            _ => Rect::from_top_left(origin, Vec2::splat(tile_size)),
        };
        Tile { rect, visual }
    }
}

/// All tiles of one layer, plus the layer's accumulated scroll offset.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    kind: LayerKind,
    tiles: Vec<Tile>,
    offset: f32,
}

impl TileCatalog {
    pub fn empty(kind: LayerKind) -> Self {
        TileCatalog { kind, tiles: Vec::new(), offset: 0.0 }
    }

    /// Instantiate one tile per non-empty cell, row-major.
    /// The grid is assumed rectangular and already parsed.
    pub fn from_grid(kind: LayerKind, grid: &[Vec<i32>], tile_size: f32) -> Self {
        let mut tiles = Vec::new();
        for (row, cells) in grid.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value == EMPTY_CELL { continue; }
                tiles.push(Tile::for_cell(col, row, tile_size, kind.visual_for(value)));
            }
        }
        TileCatalog { kind, tiles, offset: 0.0 }
    }

    /// Catalog holding a single tile at `(col, row)` (the goal marker).
    pub fn single(kind: LayerKind, col: usize, row: usize, tile_size: f32, visual: Visual) -> Self {
        TileCatalog {
            kind,
            tiles: vec![Tile::for_cell(col, row, tile_size, visual)],
            offset: 0.0,
        }
    }

    pub fn kind(&self) -> LayerKind { self.kind }
    pub fn len(&self) -> usize { self.tiles.len() }
    pub fn is_empty(&self) -> bool { self.tiles.is_empty() }
    pub fn offset(&self) -> f32 { self.offset }

    /// Apply this frame's world shift.
    pub fn shift(&mut self, dx: f32) {
        self.offset += dx;
    }

    /// On-screen boxes, in catalog order.
    pub fn boxes(&self) -> impl Iterator<Item = Rect> + '_ {
        self.tiles.iter().map(move |t| t.rect.shifted_x(self.offset))
    }

    /// On-screen boxes paired with their visuals, for the renderer.
    pub fn placed(&self) -> impl Iterator<Item = (Rect, Visual)> + '_ {
        self.tiles.iter().map(move |t| (t.rect.shifted_x(self.offset), t.visual))
    }

    /// Remove every tile whose on-screen box intersects `target`.
    /// Returns how many were removed.
    pub fn take_intersecting(&mut self, target: &Rect) -> usize {
        let before = self.tiles.len();
        let offset = self.offset;
        self.tiles.retain(|t| !t.rect.shifted_x(offset).intersects(target));
        before - self.tiles.len()
    }
}

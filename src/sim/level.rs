/// Level layout loading.
///
/// ## Sources (priority order):
///   1. Configured level directory (one CSV file per layer)
///   2. Built-in embedded level
///
/// ## Directory format
///
///   ```
///   levels/level_0/
///     terrain.csv   (required)
///     player.csv    (required: 0 = spawn, 1 = goal)
///     pillars.csv   (optional)
///     chains.csv    (optional)
///     coins.csv     (optional)
///   ```
///
/// Every file is a grid of comma-separated integers, `-1` = empty.
/// Blank lines are skipped. All rows of one file must have the same length.
///
/// ## Embedded legend:
///   '#' = Terrain          'I' = Pillar        '!' = Chain
///   '$' = Coin             'P' = Player spawn  'G' = Goal
///   ' ' = Empty

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::tile::{LayerKind, EMPTY_CELL, GOAL_CELL, SPAWN_CELL};

pub type Grid = Vec<Vec<i32>>;

/// Name of the layer holding the spawn and goal markers.
pub const PLAYER_LAYER: &str = "player";

/// Layers that must be present in a level directory.
const REQUIRED_LAYERS: [&str; 2] = ["terrain", PLAYER_LAYER];

/// Decoration layers that load as empty when their file is missing.
const OPTIONAL_LAYERS: [LayerKind; 3] = [LayerKind::Pillars, LayerKind::Chains, LayerKind::Coins];

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{layer}: row {row}, column {col}: `{cell}` is not an integer")]
    NotANumber { layer: String, row: usize, col: usize, cell: String },
    #[error("{layer}: row {row} has {found} cells, expected {expected}")]
    Ragged { layer: String, row: usize, expected: usize, found: usize },
    #[error("missing required layer `{0}`")]
    MissingLayer(String),
    #[error("player layer has no spawn marker (cell value 0)")]
    MissingSpawn,
    #[error("player layer has {0} spawn markers, expected exactly one")]
    DuplicateSpawn(usize),
    #[error("player layer has {0} goal markers, expected at most one")]
    DuplicateGoal(usize),
}

/// Parsed level: layer name → rectangular integer grid.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub name: String,
    layers: HashMap<String, Grid>,
}

impl Layout {
    pub fn new(name: &str) -> Self {
        Layout { name: name.to_string(), layers: HashMap::new() }
    }

    pub fn insert(&mut self, layer: &str, grid: Grid) {
        self.layers.insert(layer.to_string(), grid);
    }

    pub fn layer(&self, name: &str) -> Option<&Grid> {
        self.layers.get(name)
    }

    /// Grid for a required layer.
    pub fn require(&self, name: &str) -> Result<&Grid, LayoutError> {
        self.layer(name).ok_or_else(|| LayoutError::MissingLayer(name.to_string()))
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level, or the embedded one when none is set or
/// the configured directory does not exist.
pub fn resolve_layout(level_dir: Option<&Path>) -> Result<Layout, LayoutError> {
    match level_dir {
        Some(dir) if dir.is_dir() => load_layout(dir),
        Some(dir) => {
            log::warn!("level directory {} not found, using the built-in level", dir.display());
            Ok(embedded_layout())
        }
        None => Ok(embedded_layout()),
    }
}

/// Load every layer CSV from a level directory.
pub fn load_layout(dir: &Path) -> Result<Layout, LayoutError> {
    let name = dir.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let mut layout = Layout::new(&name);

    for layer in REQUIRED_LAYERS {
        let grid = read_grid(dir, layer)?
            .ok_or_else(|| LayoutError::MissingLayer(layer.to_string()))?;
        layout.insert(layer, grid);
    }
    for kind in OPTIONAL_LAYERS {
        match read_grid(dir, kind.name())? {
            Some(grid) => layout.insert(kind.name(), grid),
            None => log::debug!("{}: no {}.csv, layer left empty", name, kind.name()),
        }
    }

    log::info!("loaded level '{}' from {}", name, dir.display());
    Ok(layout)
}

/// Parse one CSV grid. Rows must be rectangular and every cell an integer.
pub fn parse_grid(layer: &str, text: &str) -> Result<Grid, LayoutError> {
    let mut grid: Grid = Vec::new();

    for (row, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let mut cells = Vec::new();
        for (col, raw) in line.split(',').enumerate() {
            let cell = raw.trim();
            let value = cell.parse::<i32>().map_err(|_| LayoutError::NotANumber {
                layer: layer.to_string(),
                row,
                col,
                cell: cell.to_string(),
            })?;
            cells.push(value);
        }
        if let Some(first) = grid.first() {
            if first.len() != cells.len() {
                return Err(LayoutError::Ragged {
                    layer: layer.to_string(),
                    row,
                    expected: first.len(),
                    found: cells.len(),
                });
            }
        }
        grid.push(cells);
    }

    Ok(grid)
}

/// Locate the spawn and optional goal markers in the player layer.
/// Returns `((col, row), Option<(col, row)>)`.
pub fn find_markers(grid: &Grid) -> Result<((usize, usize), Option<(usize, usize)>), LayoutError> {
    let mut spawns = vec![];
    let mut goals = vec![];
    for (row, cells) in grid.iter().enumerate() {
        for (col, &value) in cells.iter().enumerate() {
            match value {
                SPAWN_CELL => spawns.push((col, row)),
                GOAL_CELL => goals.push((col, row)),
                _ => {}
            }
        }
    }

    let spawn = match spawns.len() {
        0 => return Err(LayoutError::MissingSpawn),
        1 => spawns[0],
        n => return Err(LayoutError::DuplicateSpawn(n)),
    };
    if goals.len() > 1 {
        return Err(LayoutError::DuplicateGoal(goals.len()));
    }
    Ok((spawn, goals.first().copied()))
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

/// Read `<dir>/<layer>.csv`. `Ok(None)` if the file does not exist.
fn read_grid(dir: &Path, layer: &str) -> Result<Option<Grid>, LayoutError> {
    let path = dir.join(format!("{layer}.csv"));
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|source| LayoutError::Io { path: path.clone(), source })?;
    parse_grid(layer, &text).map(Some)
}

// ══════════════════════════════════════════════════════════════
// Embedded level
// ══════════════════════════════════════════════════════════════

fn embedded_layout() -> Layout {
    make_embedded("Crypt Entrance", &[
        "                                                                ",
        "                                                                ",
        "                     $$$                                        ",
        "                    #####           $ $ $                       ",
        "           $$                      #######               G      ",
        "          ####      !          !                      ######    ",
        "  P                 !    $$    !        $$     ##               ",
        "#######    ###      I  ######  I     #######   ##   #####       ",
        "#######    ###      I  ######  I     #######   ##   #####  #####",
        "#######    ##############################     ###########  #####",
        "#######    ##############################     ###########  #####",
    ])
}

/// Build a layout from an ASCII map. Short rows are padded with empty cells.
fn make_embedded(name: &str, map: &[&str]) -> Layout {
    let height = map.len();
    let width = map.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let blank = || vec![vec![EMPTY_CELL; width]; height];

    let chars: Vec<Vec<char>> = map.iter()
        .map(|r| {
            let mut row: Vec<char> = r.chars().collect();
            row.resize(width, ' ');
            row
        })
        .collect();

    let mut terrain = blank();
    let mut pillars = blank();
    let mut chains = blank();
    let mut coins = blank();
    let mut player = blank();

    for (y, row) in chars.iter().enumerate() {
        for (x, &ch) in row.iter().enumerate() {
            match ch {
                '#' => {
                    // Sheet frame 0 = grass top, 1 = fill.
                    let exposed = y == 0 || chars[y - 1][x] != '#';
                    terrain[y][x] = if exposed { 0 } else { 1 };
                }
                'I' => pillars[y][x] = 0,
                '!' => chains[y][x] = 0,
                '$' => coins[y][x] = 0,
                'P' => player[y][x] = SPAWN_CELL,
                'G' => player[y][x] = GOAL_CELL,
                _ => {}
            }
        }
    }

    let mut layout = Layout::new(name);
    layout.insert(LayerKind::Terrain.name(), terrain);
    layout.insert(LayerKind::Pillars.name(), pillars);
    layout.insert(LayerKind::Chains.name(), chains);
    layout.insert(LayerKind::Coins.name(), coins);
    layout.insert(PLAYER_LAYER, player);
    layout
}

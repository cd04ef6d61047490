/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [physics]
/// gravity = 0.8
/// jump_speed = -16.0
/// player_speed = 8.0
/// # terminal_velocity = 20.0   # omit for an uncapped fall
///
/// [camera]
/// scroll_speed = 8.0
///
/// [screen]
/// tile_size = 64
/// width = 1200
/// height = 704
///
/// [general]
/// level_dir = "levels/level_0"
/// log_file = "dungeon-scroller.log"
/// ```

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub frame_ms: u64,
    pub gamepad: GamepadConfig,
    /// Directory holding the level's layer CSVs. `None` = built-in level.
    pub level_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    /// Problems met while loading, reported once logging is up.
    pub warnings: Vec<String>,
}

/// Everything the simulation reads. Pixel units, per-frame rates.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub tile_size: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    pub gravity: f32,
    pub terminal_velocity: Option<f32>,
    pub jump_speed: f32,
    pub player_speed: f32,
    pub scroll_speed: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub collision_width: f32,
    pub dust_frames: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    camera: TomlCamera,
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    effects: TomlEffects,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default)]
    terminal_velocity: Option<f32>,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlCamera {
    #[serde(default = "default_scroll_speed")]
    scroll_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlScreen {
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default = "default_screen_width")]
    width: u32,
    #[serde(default = "default_screen_height")]
    height: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_width")]
    width: u32,
    #[serde(default = "default_player_height")]
    height: u32,
    #[serde(default = "default_collision_width")]
    collision_width: u32,
}

#[derive(Deserialize, Debug)]
struct TomlEffects {
    #[serde(default = "default_dust_frames")]
    dust_frames: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level_dir: Option<String>,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.8 }
fn default_jump_speed() -> f32 { -16.0 }
fn default_player_speed() -> f32 { 8.0 }
fn default_scroll_speed() -> f32 { 8.0 }
fn default_tile_size() -> u32 { 64 }
fn default_screen_width() -> u32 { 1200 }
fn default_screen_height() -> u32 { 704 }  // 11 rows of tiles
fn default_player_width() -> u32 { 64 }
fn default_player_height() -> u32 { 64 }
fn default_collision_width() -> u32 { 50 }
fn default_dust_frames() -> u32 { 12 }
fn default_frame_ms() -> u64 { 16 }    // ~60 fps

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            terminal_velocity: None,
            jump_speed: default_jump_speed(),
            player_speed: default_player_speed(),
        }
    }
}

impl Default for TomlCamera {
    fn default() -> Self {
        TomlCamera { scroll_speed: default_scroll_speed() }
    }
}

impl Default for TomlScreen {
    fn default() -> Self {
        TomlScreen {
            tile_size: default_tile_size(),
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            width: default_player_width(),
            height: default_player_height(),
            collision_width: default_collision_width(),
        }
    }
}

impl Default for TomlEffects {
    fn default() -> Self {
        TomlEffects { dust_frames: default_dust_frames() }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { frame_ms: default_frame_ms() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig::from_toml(&TomlConfig::default())
    }
}

impl SimConfig {
    fn from_toml(cfg: &TomlConfig) -> Self {
        SimConfig {
            tile_size: cfg.screen.tile_size as f32,
            screen_width: cfg.screen.width as f32,
            screen_height: cfg.screen.height as f32,
            gravity: cfg.physics.gravity,
            terminal_velocity: cfg.physics.terminal_velocity,
            jump_speed: cfg.physics.jump_speed,
            player_speed: cfg.physics.player_speed,
            scroll_speed: cfg.camera.scroll_speed,
            player_width: cfg.player.width as f32,
            player_height: cfg.player.height as f32,
            collision_width: cfg.player.collision_width as f32,
            dust_frames: cfg.effects.dust_frames,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let mut config = load_file(&search_dirs, &mut warnings);

        // Relative level paths resolve against the first candidate that has them.
        config.level_dir = config.level_dir.map(|path| {
            if path.is_absolute() {
                path
            } else {
                search_dirs.iter()
                    .map(|d| d.join(&path))
                    .find(|p| p.is_dir())
                    .unwrap_or(path)
            }
        });
        config.warnings = warnings;
        config
    }

    /// Parse config text directly (no file search, paths kept as written).
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from_toml)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let sim = SimConfig::from_toml(&cfg);
        GameConfig {
            sim,
            frame_ms: cfg.timing.frame_ms,
            gamepad: GamepadConfig {
                jump: cfg.gamepad.jump,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                restart: cfg.gamepad.restart,
            },
            level_dir: cfg.general.level_dir.map(PathBuf::from),
            log_file: cfg.general.log_file.map(PathBuf::from),
            warnings: Vec::new(),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_file(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match GameConfig::parse(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                    return GameConfig::default();
                }
            },
            Err(e) => {
                warnings.push(format!("could not read {}: {e}", path.display()));
            }
        }
    }
    GameConfig::default()
}

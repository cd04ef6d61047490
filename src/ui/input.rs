/// Keyboard state tracker.
///
/// Terminals report key presses, not key state. To walk while a key is
/// held we remember when each key was last seen:
///   - Press/Repeat refreshes the key's timestamp
///   - Release drops it (only when the terminal reports releases)
///   - otherwise the key expires after `HOLD_TIMEOUT`
///
/// Movement is level-triggered (held), jump/restart/quit are
/// edge-triggered (fresh press this frame).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{FrameInput, MoveDir};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[
    KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W'),
];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the latest drain.
    fresh_presses: Vec<KeyCode>,

    ctrl_c: bool,

    /// Honor Release events. Only set when keyboard enhancement is on.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, releases are unreliable; rely on the timeout.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        let now = Instant::now();
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    /// Movement and jump for this frame. Left wins if both are held.
    pub fn frame_input(&self) -> FrameInput {
        let movement = if self.any_held(KEYS_LEFT) || self.any_pressed(KEYS_LEFT) {
            Some(MoveDir::Left)
        } else if self.any_held(KEYS_RIGHT) || self.any_pressed(KEYS_RIGHT) {
            Some(MoveDir::Right)
        } else {
            None
        };
        FrameInput { movement, jump: self.any_pressed(KEYS_JUMP) }
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

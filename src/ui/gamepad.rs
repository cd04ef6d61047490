/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Walk left / right
///   A / B                 →  Jump
///   Start                 →  Confirm / Restart
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::{FrameInput, MoveDir};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical face/shoulder button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB"    => Some(Btn::L1),
            "R1" | "RB"    => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South  => Some(Btn::A),
            Button::East   => Some(Btn::B),
            Button::West   => Some(Btn::X),
            Button::North  => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:    vec![Btn::A, Btn::B],
            confirm: vec![Btn::Start],
            cancel:  vec![Btn::Select],
            restart: vec![Btn::Start],
        }
    }
}

/// Names that don't parse are dropped; an empty result keeps the default.
fn parse_list(names: &[String], fallback: &mut Vec<Btn>) {
    let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
    if !parsed.is_empty() {
        *fallback = parsed;
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    dpad_left: BtnState,
    dpad_right: BtnState,
    stick_x: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_x: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let map = &mut self.action_map;
        parse_list(&cfg.jump, &mut map.jump);
        parse_list(&cfg.confirm, &mut map.confirm);
        parse_list(&cfg.cancel, &mut map.cancel);
        parse_list(&cfg.restart, &mut map.restart);
    }

    pub fn update(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    self.stick_x = value;
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let state = match gilrs_btn {
            Button::DPadLeft => &mut self.dpad_left,
            Button::DPadRight => &mut self.dpad_right,
            other => match Btn::from_gilrs(other) {
                Some(btn) => &mut self.buttons[btn as usize],
                None => return,
            },
        };
        state.held = held;
        if held { state.just_pressed = true; }
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    pub fn left_held(&self) -> bool {
        self.dpad_left.held || self.stick_x < -STICK_DEADZONE
    }
    pub fn right_held(&self) -> bool {
        self.dpad_right.held || self.stick_x > STICK_DEADZONE
    }

    /// Movement and jump for this frame, same shape as the keyboard's.
    pub fn frame_input(&self) -> FrameInput {
        let movement = if self.left_held() {
            Some(MoveDir::Left)
        } else if self.right_held() {
            Some(MoveDir::Right)
        } else {
            None
        };
        FrameInput { movement, jump: self.any_just_pressed(&self.action_map.jump) }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_x = 0.0;
    }
}

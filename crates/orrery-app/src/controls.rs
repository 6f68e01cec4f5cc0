//! Keyboard and mouse input for one frame.
//!
//! Speed keys are edge-triggered (auto-repeat counts as further presses),
//! movement keys are level-triggered, and mouse-look only accumulates while
//! the right button is held. Physical key codes keep WASD in place on every
//! keyboard layout.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use orrery_animation::SpeedInput;
use winit::event::{ElementState, KeyEvent, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    IncreaseSpeed,
    DecreaseSpeed,
    Exit,
}

impl ControlAction {
    pub fn for_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match code {
            KeyCode::ArrowUp | KeyCode::Equal | KeyCode::NumpadAdd => Some(Self::IncreaseSpeed),
            KeyCode::ArrowDown | KeyCode::Minus | KeyCode::NumpadSubtract => {
                Some(Self::DecreaseSpeed)
            }
            KeyCode::Escape => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Platform-independent key event, so tests need no winit event loop.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: PhysicalKey,
    pub state: ElementState,
    pub repeat: bool,
}

#[derive(Debug, Default)]
pub struct Controls {
    held: HashSet<PhysicalKey>,
    speed_steps: i32,
    exit_requested: bool,
    looking: bool,
    look_delta: Vec2,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    pub fn process_raw(&mut self, event: RawKeyEvent) {
        match event.state {
            ElementState::Pressed => {
                self.held.insert(event.key);
                match ControlAction::for_key(event.key) {
                    Some(ControlAction::IncreaseSpeed) => self.speed_steps += 1,
                    Some(ControlAction::DecreaseSpeed) => self.speed_steps -= 1,
                    Some(ControlAction::Exit) if !event.repeat => self.exit_requested = true,
                    _ => {}
                }
            }
            ElementState::Released => {
                self.held.remove(&event.key);
            }
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Right {
            self.looking = state == ElementState::Pressed;
        }
    }

    /// Raw device motion in pixels.
    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.looking {
            self.look_delta += Vec2::new(dx as f32, dy as f32);
        }
    }

    /// Drop held state, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.looking = false;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Speed commands since the last call.
    pub fn take_speed_input(&mut self) -> SpeedInput {
        match std::mem::take(&mut self.speed_steps) {
            0 => SpeedInput::Hold,
            n => SpeedInput::Step(n),
        }
    }

    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Held movement as `(right, 0, forward)`, each component in `[-1, 1]`.
    pub fn movement_axes(&self) -> Vec3 {
        let axis = |positive: KeyCode, negative: KeyCode| {
            let held = |code| self.held.contains(&PhysicalKey::Code(code));
            f32::from(u8::from(held(positive))) - f32::from(u8::from(held(negative)))
        };
        Vec3::new(axis(KeyCode::KeyD, KeyCode::KeyA), 0.0, axis(KeyCode::KeyW, KeyCode::KeyS))
    }
}

use std::collections::HashMap;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::CameraMovement;
use crate::entity::Axis;

/// Everything the keyboard can ask the viewer to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Camera(CameraMovement),
    ToggleRotate(Axis),
    ScaleUp,
    ScaleDown,
    MoveForward,
    MoveBackward,
    /// Cycle the entity that receives entity commands.
    SelectNext,
    Quit,
}

/// Maps physical keys to [`Command`]s.
///
/// Defaults:
///
/// | Key           | Command                          |
/// |---------------|----------------------------------|
/// | W / S / A / D | camera forward/back/left/right   |
/// | X / Y / Z     | toggle spin about that axis      |
/// | E / Q         | scale up / down                  |
/// | U / J         | move forward / backward          |
/// | C             | select next entity               |
/// | Escape        | quit                             |
#[derive(Clone, Debug, PartialEq)]
pub struct KeyBindings {
    map: HashMap<KeyCode, Command>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::empty()
            .bind(KeyCode::KeyW, Command::Camera(CameraMovement::Forward))
            .bind(KeyCode::KeyS, Command::Camera(CameraMovement::Backward))
            .bind(KeyCode::KeyA, Command::Camera(CameraMovement::Left))
            .bind(KeyCode::KeyD, Command::Camera(CameraMovement::Right))
            .bind(KeyCode::KeyX, Command::ToggleRotate(Axis::X))
            .bind(KeyCode::KeyY, Command::ToggleRotate(Axis::Y))
            .bind(KeyCode::KeyZ, Command::ToggleRotate(Axis::Z))
            .bind(KeyCode::KeyE, Command::ScaleUp)
            .bind(KeyCode::KeyQ, Command::ScaleDown)
            .bind(KeyCode::KeyU, Command::MoveForward)
            .bind(KeyCode::KeyJ, Command::MoveBackward)
            .bind(KeyCode::KeyC, Command::SelectNext)
            .bind(KeyCode::Escape, Command::Quit)
    }
}

impl KeyBindings {
    /// No bindings at all.
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Binds `key`, replacing any previous command for it.
    pub fn bind(mut self, key: KeyCode, command: Command) -> Self {
        self.map.insert(key, command);
        self
    }

    pub fn unbind(mut self, key: KeyCode) -> Self {
        self.map.remove(&key);
        self
    }

    pub fn command_for(&self, key: KeyCode) -> Option<Command> {
        self.map.get(&key).copied()
    }

    /// Resolves a window key event. Presses and auto-repeats dispatch,
    /// releases do not.
    pub fn command_for_event(&self, event: &KeyEvent) -> Option<Command> {
        if event.state != ElementState::Pressed {
            return None;
        }
        match event.physical_key {
            PhysicalKey::Code(key) => self.command_for(key),
            PhysicalKey::Unidentified(_) => None,
        }
    }
}

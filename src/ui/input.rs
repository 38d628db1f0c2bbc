/// Keyboard input.
///
/// The simulation takes at most one action per tick, so input is buffered:
/// every key press between two ticks overwrites the pending action, and the
/// game loop takes it once per tick. Key repeat from the terminal gives
/// continuous movement while a key is held.
///
/// Only Press and Repeat events count. Release events (reported by terminals
/// with keyboard enhancement) are ignored.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Action;
use crate::domain::grid::Dir;

/// Keys that drive the session rather than the avatar.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Meta {
    Quit,
    Restart,
    Confirm,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyInput {
    Play(Action),
    Meta(Meta),
}

/// Decode one key press.
///
///   Arrows / WASD  →  Move
///   Space          →  Fire
///   F2             →  Restart level
///   Enter          →  Confirm
///   Esc / Q / ^C   →  Quit
pub fn map_key(key: &KeyEvent) -> Option<KeyInput> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
            .then_some(KeyInput::Meta(Meta::Quit));
    }
    let input = match key.code {
        KeyCode::Up    | KeyCode::Char('w') | KeyCode::Char('W') => KeyInput::Play(Action::Move(Dir::Up)),
        KeyCode::Down  | KeyCode::Char('s') | KeyCode::Char('S') => KeyInput::Play(Action::Move(Dir::Down)),
        KeyCode::Left  | KeyCode::Char('a') | KeyCode::Char('A') => KeyInput::Play(Action::Move(Dir::Left)),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => KeyInput::Play(Action::Move(Dir::Right)),
        KeyCode::Char(' ') => KeyInput::Play(Action::Fire),
        KeyCode::F(2) => KeyInput::Meta(Meta::Restart),
        KeyCode::Enter => KeyInput::Meta(Meta::Confirm),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyInput::Meta(Meta::Quit),
        _ => return None,
    };
    Some(input)
}

pub struct InputState {
    /// Most recent gameplay key since the last `take_action()`.
    pending: Option<Action>,
    /// Meta keys seen during the most recent drain.
    meta: Vec<Meta>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { pending: None, meta: Vec::with_capacity(4) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.meta.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release { return; }
        match map_key(&key) {
            Some(KeyInput::Play(action)) => self.pending = Some(action),
            Some(KeyInput::Meta(m)) => self.meta.push(m),
            None => {}
        }
    }

    /// The buffered action for this tick, if any. Clears the buffer.
    pub fn take_action(&mut self) -> Option<Action> {
        self.pending.take()
    }

    /// Drop anything buffered (used while the session is paused between levels).
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn meta_pressed(&self, m: Meta) -> bool {
        self.meta.contains(&m)
    }
}

use crossterm::event::KeyEvent;

use crate::vault::VaultEvent;

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Vault
    Vault(VaultEvent),

    // -- Host surface
    Notify(String),

    // -- System
    Tick,
}

//! Event handling for the TUI
//!
//! Translates crossterm events into messages and feeds them to the app.

use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent};

use super::app::App;
use super::msg::{key_to_msg, mouse_to_msg, Msg};

/// Handle a key event, returns true if app should quit
pub fn handle_event(app: &mut App, key: KeyEvent) -> bool {
    // Windows reports releases too
    if key.kind == KeyEventKind::Release {
        return false;
    }
    let msg = key_to_msg(
        key.code,
        key.modifiers,
        app.model.help_open,
        app.model.editing.is_some(),
    );
    app.dispatch(msg)
}

/// Handle a mouse event
pub fn handle_mouse(app: &mut App, event: MouseEvent) {
    let msg = mouse_to_msg(event);
    if msg != Msg::Noop {
        app.dispatch(msg);
    }
}

/// Handle a terminal resize
pub fn handle_resize(app: &mut App, width: u16, height: u16) {
    app.dispatch(Msg::Resize(width, height));
}

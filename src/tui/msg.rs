//! TEA message types for the panel
//!
//! Messages are plain data describing what happened. The single
//! [`update`](super::update::update) function decides what they mean.

use crossterm::event::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};

use crate::panel::PanelView;

/// All possible messages/actions in the panel
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // === Navigation ===
    /// Move selection up by one
    MoveUp,
    /// Move selection down by one
    MoveDown,
    /// Move selection up by page
    PageUp,
    /// Move selection down by page
    PageDown,
    /// Jump to first command
    JumpToTop,
    /// Jump to last command
    JumpToBottom,

    // === Commands ===
    /// Run the selected command
    RunSelected,
    /// Start editing the selected command's override
    StartEdit,
    /// Add a character to the override being edited
    EditInput(char),
    /// Remove the last character of the override being edited
    EditBackspace,
    /// Save the override being edited
    EditConfirm,
    /// Abandon the edit
    EditCancel,
    /// Drop the selected command's override
    ClearSelectedOverride,

    // === Settings ===
    /// Flip the temporary run mode
    ToggleRunMode,
    /// Open `.cmmds` in the editor
    OpenConfig,
    /// Clear the whole temporary section
    ClearOverlay,

    // === Data ===
    /// Re-read the config file on request
    Refresh,
    /// The config file changed on disk
    ConfigChanged,
    /// A fresh view arrived from the panel controller
    Rendered(PanelView),

    // === Modals ===
    /// Toggle help modal
    ToggleHelp,
    /// Close any open modal
    CloseModal,

    // === Lifecycle ===
    /// Quit the application
    Quit,
    /// Periodic tick
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// Key with no binding
    Noop,
}

/// Map a key press to a message.
///
/// Edit mode captures every key; the help modal only answers close keys.
pub fn key_to_msg(code: KeyCode, modifiers: KeyModifiers, help_open: bool, editing: bool) -> Msg {
    if editing {
        return match code {
            KeyCode::Enter => Msg::EditConfirm,
            KeyCode::Esc => Msg::EditCancel,
            KeyCode::Backspace => Msg::EditBackspace,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Msg::EditCancel,
            KeyCode::Char(c) => Msg::EditInput(c),
            _ => Msg::Noop,
        };
    }

    if help_open {
        return match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Msg::CloseModal,
            _ => Msg::Noop,
        };
    }

    match code {
        KeyCode::Char('q') => Msg::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Msg::Quit,

        KeyCode::Char('j') | KeyCode::Down => Msg::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Msg::MoveUp,
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageDown,
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => Msg::PageUp,
        KeyCode::Char('g') | KeyCode::Home => Msg::JumpToTop,
        KeyCode::Char('G') | KeyCode::End => Msg::JumpToBottom,
        KeyCode::PageDown => Msg::PageDown,
        KeyCode::PageUp => Msg::PageUp,

        KeyCode::Enter => Msg::RunSelected,
        KeyCode::Char('e') => Msg::StartEdit,
        KeyCode::Char('x') => Msg::ClearSelectedOverride,
        KeyCode::Char('t') => Msg::ToggleRunMode,
        KeyCode::Char('o') => Msg::OpenConfig,
        KeyCode::Char('r') => Msg::Refresh,
        KeyCode::Char('C') => Msg::ClearOverlay,

        KeyCode::Char('?') => Msg::ToggleHelp,
        KeyCode::Esc => Msg::CloseModal,

        _ => Msg::Noop,
    }
}

/// Mouse wheel scrolls the list; everything else is ignored
pub fn mouse_to_msg(event: MouseEvent) -> Msg {
    match event.kind {
        MouseEventKind::ScrollUp => Msg::MoveUp,
        MouseEventKind::ScrollDown => Msg::MoveDown,
        _ => Msg::Noop,
    }
}

//! TEA update function
//!
//! ```text
//! update : Msg -> Model -> (Model, Cmd)
//! ```
//!
//! Pure: no I/O and no mutation of anything but the returned model. Work
//! that touches the config file or the terminals comes back as a [`Cmd`]
//! for the runtime (app.rs) to execute.

use super::msg::Msg;
use super::state;
use crate::panel::{CommandRow, PanelMessage, PanelView};

/// Commands that need to be executed by the runtime (imperative shell)
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// No command
    None,
    /// Multiple commands to execute
    Batch(Vec<Cmd>),
    /// Quit the application
    Quit,
    /// Hand a message to the panel controller
    Panel(PanelMessage),
    /// Flash the "[Updated]" marker in the header
    ShowRefreshIndicator,
    /// Set status message
    SetStatus(String),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Cmd {
        let mut cmds: Vec<Cmd> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Cmd::None))
            .collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.pop().unwrap_or(Cmd::None),
            _ => Cmd::Batch(cmds),
        }
    }
}

/// An override being typed in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub name: String,
    pub buffer: String,
}

/// Panel state the update function works on
#[derive(Debug, Clone)]
pub struct Model {
    pub view: PanelView,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub visible_items: usize,

    pub editing: Option<EditState>,
    pub help_open: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            view: PanelView::default(),
            selected_index: 0,
            scroll_offset: 0,
            visible_items: 20,
            editing: None,
            help_open: false,
        }
    }
}

impl Model {
    pub fn with_view(view: PanelView) -> Self {
        Self {
            view,
            ..Default::default()
        }
    }

    pub fn item_count(&self) -> usize {
        self.view.rows.len()
    }

    pub fn selected_row(&self) -> Option<&CommandRow> {
        self.view.rows.get(self.selected_index)
    }

    fn select(self, index: usize) -> Self {
        let scroll_offset =
            state::calculate_scroll_offset(index, self.scroll_offset, self.visible_items);
        Model {
            selected_index: index,
            scroll_offset,
            ..self
        }
    }
}

/// Process one message, returning the new model and the work to do
pub fn update(msg: Msg, model: Model) -> (Model, Cmd) {
    match msg {
        // === Lifecycle ===
        Msg::Quit => (model, Cmd::Quit),

        Msg::Tick | Msg::Noop => (model, Cmd::None),

        Msg::Resize(_, height) => {
            let visible_items = state::visible_rows(height);
            let scroll_offset = state::calculate_scroll_offset(
                model.selected_index,
                model.scroll_offset,
                visible_items,
            );
            (
                Model {
                    visible_items,
                    scroll_offset,
                    ..model
                },
                Cmd::None,
            )
        }

        // === Navigation ===
        Msg::MoveUp => {
            let index = state::move_selection_up(model.selected_index);
            (model.select(index), Cmd::None)
        }

        Msg::MoveDown => {
            let index = state::move_selection_down(model.selected_index, model.item_count());
            (model.select(index), Cmd::None)
        }

        Msg::PageUp => {
            let index = state::page_up(model.selected_index, model.visible_items);
            (model.select(index), Cmd::None)
        }

        Msg::PageDown => {
            let index =
                state::page_down(model.selected_index, model.visible_items, model.item_count());
            (model.select(index), Cmd::None)
        }

        Msg::JumpToTop => (
            Model {
                selected_index: 0,
                scroll_offset: 0,
                ..model
            },
            Cmd::None,
        ),

        Msg::JumpToBottom => {
            let index = model.item_count().saturating_sub(1);
            (model.select(index), Cmd::None)
        }

        // === Commands ===
        Msg::RunSelected => match model.selected_row() {
            Some(row) => {
                let cmd = Cmd::Panel(PanelMessage::Run {
                    name: row.name.clone(),
                });
                (model, cmd)
            }
            None => (model, Cmd::SetStatus("No commands to run".to_string())),
        },

        Msg::StartEdit => match model.selected_row() {
            Some(row) => {
                let editing = EditState {
                    name: row.name.clone(),
                    buffer: row.overlay.clone().unwrap_or_default(),
                };
                (
                    Model {
                        editing: Some(editing),
                        ..model
                    },
                    Cmd::None,
                )
            }
            None => (model, Cmd::None),
        },

        Msg::EditInput(c) => {
            let editing = model.editing.clone().map(|mut e| {
                e.buffer.push(c);
                e
            });
            (Model { editing, ..model }, Cmd::None)
        }

        Msg::EditBackspace => {
            let editing = model.editing.clone().map(|mut e| {
                e.buffer.pop();
                e
            });
            (Model { editing, ..model }, Cmd::None)
        }

        Msg::EditConfirm => match model.editing.clone() {
            Some(EditState { name, buffer }) => (
                Model {
                    editing: None,
                    ..model
                },
                Cmd::Panel(PanelMessage::SetOverride {
                    name,
                    value: buffer,
                }),
            ),
            None => (model, Cmd::None),
        },

        Msg::EditCancel => (
            Model {
                editing: None,
                ..model
            },
            Cmd::None,
        ),

        Msg::ClearSelectedOverride => match model.selected_row() {
            Some(row) if row.is_overridden() => {
                let cmd = Cmd::Panel(PanelMessage::SetOverride {
                    name: row.name.clone(),
                    value: String::new(),
                });
                (model, cmd)
            }
            Some(row) => {
                let status = format!("{} has no temporary override", row.name);
                (model, Cmd::SetStatus(status))
            }
            None => (model, Cmd::None),
        },

        // === Settings ===
        Msg::ToggleRunMode => {
            let value = !model.view.run_in_current_terminal;
            (model, Cmd::Panel(PanelMessage::ToggleMode { value }))
        }

        Msg::OpenConfig => (model, Cmd::Panel(PanelMessage::OpenConfig)),

        Msg::ClearOverlay => (model, Cmd::Panel(PanelMessage::ClearOverlay)),

        // === Data ===
        Msg::Refresh => (model, Cmd::Panel(PanelMessage::Refresh)),

        Msg::ConfigChanged => (
            model,
            Cmd::batch(vec![
                Cmd::Panel(PanelMessage::Refresh),
                Cmd::ShowRefreshIndicator,
            ]),
        ),

        Msg::Rendered(view) => {
            let count = view.rows.len();
            // Keep the cursor on the same command when it survives the reload
            let index = model
                .selected_row()
                .and_then(|row| view.rows.iter().position(|r| r.name == row.name))
                .unwrap_or_else(|| state::clamp_selection(model.selected_index, count));
            let scroll_offset = state::calculate_scroll_offset(
                index,
                model.scroll_offset.min(index),
                model.visible_items,
            );
            (
                Model {
                    view,
                    selected_index: index,
                    scroll_offset,
                    ..model
                },
                Cmd::None,
            )
        }

        // === Modals ===
        Msg::ToggleHelp => (
            Model {
                help_open: !model.help_open,
                ..model
            },
            Cmd::None,
        ),

        Msg::CloseModal => (
            Model {
                help_open: false,
                ..model
            },
            Cmd::None,
        ),
    }
}

//! UI rendering for the TUI

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::App;
use super::state;
use crate::panel::{CommandRow, Notice};

/// Main draw function - orchestrates all rendering
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::vertical([
        Constraint::Length(1),                               // Header
        Constraint::Min(3),                                  // Commands
        Constraint::Length(state::OUTPUT_LINES as u16 + 2), // Output pane
        Constraint::Length(1),                               // Footer/status/edit line
    ])
    .split(area);

    draw_header(frame, app, main_layout[0]);
    draw_commands(frame, app, main_layout[1]);
    draw_output(frame, app, main_layout[2]);
    draw_footer(frame, app, main_layout[3]);

    if app.model.help_open {
        draw_help_overlay(frame, area);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let path = app
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no workspace".to_string());

    let refresh_indicator = if app.show_refresh_indicator {
        " [Updated]"
    } else {
        ""
    };

    let header_text = format!(
        " ClickCmds │ {} │ [{} commands] │ {}{}",
        path,
        app.model.item_count(),
        state::mode_label(app.model.view.run_in_current_terminal),
        refresh_indicator
    );

    let header =
        Paragraph::new(header_text).style(Style::default().bg(Color::Blue).fg(Color::White).bold());

    frame.render_widget(header, area);
}

fn draw_commands(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Commands ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let rows = &app.model.view.rows;
    if rows.is_empty() {
        let empty = Paragraph::new("No commands found in .cmmds (press o to edit)")
            .style(Style::default().fg(Color::DarkGray).italic())
            .alignment(Alignment::Center);
        frame.render_widget(empty, inner_area);
        return;
    }

    let name_width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    let command_width = (inner_area.width as usize).saturating_sub(name_width + 6);

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(app.model.scroll_offset)
        .take(inner_area.height as usize)
        .map(|(idx, row)| {
            let is_selected = idx == app.model.selected_index;
            let line = command_line(row, name_width, command_width, is_selected);
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(
        app.model
            .selected_index
            .saturating_sub(app.model.scroll_offset),
    ));

    frame.render_stateful_widget(List::new(items), inner_area, &mut list_state);
}

fn command_line(row: &CommandRow, name_width: usize, command_width: usize, selected: bool) -> Line<'static> {
    let marker = if row.is_overridden() {
        Span::styled(" ● ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("   ")
    };

    let name_style = if selected {
        Style::default().fg(Color::White).bold()
    } else {
        Style::default().fg(Color::Cyan)
    };

    let command_style = if row.is_overridden() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };

    Line::from(vec![
        marker,
        Span::styled(format!("{:<width$}", row.name, width = name_width), name_style),
        Span::raw("   "),
        Span::styled(state::truncate(&row.command, command_width), command_style),
    ])
}

fn draw_output(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.output_title {
        Some(name) => format!(" Output: {} ", name),
        None => " Output ".to_string(),
    };

    let lines: Vec<Line> = if app.output.is_empty() {
        vec![Line::styled(
            "Nothing has run yet",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        app.output.iter().map(|l| Line::raw(l.as_str())).collect()
    };

    let output = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(output, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(editing) = &app.model.editing {
        let prompt = Line::from(vec![
            Span::styled(
                format!(" Override {}: ", editing.name),
                Style::default().fg(Color::Yellow).bold(),
            ),
            Span::raw(editing.buffer.clone()),
            Span::styled("_", Style::default().rapid_blink()),
            Span::styled(
                "  (Enter save, Esc cancel, empty clears)",
                Style::default().fg(Color::Gray),
            ),
        ]);
        let footer = Paragraph::new(prompt).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(footer, area);
        return;
    }

    let keybinds = "Enter:run  e:override  x:clear  t:mode  o:open  r:refresh  C:clear all  ?:help  q:quit";

    let (text, style) = match &app.notice {
        Some(Notice::Info(msg)) => (msg.as_str(), Style::default().bg(Color::DarkGray).fg(Color::White)),
        Some(Notice::Warning(msg)) => (msg.as_str(), Style::default().bg(Color::Yellow).fg(Color::Black)),
        Some(Notice::Error(msg)) => (msg.as_str(), Style::default().bg(Color::Red).fg(Color::White)),
        None => (keybinds, Style::default().bg(Color::DarkGray).fg(Color::White)),
    };

    let footer = Paragraph::new(format!(" {}", text)).style(style);
    frame.render_widget(footer, area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    // Center the help popup
    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 24.min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: (area.width - popup_width) / 2,
        y: (area.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let help_text = r#"
  Commands
  ─────────────────────────────────
  j/k, ↑/↓     Move up/down
  g / G        Jump to top / bottom
  Ctrl+d/u     Page down/up
  Enter        Run selected command
  e            Edit temporary override
  x            Remove override of selection

  Settings
  ─────────────────────────────────
  t            Toggle current / new terminals
  o            Open .cmmds in $EDITOR
  r            Refresh from disk
  C            Clear all temporary settings

  ● marks a command with an override.
  The panel reloads when .cmmds changes.

  Press ? or Esc to close
"#;

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(help, popup_area);
}

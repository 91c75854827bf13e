//! Pure state transformations for the panel (functional core)
//!
//! Index arithmetic and text shaping only; no I/O. The imperative shell
//! (app.rs, events.rs) calls into these.

/// Rows taken by everything except the command list
/// (header, footer, output pane and the list's borders)
pub const CHROME_ROWS: u16 = 12;

/// Lines of session output kept for the output pane
pub const OUTPUT_LINES: usize = 6;

// =============================================================================
// Navigation
// =============================================================================

/// New selected index after moving up
pub fn move_selection_up(current: usize) -> usize {
    current.saturating_sub(1)
}

/// New selected index after moving down
pub fn move_selection_down(current: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        (current + 1).min(max - 1)
    }
}

/// New selected index after page down
pub fn page_down(current: usize, page_size: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        (current + page_size).min(max - 1)
    }
}

/// New selected index after page up
pub fn page_up(current: usize, page_size: usize) -> usize {
    current.saturating_sub(page_size)
}

/// Scroll offset that keeps the selection visible
pub fn calculate_scroll_offset(selected: usize, current_offset: usize, visible_items: usize) -> usize {
    if visible_items == 0 {
        return 0;
    }
    if selected < current_offset {
        selected
    } else if selected >= current_offset + visible_items {
        selected.saturating_sub(visible_items - 1)
    } else {
        current_offset
    }
}

/// Clamp a selection into `0..max`
pub fn clamp_selection(selected: usize, max: usize) -> usize {
    if max == 0 {
        0
    } else {
        selected.min(max - 1)
    }
}

/// How many command rows fit in a terminal `height` rows tall
pub fn visible_rows(height: u16) -> usize {
    usize::from(height.saturating_sub(CHROME_ROWS)).max(1)
}

// =============================================================================
// Text
// =============================================================================

/// Label for the run mode toggle
pub fn mode_label(run_in_current_terminal: bool) -> &'static str {
    if run_in_current_terminal {
        "Current Terminal"
    } else {
        "New Terminals"
    }
}

/// Last `n` lines of `text`
pub fn tail_lines(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|l| l.to_string()).collect()
}

/// Truncate with an ellipsis, counting chars rather than bytes
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let char_len = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(char_len).collect();
        format!("{}...", truncated)
    }
}

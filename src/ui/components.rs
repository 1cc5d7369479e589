//! Shared UI components (status bar, keybindings pane, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::collections::{BTreeMap, BTreeSet};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode};
use crate::store::NoticeLevel;

/// Render the bottom status bar: mode, counts, and the current notice if any.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let palette = app.palette();
    let state = app.store.state();

    if let Some(notice) = &state.notice {
        let fg = match notice.level {
            NoticeLevel::Success => palette.success,
            NoticeLevel::Error => palette.error,
        };
        let p = Paragraph::new(notice.message.clone()).style(
            Style::default()
                .fg(fg)
                .bg(palette.status_bg)
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(p, area);
        return;
    }

    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let theme = if state.theme.is_dark { "dark" } else { "light" };
    let msg = format!(
        "mode: {mode}  showing:{}/{}  page:{}/{}  theme:{theme}",
        app.visible_users().len(),
        state.users.users.len(),
        state.users.current_page,
        state.users.total_pages,
    );
    let p = Paragraph::new(msg).style(Style::default().fg(palette.status_fg).bg(palette.status_bg));
    f.render_widget(p, area);
}

fn action_label(action: KeyAction) -> Option<&'static str> {
    let label = match action {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "Search",
        KeyAction::ToggleSort => "Toggle sort",
        KeyAction::ToggleTheme => "Toggle theme",
        KeyAction::Logout => "Logout",
        KeyAction::EditSelection => "Edit user",
        KeyAction::DeleteSelection => "Delete user",
        KeyAction::Reload => "Reload page",
        KeyAction::MoveUp => "Move up",
        KeyAction::MoveDown => "Move down",
        KeyAction::PrevPage => "Previous page",
        KeyAction::NextPage => "Next page",
        KeyAction::ToggleKeybindsPane => "Toggle pane",
        KeyAction::Ignore => return None,
    };
    Some(label)
}

/// Render the right-side keybinds viewer, one row per action.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let palette = app.palette();
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let inner = block.inner(area);

    let mut grouped: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    for ((mods, code), action) in app.keymap.all_bindings() {
        if let Some(label) = action_label(action) {
            grouped.entry(label).or_default().insert(Keymap::format_key(mods, code));
        }
    }

    let col1_w = grouped.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        "Users screen:",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (label, keys) in grouped.iter() {
        let joined = keys.iter().cloned().collect::<Vec<_>>().join(", ");
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>width$} │ ", label, width = col1_w)),
            Span::styled(joined, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Dialogs:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::raw("  Tab/Up/Down move, Enter confirm, Esc cancel"));

    let p = Paragraph::new(lines)
        .style(Style::default().fg(palette.text))
        .wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::{AppState, EditField, EditForm, ModalState};

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let palette = app.palette();
    let state = app.store.state();
    let users = &state.users;

    let prev = if users.has_prev() { "◀ h" } else { "   " };
    let next = if users.has_next() { "l ▶" } else { "   " };
    let mut footer = format!("{prev}  Page {} of {}  {next}", users.current_page, users.total_pages);
    if users.loading {
        footer.push_str("  loading...");
    }
    let block = Block::default()
        .title(format!("Users ({} on page, {} total)", users.users.len(), users.total))
        .title_bottom(footer)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));

    // Stale rows stay visible under the error banner.
    let (banner, table_area) = match &users.error {
        Some(err) => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(1)].as_ref())
                .split(block.inner(area));
            (Some((format!("Error: {err}"), parts[0])), parts[1])
        }
        None => (None, block.inner(area)),
    };
    f.render_widget(block, area);
    if let Some((msg, rect)) = banner {
        f.render_widget(Paragraph::new(msg).style(Style::default().fg(palette.error)), rect);
    }

    let body_height = table_area.height.saturating_sub(1) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }
    let view = app.visible_users();
    if view.is_empty() {
        let msg = if app.store.state().users.loading {
            "Loading users..."
        } else if !app.search_query.is_empty() {
            "No users match the search"
        } else {
            "No users on this page"
        };
        f.render_widget(Paragraph::new(msg).style(Style::default().fg(palette.muted)), table_area);
        return;
    }

    let selected = app.selected_index.min(view.len() - 1);
    let start = (selected / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(view.len());
    let rows = view[start..end].iter().enumerate().map(|(i, u)| {
        let style = if start + i == selected {
            Style::default()
                .fg(palette.highlight_fg)
                .bg(palette.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text)
        };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.full_name()),
            Cell::from(u.email.clone()),
            Cell::from(u.avatar.clone()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(25),
        Constraint::Percentage(35),
        Constraint::Percentage(40),
    ];
    let header = Row::new(vec!["ID", "NAME", "EMAIL", "AVATAR"])
        .style(Style::default().fg(palette.title).add_modifier(Modifier::BOLD));

    let table = Table::new(rows, widths).header(header).column_spacing(1);
    f.render_widget(table, table_area);
}

pub fn render_user_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    match state {
        ModalState::EditUser(form) => render_edit_modal(f, area, app, form),
        ModalState::DeleteConfirm { id, name, selected } => {
            let palette = app.palette();
            let rect = crate::ui::components::centered_rect(50, 7, area);
            let yes = if *selected == 0 { "[Yes]" } else { " Yes " };
            let no = if *selected == 1 { "[No]" } else { " No  " };
            let body = format!("Delete user '{name}' (id {id})?\n\n  {yes}    {no}");
            let p = Paragraph::new(body).style(Style::default().fg(palette.text)).block(
                Block::default()
                    .title("Confirm delete")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
        }
    }
}

fn render_edit_modal(f: &mut Frame, area: Rect, app: &AppState, form: &EditForm) {
    let palette = app.palette();
    let rect = crate::ui::components::centered_rect(60, 11, area);
    let marker = |field: EditField| if form.focus == field { "▶" } else { " " };
    let button = |field: EditField, label: &str| {
        if form.focus == field { format!("[{label}]") } else { format!(" {label} ") }
    };

    let mut lines = vec![
        Line::raw(format!("{} First Name: {}", marker(EditField::FirstName), form.first_name)),
        Line::raw(format!("{} Last Name:  {}", marker(EditField::LastName), form.last_name)),
        Line::raw(format!("{} Email:      {}", marker(EditField::Email), form.email)),
        Line::raw(""),
        Line::raw(format!(
            "  {}   {}",
            button(EditField::Save, "Save Changes"),
            button(EditField::Cancel, "Cancel")
        )),
        Line::raw(""),
    ];
    match &form.error {
        Some(err) => lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(palette.error)))),
        None => lines.push(Line::from(Span::styled(
            "Tab/Up/Down: move  Enter: save  Esc: cancel",
            Style::default().fg(palette.muted),
        ))),
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(palette.text))
        .block(
            Block::default()
                .title(format!("Edit User #{}", form.id))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

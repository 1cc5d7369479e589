pub mod components;
pub mod login;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode};
use crate::store::Session;

pub fn render(f: &mut Frame, app: &mut AppState) {
    let palette = app.palette();
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().fg(palette.text).bg(palette.header_bg)),
        area,
    );

    // Only an authenticated session ever reaches the users screen.
    if let Session::Unauthenticated = app.store.state().session.session {
        login::render_login(f, area, app);
        return;
    }

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(area);

    let theme_hint = if app.store.state().theme.is_dark { "t: light" } else { "t: dark" };
    let prompt = match app.input_mode {
        InputMode::Search => format!("  Search: {}_", app.search_query),
        _ if !app.search_query.is_empty() => format!("  Search: {}", app.search_query),
        _ => String::new(),
    };
    let header = Paragraph::new(format!(
        "Users  sort:{}{prompt}  | /: search; s: sort; {theme_hint}; o: logout; K: keys; q: quit",
        app.sort_order.label()
    ))
    .block(
        Block::default()
            .title("usrdir-console")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border)),
    )
    .style(Style::default().fg(palette.header_fg).bg(palette.header_bg));
    f.render_widget(header, root[0]);

    if app.show_keybinds {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
            .split(root[1]);
        users::render_users_table(f, body[0], app);
        components::render_keybinds_panel(f, body[1], app);
    } else {
        users::render_users_table(f, root[1], app);
    }

    components::render_status_bar(f, root[2], app);

    if let Some(state) = app.modal.clone() {
        users::render_user_modal(f, area, app, &state);
    }
}

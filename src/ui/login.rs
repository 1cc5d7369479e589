use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::{AppState, LoginField};
use crate::ui::components::centered_rect;

pub fn render_login(f: &mut Frame, area: Rect, app: &AppState) {
    let palette = app.palette();
    let session = &app.store.state().session;
    let form = &app.login;
    let rect = centered_rect(56, 12, area);

    let marker = |field: LoginField| if form.focus == field { "▶" } else { " " };
    let password = if form.show_password {
        form.password.clone()
    } else {
        "*".repeat(form.password.chars().count())
    };
    let eye = if form.show_password { "hide" } else { "show" };

    let mut lines = vec![
        Line::from(Span::styled(
            "Sign in to your account",
            Style::default().fg(palette.title).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        Line::raw(format!("{} Email:    {}", marker(LoginField::Email), form.email)),
        Line::raw(format!("{} Password: {}", marker(LoginField::Password), password)),
        Line::raw(""),
    ];
    if let Some(err) = form.error.as_ref().or(session.error.as_ref()) {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(palette.error))));
    } else {
        lines.push(Line::raw(""));
    }
    let submit = if session.pending { "Signing in..." } else { "Enter: Sign in" };
    lines.push(Line::from(Span::styled(
        submit,
        Style::default().fg(palette.highlight_fg).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!("Tab: switch field  Ctrl+t: {eye} password  Esc: quit"),
        Style::default().fg(palette.muted),
    )));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(palette.text))
        .block(
            Block::default()
                .title("Login")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use super::intents::{Dispatcher, drain_completions};
use super::keymap::KeyAction;
use super::{AppState, EditField, InputMode, Intent, LoginField, ModalState};
use crate::store::Action;
use crate::ui;

/// Run the event loop until the user quits.
///
/// Each iteration handles at most one key, then applies every network
/// completion that has arrived, so store updates never interleave.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    dispatcher: &Dispatcher,
    completions: &mut UnboundedReceiver<Action>,
) -> Result<()> {
    let mut changes = app.store.subscribe();
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|f| ui::render(f, app)).context("draw frame")?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(100)).context("poll terminal events")? {
            match event::read().context("read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(intent) = handle_key(app, key) {
                        debug!(?intent, "intent");
                        dispatcher.execute(&mut app.store, intent);
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
        if app.should_quit {
            break;
        }

        settle_completions(app, dispatcher, completions);

        if changes.has_changed().unwrap_or(false) {
            changes.borrow_and_update();
            app.clamp_selection();
            dirty = true;
        }
    }

    Ok(())
}

/// Apply finished network work and the follow-ups it triggers.
///
/// Runs once per loop iteration, after key handling.
///
/// # Arguments
///
/// * `app` - Application state whose store receives the completions.
/// * `dispatcher` - Used for the follow-up intents.
/// * `completions` - Receiving end of the dispatcher's completion channel.
///
/// # Returns
///
/// The number of completions applied.
///
/// A session that becomes authenticated here immediately fetches the current
/// page, and a notice older than `app.notice_ttl` is dismissed.
pub fn settle_completions(
    app: &mut AppState,
    dispatcher: &Dispatcher,
    completions: &mut UnboundedReceiver<Action>,
) -> usize {
    let was_signed_in = app.store.state().session.session.is_authenticated();
    let applied = drain_completions(&mut app.store, completions);
    if !was_signed_in && app.store.state().session.session.is_authenticated() {
        let page = app.store.state().users.current_page;
        debug!(page, "signed in, loading first page");
        dispatcher.execute(&mut app.store, Intent::FetchPage(page));
    }

    let expired = app
        .store
        .state()
        .notice
        .as_ref()
        .is_some_and(|n| n.is_expired(app.notice_ttl));
    if expired {
        dispatcher.execute(&mut app.store, Intent::DismissNotice);
    }
    applied
}

/// Translate one key press into UI state changes and, possibly, an intent.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return None;
    }
    if !app.store.state().session.session.is_authenticated() {
        return handle_login_key(app, key);
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => {
            handle_search_key(app, key);
            None
        }
        InputMode::Modal => handle_modal_key(app, key),
    }
}

fn handle_login_key(app: &mut AppState, key: KeyEvent) -> Option<Intent> {
    let form = &mut app.login;
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            form.focus = match form.focus {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
        }
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.show_password = !form.show_password;
        }
        KeyCode::Enter => {
            if app.store.state().session.pending {
                return None;
            }
            match form.validate() {
                Ok(request) => {
                    form.error = None;
                    return Some(Intent::Login(request));
                }
                Err(msg) => form.error = Some(msg),
            }
        }
        KeyCode::Backspace => {
            form.focused_mut().pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.focused_mut().push(c);
            form.error = None;
        }
        _ => {}
    }
    None
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Option<Intent> {
    let action = app.keymap.resolve(&key)?;
    let users = &app.store.state().users;
    match action {
        KeyAction::Quit => app.should_quit = true,
        KeyAction::StartSearch => app.input_mode = InputMode::Search,
        KeyAction::ToggleSort => {
            app.sort_order = app.sort_order.toggle();
            app.selected_index = 0;
        }
        KeyAction::ToggleTheme => return Some(Intent::ToggleTheme),
        KeyAction::Logout => {
            app.modal = None;
            app.input_mode = InputMode::Normal;
            app.search_query.clear();
            app.selected_index = 0;
            app.login.password.clear();
            return Some(Intent::Logout);
        }
        KeyAction::EditSelection => {
            if let Some(user) = app.selected_user() {
                app.modal = Some(ModalState::EditUser(super::EditForm::from_user(user)));
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::DeleteSelection => {
            if let Some(user) = app.selected_user() {
                app.modal = Some(ModalState::DeleteConfirm {
                    id: user.id,
                    name: user.full_name(),
                    selected: 1,
                });
                app.input_mode = InputMode::Modal;
            }
        }
        KeyAction::Reload => return Some(Intent::FetchPage(users.target_page())),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < app.visible_users().len() {
                app.selected_index += 1;
            }
        }
        KeyAction::PrevPage => {
            if users.has_prev() {
                let target = users.target_page() - 1;
                app.selected_index = 0;
                return Some(Intent::FetchPage(target));
            }
        }
        KeyAction::NextPage => {
            if users.has_next() {
                let target = users.target_page() + 1;
                app.selected_index = 0;
                return Some(Intent::FetchPage(target));
            }
        }
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::Ignore => {
            if !app.search_query.is_empty() {
                app.search_query.clear();
                app.selected_index = 0;
            } else if app.store.state().notice.is_some() {
                return Some(Intent::DismissNotice);
            }
        }
    }
    None
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Up => {
            app.selected_index = app.selected_index.saturating_sub(1);
            return;
        }
        KeyCode::Down => {
            if app.selected_index + 1 < app.visible_users().len() {
                app.selected_index += 1;
            }
            return;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.search_query.push(c),
        _ => return,
    }
    app.selected_index = 0;
}

enum ModalOutcome {
    Stay,
    Close,
    Submit(Intent),
}

fn handle_modal_key(app: &mut AppState, key: KeyEvent) -> Option<Intent> {
    let outcome = match &mut app.modal {
        Some(ModalState::EditUser(form)) => match key.code {
            KeyCode::Esc => ModalOutcome::Close,
            KeyCode::Tab | KeyCode::Down => {
                form.focus = form.focus.next();
                ModalOutcome::Stay
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = form.focus.prev();
                ModalOutcome::Stay
            }
            KeyCode::Enter if form.focus == EditField::Cancel => ModalOutcome::Close,
            KeyCode::Enter => match form.validate() {
                Ok(update) => ModalOutcome::Submit(Intent::UpdateUser(update)),
                Err(msg) => {
                    form.error = Some(msg);
                    ModalOutcome::Stay
                }
            },
            KeyCode::Backspace => {
                if let Some(field) = form.focused_mut() {
                    field.pop();
                }
                ModalOutcome::Stay
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = form.focused_mut() {
                    field.push(c);
                    form.error = None;
                }
                ModalOutcome::Stay
            }
            _ => ModalOutcome::Stay,
        },
        Some(ModalState::DeleteConfirm { id, selected, .. }) => match key.code {
            KeyCode::Esc | KeyCode::Char('n') => ModalOutcome::Close,
            KeyCode::Char('y') => ModalOutcome::Submit(Intent::DeleteUser(*id)),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                *selected = 1 - (*selected).min(1);
                ModalOutcome::Stay
            }
            KeyCode::Enter if *selected == 0 => ModalOutcome::Submit(Intent::DeleteUser(*id)),
            KeyCode::Enter => ModalOutcome::Close,
            _ => ModalOutcome::Stay,
        },
        None => ModalOutcome::Close,
    };

    match outcome {
        ModalOutcome::Stay => None,
        ModalOutcome::Close => {
            close_modal(app);
            None
        }
        ModalOutcome::Submit(intent) => {
            close_modal(app);
            Some(intent)
        }
    }
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = InputMode::Normal;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Token, User, UserId, UserUpdate};
    use crate::app::LoginRequest;
    use crate::app::intents::testing::FakeDirectory;
    use crate::app::keymap::Keymap;
    use crate::config::Settings;
    use crate::store::{RootState, Session, SessionState, Store, UsersAction, UsersState};
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut AppState, s: &str) {
        for c in s.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    fn user(id: u32, first: &str, last: &str) -> User {
        User {
            id: UserId(id),
            email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            first_name: first.into(),
            last_name: last.into(),
            avatar: String::new(),
        }
    }

    fn signed_in_app(current_page: u32, total_pages: u32) -> AppState {
        let state = RootState {
            session: SessionState {
                session: Session::Authenticated {
                    token: Token::new("t"),
                },
                ..Default::default()
            },
            users: UsersState {
                users: vec![user(4, "Eve", "Holt"), user(5, "Bob", "Smith"), user(3, "Emma", "Wong")],
                current_page,
                total_pages,
                ..Default::default()
            },
            ..Default::default()
        };
        AppState::new(Store::with_state(state), Keymap::default(), &Settings::default())
    }

    #[test]
    fn login_form_submits_prefilled_email() {
        let mut app = AppState::new(Store::new(), Keymap::default(), &Settings::default());
        type_str(&mut app, "cityslicka");
        let intent = handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(
            intent,
            Some(Intent::Login(LoginRequest {
                email: "eve.holt@reqres.in".into(),
                password: "cityslicka".into(),
            }))
        );
    }

    #[test]
    fn login_requires_both_fields() {
        let mut app = AppState::new(Store::new(), Keymap::default(), &Settings::default());
        assert_eq!(handle_key(&mut app, press(KeyCode::Enter)), None);
        assert_eq!(app.login.error.as_deref(), Some("Password is required"));

        type_str(&mut app, "x");
        assert_eq!(app.login.error, None);
        app.login.email = "   ".into();
        assert_eq!(handle_key(&mut app, press(KeyCode::Enter)), None);
        assert_eq!(app.login.error.as_deref(), Some("Email is required"));
        assert!(!app.store.state().session.pending);
    }

    #[tokio::test]
    async fn first_page_loads_right_after_sign_in() {
        let (dispatcher, mut rx) = Dispatcher::new(Arc::new(FakeDirectory::default()), Handle::current());
        let mut app = AppState::new(Store::new(), Keymap::default(), &Settings::default());
        type_str(&mut app, "cityslicka");
        let intent = handle_key(&mut app, press(KeyCode::Enter)).expect("login intent");
        dispatcher.execute(&mut app.store, intent);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(settle_completions(&mut app, &dispatcher, &mut rx), 1);
        let state = app.store.state();
        assert!(state.session.session.is_authenticated());
        assert!(state.users.loading);
        assert_eq!(state.users.requested_page, Some(state.users.current_page));

        // already signed in: a second pass starts nothing new
        let seq = state.users.fetch_seq;
        settle_completions(&mut app, &dispatcher, &mut rx);
        assert_eq!(app.store.state().users.fetch_seq, seq);
    }

    #[tokio::test]
    async fn notices_expire_after_ttl() {
        let (dispatcher, mut rx) = Dispatcher::new(Arc::new(FakeDirectory::default()), Handle::current());
        let mut app = signed_in_app(1, 1);
        app.store.dispatch(UsersAction::UpdateFailed {
            message: "nope".into(),
        });
        settle_completions(&mut app, &dispatcher, &mut rx);
        assert!(app.store.state().notice.is_some());

        app.notice_ttl = std::time::Duration::ZERO;
        assert_eq!(settle_completions(&mut app, &dispatcher, &mut rx), 0);
        assert!(app.store.state().notice.is_none());
    }

    #[test]
    fn login_keys_do_not_reach_the_keymap() {
        let mut app = AppState::new(Store::new(), Keymap::default(), &Settings::default());
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.login.password, "q");
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL));
        assert!(app.login.show_password);
    }

    #[test]
    fn search_mode_filters_view() {
        let mut app = signed_in_app(1, 1);
        handle_key(&mut app, press(KeyCode::Char('/')));
        assert_eq!(app.input_mode, InputMode::Search);
        type_str(&mut app, "EVE");
        assert_eq!(app.visible_users().len(), 1);
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search_query, "EVE");
        handle_key(&mut app, press(KeyCode::Esc));
        assert_eq!(app.visible_users().len(), 3);
    }

    #[test]
    fn pagination_respects_bounds() {
        let mut app = signed_in_app(1, 2);
        assert_eq!(handle_key(&mut app, press(KeyCode::Left)), None);
        assert_eq!(handle_key(&mut app, press(KeyCode::Right)), Some(Intent::FetchPage(2)));

        let mut last = signed_in_app(2, 2);
        assert_eq!(handle_key(&mut last, press(KeyCode::Right)), None);
        assert_eq!(handle_key(&mut last, press(KeyCode::Char('r'))), Some(Intent::FetchPage(2)));
    }

    #[test]
    fn edit_dialog_submits_update() {
        let mut app = signed_in_app(1, 1);
        // sorted view: Bob Smith, Emma Wong, Eve Holt
        handle_key(&mut app, press(KeyCode::Down));
        handle_key(&mut app, press(KeyCode::Char('e')));
        assert_eq!(app.input_mode, InputMode::Modal);
        handle_key(&mut app, press(KeyCode::Tab));
        for _ in 0.."Wong".len() {
            handle_key(&mut app, press(KeyCode::Backspace));
        }
        type_str(&mut app, "Lee");
        let intent = handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(
            intent,
            Some(Intent::UpdateUser(UserUpdate {
                id: UserId(3),
                first_name: "Emma".into(),
                last_name: "Lee".into(),
                email: "emma.wong@reqres.in".into(),
            }))
        );
        assert!(app.modal.is_none());
    }

    #[test]
    fn edit_dialog_rejects_bad_email() {
        let mut app = signed_in_app(1, 1);
        handle_key(&mut app, press(KeyCode::Enter));
        if let Some(ModalState::EditUser(form)) = &mut app.modal {
            form.email = "nope".into();
        }
        assert_eq!(handle_key(&mut app, press(KeyCode::Enter)), None);
        match &app.modal {
            Some(ModalState::EditUser(form)) => assert!(form.error.is_some()),
            other => panic!("dialog closed unexpectedly: {other:?}"),
        }
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = signed_in_app(1, 1);
        handle_key(&mut app, press(KeyCode::Char('d')));
        // defaults to "No"
        assert_eq!(handle_key(&mut app, press(KeyCode::Enter)), None);
        assert!(app.modal.is_none());

        handle_key(&mut app, press(KeyCode::Char('d')));
        handle_key(&mut app, press(KeyCode::Left));
        assert_eq!(handle_key(&mut app, press(KeyCode::Enter)), Some(Intent::DeleteUser(UserId(5))));
    }

    #[test]
    fn logout_resets_view_state() {
        let mut app = signed_in_app(1, 1);
        app.search_query = "eve".into();
        app.login.password = "cityslicka".into();
        assert_eq!(handle_key(&mut app, press(KeyCode::Char('o'))), Some(Intent::Logout));
        assert!(app.search_query.is_empty());
        assert!(app.login.password.is_empty());
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut app = signed_in_app(1, 1);
        app.input_mode = InputMode::Search;
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }
}

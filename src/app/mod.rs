//! Application state types and entry glue.
//!
//! [`AppState`] holds the store plus the purely presentational state (search
//! query, sort order, selection, open dialog, login form). Key handling lives
//! in [`update`], and the side effects of user intents live in [`intents`].
//!
pub mod intents;
pub mod keymap;
pub mod update;

use ratatui::style::Color;
use std::time::Duration;

use crate::api::{Credentials, User, UserId, UserUpdate};
use crate::config::Settings;
use crate::search::{self, SortOrder};
use crate::store::Store;
use keymap::Keymap;

/// Current input mode for key handling on the users screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Something the user asked for that touches the store or the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Login(LoginRequest),
    Logout,
    FetchPage(u32),
    UpdateUser(UserUpdate),
    DeleteUser(UserId),
    ToggleTheme,
    DismissNotice,
}

/// Login form submission. Kept separate from [`Credentials`] so intents stay comparable.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).finish_non_exhaustive()
    }
}

impl From<LoginRequest> for Credentials {
    fn from(r: LoginRequest) -> Self {
        Credentials {
            email: r.email,
            password: r.password,
        }
    }
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub success: Color,
}

impl Palette {
    /// Catppuccin Mocha.
    pub fn dark() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
        }
    }

    /// Catppuccin Latte.
    pub fn light() -> Self {
        Self {
            text: Color::Rgb(0x4c, 0x4f, 0x69),         // text
            muted: Color::Rgb(0x8c, 0x8f, 0xa1),        // overlay1
            title: Color::Rgb(0x88, 0x39, 0xef),        // mauve
            border: Color::Rgb(0xac, 0xb0, 0xbe),       // surface2
            header_bg: Color::Rgb(0xcc, 0xd0, 0xda),    // surface0
            header_fg: Color::Rgb(0x72, 0x87, 0xfd),    // lavender
            status_bg: Color::Rgb(0xbc, 0xc0, 0xcc),    // surface1
            status_fg: Color::Rgb(0x4c, 0x4f, 0x69),    // text
            highlight_fg: Color::Rgb(0xdf, 0x8e, 0x1d), // yellow
            highlight_bg: Color::Rgb(0xe6, 0xe9, 0xef), // mantle
            error: Color::Rgb(0xd2, 0x0f, 0x39),        // red
            success: Color::Rgb(0x40, 0xa0, 0x2b),      // green
        }
    }

    pub fn for_mode(is_dark: bool) -> Self {
        if is_dark { Self::dark() } else { Self::light() }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Clone, Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub show_password: bool,
    /// Local validation message; server rejections live in the session slice.
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: String::new(),
            focus: LoginField::Password,
            show_password: false,
            error: None,
        }
    }

    /// Check that both fields are filled in before anything is sent.
    ///
    /// # Returns
    ///
    /// The request to submit (email trimmed, password verbatim), or a message
    /// naming the first empty field.
    pub fn validate(&self) -> Result<LoginRequest, String> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err("Email is required".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

/// Focusable rows of the edit dialog, top to bottom.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditField {
    FirstName,
    LastName,
    Email,
    Save,
    Cancel,
}

impl EditField {
    const ORDER: [EditField; 5] = [
        EditField::FirstName,
        EditField::LastName,
        EditField::Email,
        EditField::Save,
        EditField::Cancel,
    ];

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditForm {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub focus: EditField,
    pub error: Option<String>,
}

impl EditForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            focus: EditField::FirstName,
            error: None,
        }
    }

    pub fn focused_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            EditField::FirstName => Some(&mut self.first_name),
            EditField::LastName => Some(&mut self.last_name),
            EditField::Email => Some(&mut self.email),
            EditField::Save | EditField::Cancel => None,
        }
    }

    /// Required fields must be non-empty and the email must look like one.
    pub fn validate(&self) -> Result<UserUpdate, String> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        let email = self.email.trim();
        if first.is_empty() || last.is_empty() || email.is_empty() {
            return Err("All fields are required".to_string());
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err("Enter a valid email address".to_string()),
        }
        Ok(UserUpdate {
            id: self.id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
        })
    }
}

/// Dialogs drawn over the users screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    EditUser(EditForm),
    DeleteConfirm {
        id: UserId,
        name: String,
        /// 0 = Yes, 1 = No
        selected: usize,
    },
}

pub struct AppState {
    pub store: Store,
    pub keymap: Keymap,
    pub login: LoginForm,
    pub input_mode: InputMode,
    pub search_query: String,
    pub sort_order: SortOrder,
    /// Index into the filtered-and-sorted view, not into the store.
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub modal: Option<ModalState>,
    pub show_keybinds: bool,
    pub notice_ttl: Duration,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(store: Store, keymap: Keymap, settings: &Settings) -> Self {
        Self {
            store,
            keymap,
            login: LoginForm::new(settings.login_email.clone()),
            input_mode: InputMode::Normal,
            search_query: String::new(),
            sort_order: SortOrder::default(),
            selected_index: 0,
            rows_per_page: 10,
            modal: None,
            show_keybinds: false,
            notice_ttl: settings.notice_ttl,
            should_quit: false,
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.store.state().theme.is_dark)
    }

    pub fn visible_users(&self) -> Vec<&User> {
        search::visible_users(&self.store.state().users.users, &self.search_query, self.sort_order)
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.visible_users().get(self.selected_index).copied()
    }

    /// Keep the selection inside the current view.
    pub fn clamp_selection(&mut self) {
        let len = self.visible_users().len();
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RootState, UsersState};

    fn user(id: u32, first: &str, last: &str) -> User {
        User {
            id: UserId(id),
            email: format!("{}@reqres.in", first.to_lowercase()),
            first_name: first.into(),
            last_name: last.into(),
            avatar: String::new(),
        }
    }

    #[test]
    fn palette_follows_theme_flag() {
        let mut app = AppState::new(Store::new(), Keymap::default(), &Settings::default());
        assert_eq!(app.palette(), Palette::dark());
        app.store.dispatch(crate::store::ThemeAction::Toggle);
        assert_eq!(app.palette(), Palette::light());
    }

    #[test]
    fn selection_indexes_the_sorted_view() {
        let state = RootState {
            users: UsersState {
                users: vec![user(1, "Zed", "Z"), user(2, "Amy", "A")],
                ..Default::default()
            },
            ..Default::default()
        };
        let mut app = AppState::new(Store::with_state(state), Keymap::default(), &Settings::default());
        assert_eq!(app.selected_user().map(|u| u.id), Some(UserId(2)));
        app.selected_index = 5;
        app.clamp_selection();
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn edit_form_validation() {
        let mut form = EditForm::from_user(&user(3, "Emma", "Wong"));
        assert!(form.validate().is_ok());
        form.email = "emma".into();
        assert_eq!(form.validate().unwrap_err(), "Enter a valid email address");
        form.email = "emma@reqres.in".into();
        form.last_name = "  ".into();
        assert_eq!(form.validate().unwrap_err(), "All fields are required");
    }

    #[test]
    fn edit_focus_cycles() {
        assert_eq!(EditField::Cancel.next(), EditField::FirstName);
        assert_eq!(EditField::FirstName.prev(), EditField::Cancel);
    }
}

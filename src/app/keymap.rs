//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only the users screen goes through the keymap. Text entry (login form,
//! search prompt, edit dialog) reads raw keys so that every character can be
//! typed.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::path::Path;

/// Semantic keyboard actions on the users screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the search prompt.
    StartSearch,
    /// Flip between A-Z and Z-A.
    ToggleSort,
    /// Flip between dark and light palettes.
    ToggleTheme,
    /// Drop the session and return to the login screen.
    Logout,
    /// Open the edit dialog for the selected user.
    EditSelection,
    /// Ask to delete the selected user.
    DeleteSelection,
    /// Fetch the current page again.
    Reload,
    MoveUp,
    MoveDown,
    /// Request the previous server page.
    PrevPage,
    /// Request the next server page.
    NextPage,
    /// Show or hide the keybindings pane on the right.
    ToggleKeybindsPane,
    /// Swallow the key.
    Ignore,
}

/// Maps `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Default bindings: arrows plus vim-style hjkl, single letters for commands.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('s')), KeyAction::ToggleSort);
        bindings.insert((M::NONE, Char('t')), KeyAction::ToggleTheme);
        bindings.insert((M::NONE, Char('o')), KeyAction::Logout);
        bindings.insert((M::NONE, Enter), KeyAction::EditSelection);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditSelection);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('r')), KeyAction::Reload);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Left), KeyAction::PrevPage);
        bindings.insert((M::NONE, Right), KeyAction::NextPage);
        bindings.insert((M::NONE, PageUp), KeyAction::PrevPage);
        bindings.insert((M::NONE, PageDown), KeyAction::NextPage);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::PrevPage);
        bindings.insert((M::NONE, Char('l')), KeyAction::NextPage);

        // Terminals disagree on whether Shift is reported alongside 'K'
        bindings.insert((M::SHIFT, Char('K')), KeyAction::ToggleKeybindsPane);
        bindings.insert((M::NONE, Char('K')), KeyAction::ToggleKeybindsPane);

        Self { bindings }
    }

    /// Load the keymap from `path`, creating it with defaults when missing.
    ///
    /// A file that exists but cannot be read falls back to the defaults. When
    /// the file is missing, the defaults are written there (parent directories
    /// included) so the user has something to edit; a failed write is only
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Resolved location of `keybinds.conf`, see `Settings::keybinds`.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default keybinds");
        }
        km
    }

    /// Load a keymap from a configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the keymap configuration file.
    ///
    /// # Returns
    ///
    /// `Some(keymap)` if the file exists and is readable; `None` otherwise.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Parse `<Action> = <KeySpec>` lines on top of the defaults.
    ///
    /// Blank lines, `#` comments and lines naming an unknown action or key are
    /// skipped, so a partly broken file still yields a usable keymap. A key
    /// bound twice keeps its last action.
    ///
    /// # Arguments
    ///
    /// * `contents` - Full text of a keybinds file.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    /// Write the keymap to disk as a commented `keybinds.conf`.
    ///
    /// Shift variants are omitted because `parse_key` has no syntax for them;
    /// rows are ordered by action, then key.
    ///
    /// # Arguments
    ///
    /// * `path` - Destination; missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Any I/O error from creating the directory or writing the file.
    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrdir-console keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Delete, /, j, k, h, l\n");
        buf.push_str("# Actions: Quit, StartSearch, ToggleSort, ToggleTheme, Logout, EditSelection, DeleteSelection, Reload, MoveUp, MoveDown, PrevPage, NextPage, ToggleKeybindsPane, Ignore\n\n");

        let mut rows: Vec<(String, KeyAction)> = self
            .bindings
            .iter()
            .filter(|((mods, _), _)| !mods.contains(KeyModifiers::SHIFT))
            .map(|((mods, code), action)| (Self::format_key(*mods, *code), *action))
            .collect();
        rows.sort_by(|a, b| format_action(a.1).cmp(format_action(b.1)).then(a.0.cmp(&b.0)));
        for (key, action) in rows {
            let _ = writeln!(&mut buf, "{} = {}", format_action(action), key);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, buf)
    }

    /// Resolve a key event to an action.
    ///
    /// # Arguments
    ///
    /// * `key` - The key press, matched on its exact modifiers and code.
    ///
    /// # Returns
    ///
    /// The bound action, or `None` for unbound keys.
    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Every binding in arbitrary order, for the keybinds pane.
    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Human-readable key spec such as "Ctrl+q" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    match s.trim() {
        "Quit" => Some(KeyAction::Quit),
        "StartSearch" => Some(KeyAction::StartSearch),
        "ToggleSort" => Some(KeyAction::ToggleSort),
        "ToggleTheme" => Some(KeyAction::ToggleTheme),
        "Logout" => Some(KeyAction::Logout),
        "EditSelection" => Some(KeyAction::EditSelection),
        "DeleteSelection" => Some(KeyAction::DeleteSelection),
        "Reload" => Some(KeyAction::Reload),
        "MoveUp" => Some(KeyAction::MoveUp),
        "MoveDown" => Some(KeyAction::MoveDown),
        "PrevPage" => Some(KeyAction::PrevPage),
        "NextPage" => Some(KeyAction::NextPage),
        "ToggleKeybindsPane" => Some(KeyAction::ToggleKeybindsPane),
        "Ignore" => Some(KeyAction::Ignore),
        _ => None,
    }
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::ToggleSort => "ToggleSort",
        KeyAction::ToggleTheme => "ToggleTheme",
        KeyAction::Logout => "Logout",
        KeyAction::EditSelection => "EditSelection",
        KeyAction::DeleteSelection => "DeleteSelection",
        KeyAction::Reload => "Reload",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PrevPage => "PrevPage",
        KeyAction::NextPage => "NextPage",
        KeyAction::ToggleKeybindsPane => "ToggleKeybindsPane",
        KeyAction::Ignore => "Ignore",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(mods: KeyModifiers, code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, mods)
    }

    #[test]
    fn defaults_cover_arrows_and_vim_keys() {
        let km = Keymap::default();
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('j'))), Some(KeyAction::MoveDown));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Right)), Some(KeyAction::NextPage));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('t'))), Some(KeyAction::ToggleTheme));
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('z'))), None);
    }

    #[test]
    fn parse_overrides_defaults_and_ignores_garbage() {
        let km = Keymap::parse("# mine\nToggleTheme = Ctrl+t\nFly = x\nQuit = NotAKey\nno equals\n");
        assert_eq!(
            km.resolve(&key(KeyModifiers::CONTROL, KeyCode::Char('t'))),
            Some(KeyAction::ToggleTheme)
        );
        assert_eq!(km.resolve(&key(KeyModifiers::NONE, KeyCode::Char('q'))), Some(KeyAction::Quit));
    }

    #[test]
    fn written_file_reloads_to_same_bindings() {
        let mut path = std::env::temp_dir();
        path.push(format!("usrdir_keybinds_{}.conf", std::process::id()));
        let km = Keymap::default();
        km.write_file(&path).unwrap();
        let reloaded = Keymap::from_file(&path).unwrap();
        for ((mods, code), action) in km.all_bindings() {
            if mods.contains(KeyModifiers::SHIFT) {
                continue;
            }
            assert_eq!(reloaded.resolve(&key(mods, code)), Some(action));
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn format_key_names_control_combos() {
        assert_eq!(Keymap::format_key(KeyModifiers::CONTROL, KeyCode::Char('q')), "Ctrl+q");
        assert_eq!(Keymap::format_key(KeyModifiers::NONE, KeyCode::PageDown), "PageDown");
    }
}

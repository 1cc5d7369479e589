/// Display mode flag. Lives for the process only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeState {
    pub is_dark: bool,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self { is_dark: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeAction {
    Toggle,
}

impl ThemeState {
    pub fn reduce(&mut self, action: ThemeAction) {
        match action {
            ThemeAction::Toggle => self.is_dark = !self.is_dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_flag() {
        let mut t = ThemeState::default();
        assert!(t.is_dark);
        t.reduce(ThemeAction::Toggle);
        assert!(!t.is_dark);
        t.reduce(ThemeAction::Toggle);
        assert!(t.is_dark);
    }
}

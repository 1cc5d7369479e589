//! Client-side state container.
//!
//! [`Store`] owns the [`RootState`] (session, users, theme slices plus the
//! current notice) and is the only place state changes. Every change goes
//! through [`Store::dispatch`], which applies one [`Action`] to completion and
//! bumps a revision that subscribers observe through a `watch` channel.
pub mod session;
pub mod theme;
pub mod users;

use std::time::{Duration, Instant};
use tokio::sync::watch;

pub use session::{Session, SessionAction, SessionState};
pub use theme::{ThemeAction, ThemeState};
pub use users::{DeletedUser, UsersAction, UsersState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown in the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            raised_at: Instant::now(),
        }
    }

    /// Whether the notice has been visible for at least `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.raised_at.elapsed() >= ttl
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootState {
    pub session: SessionState,
    pub users: UsersState,
    pub theme: ThemeState,
    pub notice: Option<Notice>,
}

/// Everything that can change [`RootState`], grouped by slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Session(SessionAction),
    Users(UsersAction),
    Theme(ThemeAction),
    DismissNotice,
}

impl From<SessionAction> for Action {
    fn from(a: SessionAction) -> Self {
        Action::Session(a)
    }
}

impl From<UsersAction> for Action {
    fn from(a: UsersAction) -> Self {
        Action::Users(a)
    }
}

impl From<ThemeAction> for Action {
    fn from(a: ThemeAction) -> Self {
        Action::Theme(a)
    }
}

pub struct Store {
    state: RootState,
    revision: watch::Sender<u64>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(RootState::default())
    }

    /// Build a store around an existing state, e.g. a signed-in fixture.
    pub fn with_state(state: RootState) -> Self {
        let (revision, _) = watch::channel(0);
        Self { state, revision }
    }

    pub fn state(&self) -> &RootState {
        &self.state
    }

    /// Apply one action synchronously and notify subscribers.
    ///
    /// Reducers run to completion before this returns, so two dispatches never
    /// interleave. A users reducer that reports an outcome replaces the current
    /// notice. The revision is bumped even when the action turned out to be a
    /// no-op (for instance a stale page), which only costs a redraw.
    ///
    /// # Arguments
    ///
    /// * `action` - An [`Action`] or any slice action convertible into one.
    pub fn dispatch(&mut self, action: impl Into<Action>) {
        match action.into() {
            Action::Session(a) => self.state.session.reduce(a),
            Action::Users(a) => {
                if let Some(notice) = self.state.users.reduce(a) {
                    self.state.notice = Some(notice);
                }
            }
            Action::Theme(a) => self.state.theme.reduce(a),
            Action::DismissNotice => self.state.notice = None,
        }
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    /// Receiver that is marked changed after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of dispatches so far (wrapping).
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

//! Session slice: who is signed in, and the state of the login request.

use tracing::debug;

use crate::api::Token;

/// Authentication state; the users screen only exists on the `Authenticated` arm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated { token: Token },
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    /// Token of the signed-in session, if any.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Session::Authenticated { token } => Some(token),
            Session::Unauthenticated => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session: Session,
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    LoginStarted,
    LoginSucceeded(Token),
    LoginFailed(String),
    Logout,
}

impl SessionState {
    /// Apply a session action.
    ///
    /// `LoginSucceeded` only takes effect while a login is pending, so a
    /// response that lands after `Logout` cannot sign the user back in.
    /// `LoginFailed` keeps the server's message verbatim for the login form.
    ///
    /// # Arguments
    ///
    /// * `action` - The action to apply.
    pub fn reduce(&mut self, action: SessionAction) {
        match action {
            SessionAction::LoginStarted => {
                self.pending = true;
                self.error = None;
            }
            SessionAction::LoginSucceeded(token) => {
                if !self.pending {
                    // Logged out (or never asked) while the request was in flight.
                    debug!("ignoring login response without a pending login");
                    return;
                }
                self.session = Session::Authenticated { token };
                self.pending = false;
                self.error = None;
            }
            SessionAction::LoginFailed(message) => {
                self.session = Session::Unauthenticated;
                self.pending = false;
                self.error = Some(message);
            }
            SessionAction::Logout => {
                self.session = Session::Unauthenticated;
                self.pending = false;
            }
        }
    }
}

//! Side effects of user intents.
//!
//! The dispatcher applies the synchronous part of an intent to the store right
//! away (pending flags, optimistic removal) and spawns the network call on the
//! tokio runtime. A spawned task never touches the store: it sends exactly one
//! completion [`Action`] back over the channel, and the event loop applies it.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use super::Intent;
use crate::api::{Credentials, Directory};
use crate::store::{Action, SessionAction, Store, ThemeAction, UsersAction};

pub struct Dispatcher {
    directory: Arc<dyn Directory>,
    runtime: Handle,
    completions: UnboundedSender<Action>,
}

impl Dispatcher {
    /// Build a dispatcher and the receiving end of its completion channel.
    pub fn new(directory: Arc<dyn Directory>, runtime: Handle) -> (Self, UnboundedReceiver<Action>) {
        let (completions, rx) = mpsc::unbounded_channel();
        (
            Self {
                directory,
                runtime,
                completions,
            },
            rx,
        )
    }

    /// Carry out an intent.
    ///
    /// The synchronous part (pending flags, `FetchStarted`, optimistic delete,
    /// theme and notice changes) is dispatched before this returns. Network work
    /// is spawned and reports back through the completion channel.
    ///
    /// # Arguments
    ///
    /// * `store` - Store receiving the immediate actions.
    /// * `intent` - What the user asked for.
    pub fn execute(&self, store: &mut Store, intent: Intent) {
        match intent {
            Intent::Login(request) => self.login(store, request.into()),
            Intent::Logout => {
                info!("logout");
                store.dispatch(SessionAction::Logout);
            }
            Intent::FetchPage(page) => self.fetch_page(store, page),
            Intent::UpdateUser(update) => {
                let token = store.state().session.session.token().cloned();
                let directory = Arc::clone(&self.directory);
                self.spawn(async move {
                    match directory.update_user(&update, token.as_ref()).await {
                        Ok(patch) => UsersAction::UpdateSucceeded { update, patch }.into(),
                        Err(e) => {
                            warn!(id = %update.id, error = %e, "update failed");
                            UsersAction::UpdateFailed { message: e.to_string() }.into()
                        }
                    }
                });
            }
            Intent::DeleteUser(id) => {
                store.dispatch(UsersAction::DeleteStarted { id });
                let token = store.state().session.session.token().cloned();
                let directory = Arc::clone(&self.directory);
                self.spawn(async move {
                    match directory.delete_user(id, token.as_ref()).await {
                        Ok(()) => UsersAction::DeleteConfirmed { id }.into(),
                        Err(e) => {
                            warn!(%id, error = %e, "delete failed, restoring user");
                            UsersAction::DeleteFailed { id, message: e.to_string() }.into()
                        }
                    }
                });
            }
            Intent::ToggleTheme => store.dispatch(ThemeAction::Toggle),
            Intent::DismissNotice => store.dispatch(Action::DismissNotice),
        }
    }

    fn login(&self, store: &mut Store, credentials: Credentials) {
        store.dispatch(SessionAction::LoginStarted);
        let directory = Arc::clone(&self.directory);
        self.spawn(async move {
            match directory.login(&credentials).await {
                Ok(token) => {
                    info!(email = %credentials.email, "signed in");
                    SessionAction::LoginSucceeded(token).into()
                }
                Err(e) => SessionAction::LoginFailed(e.to_string()).into(),
            }
        });
    }

    fn fetch_page(&self, store: &mut Store, page: u32) {
        store.dispatch(UsersAction::FetchStarted { page });
        let request = store.state().users.fetch_seq;
        let token = store.state().session.session.token().cloned();
        let directory = Arc::clone(&self.directory);
        self.spawn(async move {
            match directory.fetch_users(page, token.as_ref()).await {
                Ok(data) => UsersAction::FetchSucceeded { request, page: data }.into(),
                Err(e) => {
                    warn!(page, request, error = %e, "fetch failed");
                    UsersAction::FetchFailed {
                        request,
                        page,
                        message: e.to_string(),
                    }
                    .into()
                }
            }
        });
    }

    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = Action> + Send + 'static,
    {
        let tx = self.completions.clone();
        self.runtime.spawn(async move {
            let action = work.await;
            // The receiver only goes away when the UI is shutting down.
            let _ = tx.send(action);
        });
    }
}

/// Apply every completion that has arrived so far; returns how many were applied.
pub fn drain_completions(store: &mut Store, rx: &mut UnboundedReceiver<Action>) -> usize {
    let mut applied = 0;
    while let Ok(action) = rx.try_recv() {
        store.dispatch(action);
        applied += 1;
    }
    applied
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::api::{Credentials, Directory, Token, User, UserId, UserPage, UserPatch, UserUpdate};
    use crate::error::{ConsoleError, Result};
    use async_trait::async_trait;
    use std::time::Duration;

    /// In-memory directory; page 1 answers slowly to provoke out-of-order completions.
    #[derive(Default)]
    pub(crate) struct FakeDirectory {
        pub(crate) fail_delete: bool,
    }

    pub(crate) fn user(id: u32) -> User {
        User {
            id: UserId(id),
            email: format!("user{id}@reqres.in"),
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            avatar: String::new(),
        }
    }

    #[async_trait]
    impl Directory for FakeDirectory {
        async fn login(&self, credentials: &Credentials) -> Result<Token> {
            if credentials.password.is_empty() {
                return Err(ConsoleError::LoginRejected {
                    status: 400,
                    message: "Missing password".into(),
                });
            }
            Ok(Token::new("QpwL5tke4Pnpja7X4"))
        }

        async fn fetch_users(&self, page: u32, _auth: Option<&Token>) -> Result<UserPage> {
            if page == 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(UserPage {
                page,
                per_page: 1,
                total: 2,
                total_pages: 2,
                data: vec![user(page * 10)],
            })
        }

        async fn update_user(&self, _update: &UserUpdate, _auth: Option<&Token>) -> Result<UserPatch> {
            Ok(UserPatch::default())
        }

        async fn delete_user(&self, _id: UserId, _auth: Option<&Token>) -> Result<()> {
            if self.fail_delete {
                Err(ConsoleError::Status {
                    status: 500,
                    message: "Internal Server Error".into(),
                })
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeDirectory;
    use super::*;
    use crate::api::UserId;
    use crate::app::LoginRequest;
    use std::time::Duration;

    fn dispatcher(fail_delete: bool) -> (Dispatcher, UnboundedReceiver<Action>) {
        Dispatcher::new(Arc::new(FakeDirectory { fail_delete }), Handle::current())
    }

    async fn apply_next(store: &mut Store, rx: &mut UnboundedReceiver<Action>) {
        let action = rx.recv().await.expect("completion");
        store.dispatch(action);
    }

    #[tokio::test]
    async fn rapid_pagination_settles_on_last_intent() {
        let (d, mut rx) = dispatcher(false);
        let mut store = Store::new();
        d.execute(&mut store, Intent::FetchPage(1));
        d.execute(&mut store, Intent::FetchPage(2));
        // page 2 resolves first, slow page 1 last
        apply_next(&mut store, &mut rx).await;
        apply_next(&mut store, &mut rx).await;
        let users = &store.state().users;
        assert_eq!(users.current_page, 2);
        assert_eq!(users.users[0].id, UserId(20));
        assert!(!users.loading);
    }

    #[tokio::test]
    async fn returning_to_a_page_settles_on_the_newest_request() {
        let (d, mut rx) = dispatcher(false);
        let mut store = Store::new();
        d.execute(&mut store, Intent::FetchPage(1));
        d.execute(&mut store, Intent::FetchPage(2));
        d.execute(&mut store, Intent::FetchPage(1));
        for _ in 0..3 {
            apply_next(&mut store, &mut rx).await;
        }
        let users = &store.state().users;
        assert_eq!(users.current_page, 1);
        assert_eq!(users.users[0].id, UserId(10));
        assert!(!users.loading);
        assert_eq!(users.requested_page, None);
    }

    #[tokio::test]
    async fn login_round_trip() {
        let (d, mut rx) = dispatcher(false);
        let mut store = Store::new();
        d.execute(
            &mut store,
            Intent::Login(LoginRequest {
                email: "eve.holt@reqres.in".into(),
                password: String::new(),
            }),
        );
        assert!(store.state().session.pending);
        apply_next(&mut store, &mut rx).await;
        assert_eq!(store.state().session.error.as_deref(), Some("Missing password"));

        d.execute(
            &mut store,
            Intent::Login(LoginRequest {
                email: "eve.holt@reqres.in".into(),
                password: "cityslicka".into(),
            }),
        );
        apply_next(&mut store, &mut rx).await;
        assert!(store.state().session.session.is_authenticated());
        assert_eq!(store.state().session.error, None);
    }

    #[tokio::test]
    async fn delete_is_optimistic_and_rolls_back() {
        let (d, mut rx) = dispatcher(true);
        let mut store = Store::new();
        d.execute(&mut store, Intent::FetchPage(2));
        apply_next(&mut store, &mut rx).await;

        d.execute(&mut store, Intent::DeleteUser(UserId(20)));
        assert!(store.state().users.users.is_empty());
        apply_next(&mut store, &mut rx).await;
        assert_eq!(store.state().users.users[0].id, UserId(20));
        assert!(store.state().notice.is_some());
    }

    #[tokio::test]
    async fn drain_applies_everything_available() {
        let (d, mut rx) = dispatcher(false);
        let mut store = Store::new();
        d.execute(&mut store, Intent::FetchPage(2));
        d.execute(&mut store, Intent::ToggleTheme);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(drain_completions(&mut store, &mut rx), 1);
        assert!(!store.state().theme.is_dark);
        assert_eq!(store.state().users.current_page, 2);
    }
}

//! User collection slice: the currently loaded page and its pagination counters.
//!
//! Pages are replaced wholesale, never merged. Every `FetchStarted` gets a new
//! request id and only the completion carrying the latest id is accepted, so rapid
//! pagination (or a repeated reload of the same page) settles on the request the
//! user made last.

use tracing::{debug, info};

use super::Notice;
use crate::api::{User, UserId, UserPage, UserPatch, UserUpdate};

/// A user removed optimistically, kept until the server confirms the delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedUser {
    pub user: User,
    pub index: usize,
    pub page: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsersState {
    pub users: Vec<User>,
    pub current_page: u32,
    pub total_pages: u32,
    pub per_page: u32,
    pub total: u32,
    pub loading: bool,
    pub error: Option<String>,
    /// Page of the outstanding fetch, if any.
    pub requested_page: Option<u32>,
    /// Id of the most recent `FetchStarted`. Monotonic for the life of the state.
    pub fetch_seq: u64,
    pub pending_deletes: Vec<DeletedUser>,
}

impl Default for UsersState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            current_page: 1,
            total_pages: 1,
            per_page: 0,
            total: 0,
            loading: false,
            error: None,
            requested_page: None,
            fetch_seq: 0,
            pending_deletes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsersAction {
    /// Starts a fetch of `page`; the store assigns it the next request id.
    FetchStarted { page: u32 },
    FetchSucceeded { request: u64, page: UserPage },
    FetchFailed { request: u64, page: u32, message: String },
    UpdateSucceeded { update: UserUpdate, patch: UserPatch },
    UpdateFailed { message: String },
    DeleteStarted { id: UserId },
    DeleteConfirmed { id: UserId },
    DeleteFailed { id: UserId, message: String },
}

impl UsersState {
    /// Page that navigation should be relative to: the latest intent if one is
    /// outstanding, otherwise the loaded page.
    pub fn target_page(&self) -> u32 {
        self.requested_page.unwrap_or(self.current_page)
    }

    /// Whether a previous page exists relative to [`UsersState::target_page`].
    pub fn has_prev(&self) -> bool {
        self.target_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.target_page() < self.total_pages
    }

    /// Whether a completion for `request` is still wanted.
    ///
    /// # Arguments
    ///
    /// * `request` - The id the fetch was started with (`fetch_seq` right after `FetchStarted`).
    ///
    /// # Returns
    ///
    /// `true` only for the latest request while it is outstanding.
    pub fn is_current_fetch(&self, request: u64) -> bool {
        self.requested_page.is_some() && request == self.fetch_seq
    }

    /// Look up a loaded user by id on the current page.
    pub fn find(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Apply an action to the collection.
    ///
    /// # Arguments
    ///
    /// * `action` - The action to apply. Fetch completions whose request id is
    ///   not the latest one are ignored.
    ///
    /// # Returns
    ///
    /// A notice for the status bar when the outcome of an update or delete
    /// should be announced; `None` otherwise.
    pub fn reduce(&mut self, action: UsersAction) -> Option<Notice> {
        match action {
            UsersAction::FetchStarted { page } => {
                self.loading = true;
                self.error = None;
                self.requested_page = Some(page);
                self.fetch_seq += 1;
                debug!(page, request = self.fetch_seq, "fetch started");
                None
            }
            UsersAction::FetchSucceeded { request, page } => {
                if !self.is_current_fetch(request) {
                    debug!(request, page = page.page, latest = self.fetch_seq, "discarding stale page");
                    return None;
                }
                let total_pages = page.total_pages.max(1);
                self.current_page = page.page.clamp(1, total_pages);
                self.total_pages = total_pages;
                self.per_page = page.per_page;
                self.total = page.total;
                self.users = page.data;
                self.loading = false;
                self.requested_page = None;
                None
            }
            UsersAction::FetchFailed { request, page, message } => {
                if !self.is_current_fetch(request) {
                    debug!(request, page, latest = self.fetch_seq, "discarding stale page error");
                    return None;
                }
                self.loading = false;
                self.error = Some(message);
                self.requested_page = None;
                None
            }
            UsersAction::UpdateSucceeded { update, patch } => {
                if let Some(user) = self.users.iter_mut().find(|u| u.id == update.id) {
                    user.first_name = patch.first_name.unwrap_or(update.first_name);
                    user.last_name = patch.last_name.unwrap_or(update.last_name);
                    user.email = patch.email.unwrap_or(update.email);
                }
                Some(Notice::success("User updated successfully"))
            }
            UsersAction::UpdateFailed { message } => Some(Notice::error(message)),
            UsersAction::DeleteStarted { id } => {
                if let Some(index) = self.users.iter().position(|u| u.id == id) {
                    let user = self.users.remove(index);
                    self.pending_deletes.push(DeletedUser {
                        user,
                        index,
                        page: self.current_page,
                    });
                }
                None
            }
            UsersAction::DeleteConfirmed { id } => {
                self.pending_deletes.retain(|d| d.user.id != id);
                info!(%id, "user deleted");
                Some(Notice::success("User deleted successfully"))
            }
            UsersAction::DeleteFailed { id, message } => {
                if let Some(pos) = self.pending_deletes.iter().position(|d| d.user.id == id) {
                    let snapshot = self.pending_deletes.remove(pos);
                    if snapshot.page == self.current_page && self.find(id).is_none() {
                        let at = snapshot.index.min(self.users.len());
                        self.users.insert(at, snapshot.user);
                    }
                }
                Some(Notice::error(message))
            }
        }
    }
}

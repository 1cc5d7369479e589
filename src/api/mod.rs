//! Remote directory layer.
//!
//! The console talks to a reqres-compatible REST service through the
//! [`Directory`] trait. [`HttpDirectory`] is the reqwest implementation used by
//! the binary; tests substitute in-process fakes or a wiremock server.
pub mod types;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};
pub use types::{Credentials, Token, User, UserId, UserPage, UserPatch, UserUpdate};

/// Operations offered by the remote user directory.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// `LoginRejected` carrying the server's `error` text when it refuses the
    /// credentials; transport errors otherwise.
    async fn login(&self, credentials: &Credentials) -> Result<Token>;

    /// Fetch one server-paginated page of users.
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number, sent as `?page=`.
    /// * `auth` - Session token; attached only if the implementation is configured to.
    ///
    /// # Returns
    ///
    /// The page exactly as the server reported it. Clamping is left to the store.
    async fn fetch_users(&self, page: u32, auth: Option<&Token>) -> Result<UserPage>;

    /// Send the full updated record.
    ///
    /// # Returns
    ///
    /// The fields the server echoed back; an empty body yields an empty patch.
    async fn update_user(&self, update: &UserUpdate, auth: Option<&Token>) -> Result<UserPatch>;

    /// Delete a user by id.
    ///
    /// # Arguments
    ///
    /// * `id` - User to delete.
    /// * `auth` - Session token, as for [`Directory::fetch_users`].
    ///
    /// # Errors
    ///
    /// `Status` for any non-2xx answer, so the caller can roll back its
    /// optimistic removal.
    async fn delete_user(&self, id: UserId, auth: Option<&Token>) -> Result<()>;
}

/// Connection settings for [`HttpDirectory`].
#[derive(Clone, Debug)]
pub struct HttpDirectoryOptions {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Attach `Authorization: Bearer` to user calls when a session token exists.
    pub send_auth_header: bool,
}

pub struct HttpDirectory {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    send_auth_header: bool,
}

impl HttpDirectory {
    /// Build a client for `options.base_url`.
    ///
    /// Trailing slashes are trimmed so paths can be appended with a single `/`.
    ///
    /// # Errors
    ///
    /// `InvalidBaseUrl` when the URL does not parse, or the reqwest builder error.
    pub fn new(options: HttpDirectoryOptions) -> Result<Self> {
        let trimmed = options.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&trimmed).map_err(|_| ConsoleError::InvalidBaseUrl(options.base_url.clone()))?;
        let http = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            http,
            base_url: trimmed,
            api_key: options.api_key,
            send_auth_header: options.send_auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn decorate(&self, req: RequestBuilder, auth: Option<&Token>) -> RequestBuilder {
        let req = match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        };
        match auth {
            Some(token) if self.send_auth_header => req.bearer_auth(token.as_str()),
            _ => req,
        }
    }
}

/// Map a non-2xx response into `ConsoleError::Status`, keeping the body as message.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read response body>".to_string());
    let message = if message.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        message
    };
    Err(ConsoleError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        debug!(email = %credentials.email, "login request");
        let response = self
            .decorate(self.http.post(self.url("login")), None)
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<types::ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("login failed").to_string()
                    } else {
                        body
                    }
                });
            warn!(status = status.as_u16(), "login rejected");
            return Err(ConsoleError::LoginRejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: types::LoginResponse = response.json().await?;
        Ok(parsed.token)
    }

    async fn fetch_users(&self, page: u32, auth: Option<&Token>) -> Result<UserPage> {
        debug!(page, "fetch users");
        let response = self
            .decorate(self.http.get(self.url("users")), auth)
            .query(&[("page", page)])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn update_user(&self, update: &UserUpdate, auth: Option<&Token>) -> Result<UserPatch> {
        debug!(id = %update.id, "update user");
        let response = self
            .decorate(self.http.put(self.url(&format!("users/{}", update.id))), auth)
            .json(update)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(UserPatch::default());
        }
        serde_json::from_str(&body).map_err(|e| ConsoleError::Status {
            status: 200,
            message: format!("malformed update response: {e}"),
        })
    }

    async fn delete_user(&self, id: UserId, auth: Option<&Token>) -> Result<()> {
        debug!(%id, "delete user");
        let response = self
            .decorate(self.http.delete(self.url(&format!("users/{id}"))), auth)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(base: &str) -> HttpDirectoryOptions {
        HttpDirectoryOptions {
            base_url: base.to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
            send_auth_header: false,
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let dir = HttpDirectory::new(options("https://reqres.in/api/")).unwrap();
        assert_eq!(dir.base_url(), "https://reqres.in/api");
        assert_eq!(dir.url("users"), "https://reqres.in/api/users");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpDirectory::new(options("not a url")).err().unwrap();
        assert!(matches!(err, ConsoleError::InvalidBaseUrl(_)));
    }
}

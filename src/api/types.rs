//! Wire types for the remote user directory.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned user identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    /// "first last", as shown in lists and used for sorting.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One server-returned batch of users plus its pagination metadata.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserPage {
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
}

/// Full record sent with `PUT /users/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip)]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Fields echoed back by the server after an update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

#[derive(Deserialize)]
pub(crate) struct LoginResponse {
    pub token: Token,
}

#[derive(Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parses_reqres_shape() {
        let raw = r#"{"page":2,"per_page":6,"total":12,"total_pages":2,
            "data":[{"id":7,"email":"michael.lawson@reqres.in","first_name":"Michael",
            "last_name":"Lawson","avatar":"https://reqres.in/img/faces/7-image.jpg"}],
            "support":{"url":"x","text":"y"}}"#;
        let page: UserPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.data[0].id, UserId(7));
        assert_eq!(page.data[0].full_name(), "Michael Lawson");
    }

    #[test]
    fn update_body_omits_id() {
        let update = UserUpdate {
            id: UserId(3),
            first_name: "Emma".into(),
            last_name: "Wong".into(),
            email: "emma.wong@reqres.in".into(),
        };
        let body = serde_json::to_value(&update).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["first_name"], "Emma");
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let creds = Credentials { email: "eve@x".into(), password: "hunter2".into() };
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(!format!("{:?}", Token::new("QpwL5tke4Pnpja7X4")).contains("QpwL"));
    }
}

//! Wire types for the fitness API
//!
//! Request and response bodies exactly as the remote service speaks them.

use serde::{Deserialize, Deserializer, Serialize};

/// Login request body. The service identifies accounts by `username`;
/// the client always sends the email address in that field.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    /// Name entered on the sign-up form. Not part of the wire body.
    #[serde(skip)]
    pub name: String,
}

impl Registration {
    /// Build a registration whose username is the email address, so the
    /// account can later sign in through the same email-based login.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let email = email.into();
        let password = password.into();
        Self {
            username: email.clone(),
            email,
            password_confirm: password.clone(),
            password,
            name: name.into(),
        }
    }

    /// Credentials for signing in once the account exists
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity record as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Successful credential exchange: a token plus who it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: Identity,
}

/// Body of a successful registration (no token is issued)
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationResponse {
    pub user: Identity,
}

/// Account ids are integers on the server but strings everywhere else
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Pull a human-readable message out of an error response body.
///
/// Understands `{"error": ".."}`, `{"detail": ".."}` and validation maps
/// like `{"email": ["..."], "non_field_errors": ["..."]}`.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }
    }

    if let Some(first) = object
        .get("non_field_errors")
        .and_then(first_string)
    {
        return Some(first);
    }

    object.iter().find_map(|(field, v)| {
        first_string(v).map(|msg| format!("{}: {}", field, msg))
    })
}

fn first_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(first_string),
        _ => None,
    }
}

//! Signed session cookies.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::entities::User;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session.
pub const SESSION_COOKIE: &str = "session";

/// Identity extracted from a verified session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl CurrentUser {
    /// True for the admin and for the owner of the resource.
    pub fn can_access(&self, owner_id: Option<i64>) -> bool {
        self.is_admin || owner_id == Some(self.id)
    }
}

/// Issues and verifies session cookie values.
///
/// A value has the form `{id}:{username}.{mac}` where `mac` is the hex
/// HMAC-SHA256 of `{id}:{username}` under the server secret. Nothing is
/// stored server-side; logging out only clears the cookie.
pub struct SessionService {
    secret: String,
    admin_username: String,
}

impl SessionService {
    pub fn new(secret: impl Into<String>, admin_username: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            admin_username: admin_username.into(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key length")
    }

    /// Builds a cookie value for a freshly authenticated user.
    pub fn issue(&self, user: &User) -> String {
        let payload = format!("{}:{}", user.id, user.username);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        format!("{payload}.{}", hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks the signature of a cookie value and returns who it belongs to.
    pub fn verify(&self, value: &str) -> Option<CurrentUser> {
        let (payload, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let (id, username) = payload.split_once(':')?;
        let id = id.parse().ok()?;

        Some(CurrentUser {
            id,
            username: username.to_string(),
            is_admin: username == self.admin_username,
        })
    }

    /// `Set-Cookie` value that stores a session.
    pub fn set_cookie(&self, user: &User) -> String {
        format!(
            "{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/",
            self.issue(user)
        )
    }

    /// `Set-Cookie` value that removes the session.
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

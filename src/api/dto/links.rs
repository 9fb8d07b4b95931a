//! DTOs for link endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::LinkWithToken;
use crate::domain::entities::Link;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Target URL, normalized before it is stored.
    #[validate(length(min = 1, max = 2048))]
    pub long_link: String,

    /// Explicit owner. Falls back to the session user, then the default owner.
    #[validate(range(min = 1))]
    pub owner_id: Option<i64>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// A link as listed for its owner.
#[derive(Debug, Serialize)]
pub struct LinkView {
    #[serde(flatten)]
    pub link: Link,
    pub token: Option<String>,
    pub short_url: Option<String>,
}

impl LinkView {
    pub fn new(item: LinkWithToken, base_url: &str) -> Self {
        let short_url = item
            .token
            .as_ref()
            .map(|token| format!("{base_url}/{token}"));
        Self {
            link: item.link,
            token: item.token,
            short_url,
        }
    }
}

use async_trait::async_trait;
use rocket::http::HeaderMap;

use crate::{PreviewError, Result, User};

/// Establishes which user a request acts as.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap<'_>) -> Result<User>;
}

/// Every request acts as the same user.
pub struct NoAuth {
    user: User,
}

impl NoAuth {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

#[async_trait]
impl Authenticator for NoAuth {
    async fn authenticate(&self, _headers: &HeaderMap<'_>) -> Result<User> {
        Ok(self.user.clone())
    }
}

/// Trusts a username set by a fronting proxy. Permissions and scope come
/// from `template`.
pub struct ProxyAuth {
    header: String,
    template: User,
}

impl ProxyAuth {
    pub fn new(header: impl Into<String>, template: User) -> Self {
        Self {
            header: header.into(),
            template,
        }
    }
}

#[async_trait]
impl Authenticator for ProxyAuth {
    async fn authenticate(&self, headers: &HeaderMap<'_>) -> Result<User> {
        let username = headers
            .get_one(&self.header)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PreviewError::Unauthorized(format!("missing {} header", self.header)))?;

        Ok(User {
            username: username.to_string(),
            ..self.template.clone()
        })
    }
}

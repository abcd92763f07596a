//! User directory port.
//!
//! Users are managed elsewhere; the proposal domain only needs to know
//! whether an id refers to a real user.

use crate::domain::foundation::{DomainError, UserId};
use async_trait::async_trait;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Check if a user exists.
    async fn exists(&self, user_id: UserId) -> Result<bool, DomainError>;
}

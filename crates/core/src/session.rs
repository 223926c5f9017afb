//! Explicit session context.
//!
//! Identity comes from an external provider; this module only carries the
//! result around. A [`SessionContext`] is created anonymous, filled on login
//! and cleared on logout, and handed to whatever needs to know who is
//! looking at the dashboard.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Profile data handed over by the identity provider after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<UserInfo>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Record a successful login, replacing any previous user.
    pub fn login(&mut self, user: UserInfo) {
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn is_connected(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// The logged-in user, or `Unauthorized` for an anonymous session.
    pub fn require_user(&self) -> Result<&UserInfo, CoreError> {
        self.user
            .as_ref()
            .ok_or_else(|| CoreError::Unauthorized("login required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserInfo {
        UserInfo {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            picture: None,
        }
    }

    #[test]
    fn starts_anonymous() {
        let session = SessionContext::anonymous();
        assert!(!session.is_connected());
        assert!(session.user().is_none());
        assert!(matches!(
            session.require_user(),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn login_then_logout() {
        let mut session = SessionContext::anonymous();
        session.login(user());
        assert!(session.is_connected());
        assert_eq!(session.require_user().unwrap().email, "ana@example.com");

        session.logout();
        assert!(!session.is_connected());
        assert!(session.require_user().is_err());
    }
}

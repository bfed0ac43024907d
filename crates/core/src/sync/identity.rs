//! Who is signed in. Authentication itself happens outside this crate; the
//! embedding app hands over the resulting session.

use std::sync::RwLock;

/// Credentials for one account's remote document tree.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountSession {
    pub account_id: String,
    pub access_token: String,
}

impl AccountSession {
    pub fn new(account_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("account_id", &self.account_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

pub trait IdentityProvider: Send + Sync {
    /// The active session, or `None` when signed out.
    fn current_session(&self) -> Option<AccountSession>;
}

/// In-process session holder.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: RwLock<Option<AccountSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: AccountSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    pub fn set(&self, session: AccountSession) {
        let mut guard = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(session);
    }

    pub fn clear(&self) {
        let mut guard = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.take();
    }
}

impl IdentityProvider for SessionStore {
    fn current_session(&self) -> Option<AccountSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_set_and_clear() {
        let store = SessionStore::new();
        assert!(store.current_session().is_none());

        store.set(AccountSession::new("uid-1", "token"));
        assert_eq!(
            store.current_session().map(|s| s.account_id),
            Some("uid-1".to_string())
        );

        store.clear();
        assert!(store.current_session().is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", AccountSession::new("uid-1", "secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}

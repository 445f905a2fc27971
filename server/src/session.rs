//! Per-connection session state
//!
//! A session is either unauthenticated or bound to exactly one account by a
//! token. Only the dispatcher moves a session between the two states.

use crate::client_manager::ClientId;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of issued session tokens
pub const TOKEN_LEN: usize = 32;

/// Draws a fresh token from the thread-local CSPRNG
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Compares tokens without returning early on the first differing byte
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated {
        token: String,
        username: String,
    },
}

/// Authentication state of one connection
#[derive(Debug)]
pub struct Session {
    client_id: ClientId,
    state: SessionState,
}

impl Session {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Unauthenticated => None,
        }
    }

    /// Returns the bound username if `presented` is this session's token
    ///
    /// An unauthenticated session authorizes nothing.
    pub fn authorize(&self, presented: &str) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, username }
                if tokens_match(token, presented) =>
            {
                Some(username)
            }
            _ => None,
        }
    }

    /// Binds the session to `username` under a fresh token and returns it
    pub(crate) fn authenticate(&mut self, username: &str) -> &str {
        self.state = SessionState::Authenticated {
            token: generate_token(),
            username: username.to_string(),
        };
        self.token().unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.state = SessionState::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_differ() {
        let tokens: std::collections::HashSet<String> =
            (0..100).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("abc123", "abc123"));
        assert!(!tokens_match("abc123", "abc124"));
        assert!(!tokens_match("abc123", "xbc123"));
        assert!(!tokens_match("abc123", "abc12"));
        assert!(!tokens_match("abc123", ""));
    }

    #[test]
    fn test_new_session_unauthenticated() {
        let session = Session::new(7);
        assert_eq!(session.client_id(), 7);
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert_eq!(session.username(), None);
        assert_eq!(session.authorize(""), None);
    }

    #[test]
    fn test_authenticate_and_clear() {
        let mut session = Session::new(1);
        let token = session.authenticate("alice").to_string();

        assert!(session.is_authenticated());
        assert_eq!(session.username(), Some("alice"));
        assert_eq!(session.authorize(&token), Some("alice"));
        assert_eq!(session.authorize("wrong"), None);

        session.clear();
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert_eq!(session.authorize(&token), None);
    }

    #[test]
    fn test_reauthentication_issues_new_token() {
        let mut session = Session::new(1);
        let first = session.authenticate("alice").to_string();
        session.clear();
        let second = session.authenticate("alice").to_string();

        assert_ne!(first, second);
        assert_eq!(session.authorize(&first), None);
    }
}

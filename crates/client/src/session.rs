//! Authenticated session context.
//!
//! The session is read once by whoever builds the core components and passed
//! into their constructors. Nothing in this crate writes credentials.

/// Credentials of a signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of the current session, e.g. browser storage or the environment.
pub trait SessionProvider: Send + Sync {
    fn current_session(&self) -> Option<Session>;
}

/// Reads `CINEFEST_USER_ID` and `CINEFEST_TOKEN`; both must be non-empty.
pub struct EnvSession;

impl SessionProvider for EnvSession {
    fn current_session(&self) -> Option<Session> {
        session_from(|name| std::env::var(name).ok())
    }
}

fn session_from<F: Fn(&str) -> Option<String>>(lookup: F) -> Option<Session> {
    let token = lookup("CINEFEST_TOKEN").filter(|t| !t.is_empty())?;
    let user_id = lookup("CINEFEST_USER_ID").filter(|u| !u.is_empty())?;
    Some(Session { user_id, token })
}

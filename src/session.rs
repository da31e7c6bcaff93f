use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use uuid::Uuid;

/// Opaque token handed to the client in the `sessionid` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for SessionId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Uuid::try_parse(s).map(Self).map_err(|_| ())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

/// What the server remembers about a logged-in visitor.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity token: the account's email.
    pub user: String,
    /// Username cached at login for display.
    pub name: String,
}

/// In-process session table. Sessions do not survive a restart, which also
/// invalidates every cookie issued by a previous run.
pub struct SessionStore {
    live: Mutex<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn create(&self, session: Session) -> SessionId {
        let id = SessionId::new();
        self.live
            .lock()
            .expect("session table poisoned")
            .insert(id, session);
        id
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.live
            .lock()
            .expect("session table poisoned")
            .get(id)
            .cloned()
    }

    /// True if there was a session to destroy.
    pub fn destroy(&self, id: &SessionId) -> bool {
        self.live
            .lock()
            .expect("session table poisoned")
            .remove(id)
            .is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_ids_round_trip_through_cookies() {
        let store = SessionStore::new();
        let id = store.create(Session {
            user: "a@b.c".into(),
            name: "ab".into(),
        });

        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(store.get(&parsed).unwrap().name, "ab");
    }

    #[test]
    fn destroy_is_observable_and_idempotent_checks_fail() {
        let store = SessionStore::new();
        let id = store.create(Session {
            user: "a@b.c".into(),
            name: "ab".into(),
        });

        assert!(store.destroy(&id));
        assert!(store.get(&id).is_none());
        assert!(!store.destroy(&id));
    }

    #[test]
    fn garbage_cookies_do_not_parse() {
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}

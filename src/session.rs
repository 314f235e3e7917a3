use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "dashboard_session";

/// Sessions untouched for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message shown once on the page the browser is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// What a single browser session remembers between page loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Set once the operator dismissed the cold-room warning.
    pub cold_warning_acknowledged: bool,

    pub flash: Option<Flash>,
}

#[derive(Debug)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Sessions are only stored once they hold something worth keeping, so
/// cookieless clients never add entries.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Returns the session for `id`, or a fresh id with an empty session when
    /// `id` is unknown or absent. The returned id is the one the client
    /// should keep. Fresh sessions are not stored until [`Self::update`].
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Session) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(id) = id
            && let Some(entry) = sessions.get_mut(&id)
        {
            entry.last_seen = Instant::now();
            return (id, entry.session.clone());
        }

        (Uuid::new_v4(), Session::default())
    }

    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut Session)) -> Session {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        sessions.retain(|key, entry| *key == id || now.duration_since(entry.last_seen) < self.idle_timeout);

        let entry = sessions.entry(id).or_insert_with(|| Entry {
            session: Session::default(),
            last_seen: now,
        });
        entry.last_seen = now;
        f(&mut entry.session);
        entry.session.clone()
    }

    /// Removes and returns the pending flash message of `id`.
    pub fn take_flash(&self, id: Uuid) -> Option<Flash> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get_mut(&id).and_then(|e| e.session.flash.take())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn unknown_id_gets_fresh_session() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();

        let (id, session) = store.get_or_create(Some(stale));

        assert_ne!(id, stale);
        assert!(!session.cold_warning_acknowledged);
    }

    #[test]
    fn acknowledgment_is_per_session() {
        let store = SessionStore::new();
        let (a, _) = store.get_or_create(None);
        let (b, _) = store.get_or_create(None);

        store.update(a, |s| s.cold_warning_acknowledged = true);

        assert!(store.get_or_create(Some(a)).1.cold_warning_acknowledged);
        assert!(!store.get_or_create(Some(b)).1.cold_warning_acknowledged);
    }

    #[test]
    fn cookieless_requests_store_nothing() {
        let store = SessionStore::new();

        for _ in 0..10_000 {
            store.get_or_create(None);
        }

        assert!(store.is_empty());
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::ZERO);
        let (a, _) = store.get_or_create(None);
        let (b, _) = store.get_or_create(None);

        store.update(a, |s| s.cold_warning_acknowledged = true);
        store.update(b, |s| s.cold_warning_acknowledged = true);

        assert_eq!(store.len(), 1);
        assert_ne!(store.get_or_create(Some(a)).0, a);
        assert_eq!(store.get_or_create(Some(b)).0, b);
    }

    #[test]
    fn flash_is_shown_once() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None);

        store.update(id, |s| s.flash = Some(Flash::success("Kipas dihidupkan")));

        assert_eq!(store.take_flash(id), Some(Flash::success("Kipas dihidupkan")));
        assert_eq!(store.take_flash(id), None);
    }

    #[test]
    fn reads_session_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}")).unwrap(),
        );

        assert_eq!(session_id(&headers), Some(id));
        assert_eq!(session_id(&HeaderMap::new()), None);
    }
}

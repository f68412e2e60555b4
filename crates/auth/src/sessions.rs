use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::time::format_description::well_known::Rfc3339;
use gk_core::Uid;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::RwLock;

/// Read-only view of a legacy server-side session.
/// Only the stored user and the cookie's max age are ever consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    user: Option<String>,
    max_age: Option<Duration>,
}

impl SessionRef {
    pub fn new(user: Option<String>, max_age: Option<Duration>) -> Self {
        Self { user, max_age }
    }
    pub fn of(uid: Uid, max_age: Duration) -> Self {
        Self::new(Some(uid.to_string()), Some(max_age))
    }
    /// Whether the session carries any stored user at all.
    pub fn has_user(&self) -> bool {
        self.user.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
    /// The stored user, if it names a real account.
    pub fn uid(&self) -> Option<Uid> {
        self.user
            .as_deref()
            .and_then(|u| u.trim().parse::<Uid>().ok())
            .filter(|uid| *uid > gk_core::ANONYMOUS)
    }
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }
    pub fn remember(&self) -> bool {
        crate::Policy::remember(self.max_age)
    }
    /// Parses a serialized express-session record:
    /// `{"cookie":{"expires":iso8601,"originalMaxAge":ms},"passport":{"user":uid}}`.
    /// The max age is the time the cookie has left, as express reports it;
    /// `originalMaxAge` stands in only when no expiry was stored.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Record {
            #[serde(default)]
            cookie: Option<CookieRecord>,
            #[serde(default)]
            passport: Option<Passport>,
        }
        #[derive(Deserialize)]
        struct CookieRecord {
            #[serde(default)]
            expires: Option<String>,
            #[serde(default, rename = "originalMaxAge")]
            original_max_age: Option<u64>,
        }
        #[derive(Deserialize)]
        struct Passport {
            #[serde(default)]
            user: Option<serde_json::Value>,
        }
        let record = serde_json::from_str::<Record>(text)?;
        let user = record
            .passport
            .and_then(|p| p.user)
            .and_then(|user| match user {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        let max_age = match record.cookie {
            None => None,
            Some(CookieRecord {
                expires: Some(expires),
                ..
            }) => Some(remaining(&expires)?),
            Some(CookieRecord {
                original_max_age, ..
            }) => original_max_age.map(Duration::from_millis),
        };
        Ok(Self::new(user, max_age))
    }
}

/// Time left until an RFC 3339 instant; zero once it has passed.
fn remaining(expires: &str) -> anyhow::Result<Duration> {
    let expires = OffsetDateTime::parse(expires, &Rfc3339)
        .map_err(|e| anyhow::anyhow!("session expiry {:?}: {}", expires, e))?;
    let left = expires - OffsetDateTime::now_utc();
    Ok(Duration::try_from(left).unwrap_or(Duration::ZERO))
}

/// Read access to the legacy session store, keyed by session id.
#[async_trait::async_trait]
pub trait SessionLayer: Send + Sync {
    async fn load(&self, sid: &str) -> anyhow::Result<Option<SessionRef>>;
}

/// In-process session table.
#[derive(Debug, Default)]
pub struct MemorySessions {
    sessions: RwLock<HashMap<String, SessionRef>>,
    loads: AtomicUsize,
}

impl MemorySessions {
    pub async fn insert(&self, sid: &str, session: SessionRef) {
        self.sessions.write().await.insert(sid.to_string(), session);
    }
    pub async fn remove(&self, sid: &str) -> Option<SessionRef> {
        self.sessions.write().await.remove(sid)
    }
    /// Number of lookups served so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl SessionLayer for MemorySessions {
    async fn load(&self, sid: &str) -> anyhow::Result<Option<SessionRef>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.sessions.read().await.get(sid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_passport_user() {
        let session = SessionRef::from_json(
            r#"{"cookie":{"originalMaxAge":2592000000,"httpOnly":true},"passport":{"user":42}}"#,
        )
        .unwrap();
        assert_eq!(session.uid(), Some(42));
        assert_eq!(session.max_age(), Some(Duration::from_secs(30 * 86400)));
        assert!(session.remember());
    }

    #[test]
    fn max_age_is_time_remaining_not_original() {
        let soon = (OffsetDateTime::now_utc() + actix_web::cookie::time::Duration::hours(6))
            .format(&Rfc3339)
            .unwrap();
        let text = format!(
            r#"{{"cookie":{{"originalMaxAge":2592000000,"expires":"{}"}},"passport":{{"user":42}}}}"#,
            soon
        );
        let session = SessionRef::from_json(&text).unwrap();
        let left = session.max_age().unwrap();
        assert!(left <= Duration::from_secs(6 * 3600));
        assert!(left > Duration::from_secs(5 * 3600));
        assert!(!session.remember());
    }

    #[test]
    fn expired_cookie_has_no_time_left() {
        let session = SessionRef::from_json(
            r#"{"cookie":{"originalMaxAge":2592000000,"expires":"2001-01-01T00:00:00.000Z"},"passport":{"user":42}}"#,
        )
        .unwrap();
        assert_eq!(session.max_age(), Some(Duration::ZERO));
        assert!(!session.remember());
        assert!(
            SessionRef::from_json(r#"{"cookie":{"expires":"tomorrow"}}"#).is_err()
        );
    }

    #[test]
    fn parses_string_passport_user() {
        let session = SessionRef::from_json(r#"{"passport":{"user":"17"}}"#).unwrap();
        assert_eq!(session.uid(), Some(17));
        assert!(!session.remember());
    }

    #[test]
    fn anonymous_session_has_no_user() {
        let session = SessionRef::from_json(r#"{"cookie":{"originalMaxAge":null}}"#).unwrap();
        assert!(!session.has_user());
        assert_eq!(session.uid(), None);
        assert!(SessionRef::from_json("not json").is_err());
    }

    #[test]
    fn unparseable_user_is_present_but_invalid() {
        let session = SessionRef::new(Some("guest".into()), None);
        assert!(session.has_user());
        assert_eq!(session.uid(), None);
        let session = SessionRef::new(Some("0".into()), None);
        assert_eq!(session.uid(), None);
    }

    #[tokio::test]
    async fn memory_sessions_count_loads() {
        let sessions = MemorySessions::default();
        sessions.insert("abc", SessionRef::of(5, Duration::from_secs(60))).await;
        assert_eq!(sessions.load("abc").await.unwrap().and_then(|s| s.uid()), Some(5));
        assert!(sessions.load("zzz").await.unwrap().is_none());
        assert_eq!(sessions.loads(), 2);
        assert!(sessions.remove("abc").await.is_some());
    }
}

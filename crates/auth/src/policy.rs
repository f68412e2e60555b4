use gk_core::DAY_SECS;
use gk_core::MAX_LIFETIME_SECS;
use gk_core::REMEMBER_EXPIRY_DAYS;
use gk_core::REMEMBER_THRESHOLD;
use gk_core::TOKEN_EXPIRY_SECS;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Switches and lifetimes read on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub jwt_enabled: bool,
    pub token_expiry_secs: u64,
    pub remember_expiry_days: u64,
    pub session_enabled: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            jwt_enabled: true,
            token_expiry_secs: TOKEN_EXPIRY_SECS,
            remember_expiry_days: REMEMBER_EXPIRY_DAYS,
            session_enabled: true,
        }
    }
}

impl Policy {
    /// Shared by token signing and cookie Max-Age so the two never drift.
    /// Always at least one second and at most `MAX_LIFETIME_SECS`, so an
    /// operator typo can neither mint dead tokens nor overflow.
    pub fn lifetime(&self, remember: bool) -> Duration {
        let secs = match remember {
            true => self.remember_expiry_days.saturating_mul(DAY_SECS),
            false => self.token_expiry_secs,
        };
        Duration::from_secs(secs.clamp(1, MAX_LIFETIME_SECS))
    }
    /// Whether a session cookie of this age earns a "remember me" token.
    pub fn remember(max_age: Option<Duration>) -> bool {
        max_age.is_some_and(|age| age > REMEMBER_THRESHOLD)
    }
}

/// Process-wide policy handle.
/// Cloned into every component; replaced wholesale between requests.
#[derive(Debug, Clone)]
pub struct Policies(Arc<watch::Sender<Policy>>);

impl Policies {
    pub fn new(policy: Policy) -> Self {
        let (tx, _) = watch::channel(policy);
        Self(Arc::new(tx))
    }
    /// Snapshot for one request.
    pub fn current(&self) -> Policy {
        *self.0.borrow()
    }
    pub fn replace(&self, policy: Policy) -> Policy {
        log::info!("[policy] updated: {:?}", policy);
        self.0.send_replace(policy)
    }
    pub fn subscribe(&self) -> watch::Receiver<Policy> {
        self.0.subscribe()
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = Policy::default();
        assert!(policy.jwt_enabled);
        assert!(policy.session_enabled);
        assert_eq!(policy.lifetime(false), Duration::from_secs(1200));
        assert_eq!(policy.lifetime(true), Duration::from_secs(14 * 86400));
    }

    #[test]
    fn lifetimes_are_bounded() {
        let huge = Policy {
            token_expiry_secs: u64::MAX,
            remember_expiry_days: u64::MAX / 1000,
            ..Policy::default()
        };
        assert_eq!(huge.lifetime(false), Duration::from_secs(MAX_LIFETIME_SECS));
        assert_eq!(huge.lifetime(true), Duration::from_secs(MAX_LIFETIME_SECS));
        let zero = Policy {
            token_expiry_secs: 0,
            remember_expiry_days: 0,
            ..Policy::default()
        };
        assert_eq!(zero.lifetime(false), Duration::from_secs(1));
        assert_eq!(zero.lifetime(true), Duration::from_secs(1));
    }

    #[test]
    fn remember_threshold_is_exclusive() {
        assert!(!Policy::remember(None));
        assert!(!Policy::remember(Some(Duration::from_secs(86400))));
        assert!(Policy::remember(Some(Duration::from_secs(86401))));
        assert!(Policy::remember(Some(Duration::from_secs(30 * 86400))));
    }

    #[test]
    fn replace_is_visible_to_clones() {
        let policies = Policies::default();
        let clone = policies.clone();
        let previous = policies.replace(Policy {
            jwt_enabled: false,
            ..Policy::default()
        });
        assert!(previous.jwt_enabled);
        assert!(!clone.current().jwt_enabled);
        assert!(!clone.subscribe().borrow().jwt_enabled);
    }
}

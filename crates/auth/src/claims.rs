use gk_core::Epoch;
use gk_core::Uid;

/// Token payload. `iss` and `aud` both bind the token to one deployment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub uid: Uid,
    pub iat: Epoch,
    pub exp: Epoch,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn new(uid: Uid, issued: Epoch, lifetime: std::time::Duration, url: &str) -> Self {
        Self {
            uid,
            iat: issued,
            exp: issued.saturating_add(Epoch::try_from(lifetime.as_secs()).unwrap_or(Epoch::MAX)),
            iss: url.to_string(),
            aud: url.to_string(),
        }
    }
    /// A token is live strictly before its expiry second.
    pub fn expired(&self) -> bool {
        self.exp <= gk_core::now()
    }
    pub fn uid(&self) -> Uid {
        self.uid
    }
    pub fn issued_at(&self) -> Epoch {
        self.iat
    }
    pub fn expires_at(&self) -> Epoch {
        self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn expiry_follows_lifetime() {
        let claims = Claims::new(3, 1_000, Duration::from_secs(1200), "https://forum.test");
        assert_eq!(claims.expires_at(), 2_200);
        assert_eq!(claims.iss, claims.aud);
        assert!(claims.expired());
    }

    #[test]
    fn oversized_lifetime_saturates() {
        let claims = Claims::new(3, 1_000, Duration::from_secs(u64::MAX), "https://forum.test");
        assert_eq!(claims.expires_at(), Epoch::MAX);
        assert!(!claims.expired());
    }

    #[test]
    fn live_until_expiry() {
        let claims = Claims::new(3, gk_core::now(), Duration::from_secs(60), "https://forum.test");
        assert!(!claims.expired());
        let claims = Claims::new(3, gk_core::now(), Duration::ZERO, "https://forum.test");
        assert!(claims.expired());
    }
}

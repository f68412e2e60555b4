use super::*;
use gk_core::Epoch;
use gk_core::Uid;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use jsonwebtoken::errors::Error;
use jsonwebtoken::errors::ErrorKind;
use std::time::Duration;

/// Signs and verifies identity tokens for one deployment.
/// Keys are derived once; signing and verification never lock.
pub struct Crypto {
    url: String,
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Crypto {
    pub fn new(secret: &[u8], url: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[url]);
        validation.set_audience(&[url]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        Self {
            url: url.to_string(),
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.secret.as_bytes(), &settings.canonical_url)
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, Error> {
        jsonwebtoken::encode(&self.header, claims, &self.encoding)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, Error> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)?;
        match claims.expired() {
            true => Err(Error::from(ErrorKind::ExpiredSignature)),
            false => Ok(claims),
        }
    }
    /// Token for `uid` under the policy's ordinary or "remember me" lifetime.
    pub fn generate(&self, uid: Uid, remember: bool, policy: &Policy) -> Result<String, Error> {
        self.sign(uid, gk_core::now(), policy.lifetime(remember))
    }
    pub fn sign(&self, uid: Uid, issued: Epoch, lifetime: Duration) -> Result<String, Error> {
        self.encode(&Claims::new(uid, issued, lifetime, &self.url))
    }
    /// Invalid tokens are routine (anonymous visitors, stale cookies),
    /// so failures are logged at debug and flattened to `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.decode(token)
            .inspect_err(|e| log::debug!("[crypto] token verification failed: {}", e))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://forum.test";

    fn crypto() -> Crypto {
        Crypto::new(b"correct horse battery staple", URL)
    }

    #[test]
    fn roundtrip_preserves_uid() {
        let crypto = crypto();
        let policy = Policy::default();
        for uid in [1, 42, 9_000_000_001] {
            let token = crypto.generate(uid, false, &policy).unwrap();
            let claims = crypto.verify(&token).unwrap();
            assert_eq!(claims.uid(), uid);
            assert_eq!(claims.iss, URL);
            assert_eq!(claims.aud, URL);
        }
    }

    #[test]
    fn three_segments() {
        let token = crypto().generate(5, false, &Policy::default()).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn remember_expires_later() {
        let crypto = crypto();
        let policy = Policy::default();
        let issued = gk_core::now();
        let short = crypto.sign(9, issued, policy.lifetime(false)).unwrap();
        let long = crypto.sign(9, issued, policy.lifetime(true)).unwrap();
        let short = crypto.verify(&short).unwrap();
        let long = crypto.verify(&long).unwrap();
        assert!(long.expires_at() > short.expires_at());
        assert_eq!(short.expires_at() - short.issued_at(), 1200);
        assert_eq!(long.expires_at() - long.issued_at(), 14 * 86400);
    }

    #[test]
    fn rejects_foreign_secret() {
        let other = Crypto::new(b"another secret", URL);
        let token = other.generate(3, false, &Policy::default()).unwrap();
        assert!(crypto().verify(&token).is_none());
    }

    #[test]
    fn rejects_foreign_deployment() {
        let other = Crypto::new(b"correct horse battery staple", "https://elsewhere.test");
        let token = other.generate(3, false, &Policy::default()).unwrap();
        assert!(crypto().verify(&token).is_none());
    }

    #[test]
    fn rejects_tampered_payload() {
        let crypto = crypto();
        let token = crypto.generate(3, false, &Policy::default()).unwrap();
        let segments = token.split('.').collect::<Vec<_>>();
        let payload = segments[1];
        for i in 0..payload.len() {
            let mut bytes = payload.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let forged = format!(
                "{}.{}.{}",
                segments[0],
                String::from_utf8(bytes).unwrap(),
                segments[2]
            );
            assert!(crypto.verify(&forged).is_none(), "accepted tampering at {}", i);
        }
    }

    #[test]
    fn rejects_expired() {
        let crypto = crypto();
        let token = crypto
            .sign(3, gk_core::now() - 10, Duration::from_secs(5))
            .unwrap();
        assert!(crypto.verify(&token).is_none());
        let token = crypto.sign(3, gk_core::now(), Duration::ZERO).unwrap();
        assert!(crypto.verify(&token).is_none());
    }

    #[test]
    fn oversized_policies_still_mint_live_tokens() {
        let crypto = crypto();
        let policy = Policy {
            token_expiry_secs: u64::MAX,
            remember_expiry_days: u64::MAX / 1000,
            ..Policy::default()
        };
        for remember in [false, true] {
            let token = crypto.generate(3, remember, &policy).unwrap();
            let claims = crypto.verify(&token).unwrap();
            assert_eq!(claims.uid(), 3);
            assert!(claims.expires_at() > claims.issued_at());
        }
    }

    #[test]
    fn rejects_malformed() {
        let crypto = crypto();
        assert!(crypto.verify("").is_none());
        assert!(crypto.verify("invalid.token.here").is_none());
        assert!(crypto.verify("not-a-token").is_none());
    }
}

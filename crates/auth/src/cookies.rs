use super::*;
use actix_web::HttpResponse;
use actix_web::cookie::Cookie;
use actix_web::cookie::SameSite;
use actix_web::cookie::time;
use gk_core::TOKEN_COOKIE;
use std::time::Duration;

/// Places the token cookie on responses.
/// Path and `Secure` are fixed per deployment; Max-Age follows the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jar {
    path: String,
    secure: bool,
}

impl Jar {
    pub fn new(path: &str, secure: bool) -> Self {
        Self {
            path: path.to_string(),
            secure,
        }
    }
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.base_path, settings.tls)
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    /// `lifetime` must be the one the token was signed with.
    pub fn issue(&self, token: String, lifetime: Duration) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, token)
            .path(self.path.clone())
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(
                i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX),
            ))
            .finish()
    }
    /// Removal cookie. Fixed attributes make repeated clears byte-identical.
    pub fn clear(&self) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, "")
            .path(self.path.clone())
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .finish()
    }
    pub fn issue_cookie(
        &self,
        res: &mut HttpResponse,
        token: String,
        lifetime: Duration,
    ) -> Result<(), actix_web::error::HttpError> {
        res.add_cookie(&self.issue(token, lifetime))
    }
    pub fn clear_cookie(&self, res: &mut HttpResponse) -> Result<(), actix_web::error::HttpError> {
        res.add_cookie(&self.clear())
    }
}

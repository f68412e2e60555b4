use super::*;
use actix_web::HttpMessage;
use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use gk_core::BEARER_PREFIX;
use gk_core::TOKEN_COOKIE;

/// Everything a request presents that could identify it.
/// Owned, so resolution can proceed without borrowing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    bearer: Option<String>,
    cookie: Option<String>,
    sid: Option<String>,
    session: Option<SessionRef>,
}

impl Credentials {
    /// A `SessionRef` placed in extensions by an upstream session
    /// middleware is taken as-is; otherwise the session id cookie is kept
    /// for a lazy lookup.
    pub fn from_request(req: &HttpRequest, session_cookie: &str) -> Self {
        Self {
            bearer: bearer(req),
            cookie: req
                .cookie(TOKEN_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty()),
            sid: req
                .cookie(session_cookie)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty()),
            session: req.extensions().get::<SessionRef>().cloned(),
        }
    }
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
    pub fn with_cookie(mut self, token: &str) -> Self {
        self.cookie = Some(token.to_string());
        self
    }
    pub fn with_sid(mut self, sid: &str) -> Self {
        self.sid = Some(sid.to_string());
        self
    }
    pub fn with_session(mut self, session: SessionRef) -> Self {
        self.session = Some(session);
        self
    }
    /// Bearer header first, so API clients can override a stale cookie.
    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref().or(self.cookie.as_deref())
    }
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }
    pub fn session(&self) -> Option<&SessionRef> {
        self.session.as_ref()
    }
}

/// Token carried by the request, if any.
pub fn extract(req: &HttpRequest) -> Option<String> {
    Credentials::from_request(req, gk_core::SESSION_COOKIE)
        .token()
        .map(str::to_string)
}

fn bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

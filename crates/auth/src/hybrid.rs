use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::cookie::Cookie;
use gk_core::ANONYMOUS;
use gk_core::Uid;
use std::sync::Arc;
use std::time::Duration;

/// Why a request ended up anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// No usable credential was presented.
    Missing,
    /// A token was presented but did not verify.
    Invalid,
    /// The credential names a uid the store does not know.
    Unknown,
    /// The credential names a banned user.
    Banned,
    /// The user or session store failed or timed out.
    Unavailable,
    /// The presented credential's mechanism is switched off.
    Disabled,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no credentials"),
            Self::Invalid => write!(f, "invalid token"),
            Self::Unknown => write!(f, "unknown user"),
            Self::Banned => write!(f, "banned user"),
            Self::Unavailable => write!(f, "store unavailable"),
            Self::Disabled => write!(f, "mechanism disabled"),
        }
    }
}

/// Outcome of resolving one request: who it is, plus the token cookie to
/// attach when a session was just migrated.
#[derive(Debug, Clone)]
pub struct Resolution {
    principal: Principal,
    cookie: Option<Cookie<'static>>,
    rejection: Option<Rejection>,
}

impl Resolution {
    fn anonymous(rejection: Rejection) -> Self {
        Self {
            principal: Principal::anonymous(),
            cookie: None,
            rejection: Some(rejection),
        }
    }
    fn authenticated(uid: Uid, method: Method, cookie: Option<Cookie<'static>>) -> Self {
        Self {
            principal: Principal::authenticated(uid, method),
            cookie,
            rejection: None,
        }
    }
    pub fn principal(&self) -> Principal {
        self.principal
    }
    pub fn cookie(&self) -> Option<&Cookie<'static>> {
        self.cookie.as_ref()
    }
    pub fn rejection(&self) -> Option<Rejection> {
        self.rejection
    }
}

/// Per-request orchestrator deciding between token and legacy session.
///
/// Token first; session only as a fallback, and a session that
/// authenticates is upgraded to a token cookie so the next request skips
/// the session store entirely.
pub struct Resolver {
    crypto: Crypto,
    jar: Jar,
    policies: Policies,
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionLayer>,
    session_cookie: String,
    timeout: Duration,
    touch_rate: f64,
}

impl Resolver {
    pub fn new(
        settings: &Settings,
        policies: Policies,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionLayer>,
    ) -> Self {
        Self {
            crypto: Crypto::from_settings(settings),
            jar: Jar::from_settings(settings),
            policies,
            users,
            sessions,
            session_cookie: settings.session_cookie.clone(),
            timeout: settings.lookup_timeout,
            touch_rate: settings.touch_rate(),
        }
    }
    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }
    pub fn jar(&self) -> &Jar {
        &self.jar
    }
    pub fn policies(&self) -> &Policies {
        &self.policies
    }
    pub fn credentials(&self, req: &HttpRequest) -> Credentials {
        Credentials::from_request(req, &self.session_cookie)
    }

    /// Never fails: every error path degrades to an anonymous resolution.
    pub async fn resolve(&self, credentials: &Credentials) -> Resolution {
        let policy = self.policies.current();
        let mut rejection = Rejection::Missing;
        if let Some(token) = credentials.token() {
            match policy.jwt_enabled {
                false => rejection = Rejection::Disabled,
                true => match self.crypto.verify(token).map(|c| c.uid()) {
                    Some(uid) if uid > ANONYMOUS => return self.by_token(uid).await,
                    _ => rejection = Rejection::Invalid,
                },
            }
        }
        if !policy.session_enabled {
            return Resolution::anonymous(match credentials.session().is_some() || credentials.sid().is_some() {
                true => Rejection::Disabled,
                false => rejection,
            });
        }
        match self.session(credentials).await {
            Ok(Some(session)) => match session.uid() {
                Some(uid) => self.by_session(uid, &session, &policy).await,
                None => Resolution::anonymous(rejection),
            },
            Ok(None) => Resolution::anonymous(rejection),
            Err(e) => {
                log::error!("[hybrid] session lookup failed: {:#}", e);
                Resolution::anonymous(Rejection::Unavailable)
            }
        }
    }

    /// A verified token is authoritative: if its user is gone or banned the
    /// request stays anonymous and no session is consulted.
    async fn by_token(&self, uid: Uid) -> Resolution {
        match self.check(uid).await {
            Ok(uid) => {
                log::debug!("[hybrid] user {} authenticated via token", uid);
                self.touch(uid);
                Resolution::authenticated(uid, Method::Jwt, None)
            }
            Err(rejection) => Resolution::anonymous(rejection),
        }
    }

    async fn by_session(&self, uid: Uid, session: &SessionRef, policy: &Policy) -> Resolution {
        match self.check(uid).await {
            Ok(uid) => {
                log::debug!("[hybrid] user {} authenticated via session", uid);
                let cookie = match policy.jwt_enabled {
                    true => self.mint(uid, session.remember(), policy),
                    false => None,
                };
                Resolution::authenticated(uid, Method::Session, cookie)
            }
            Err(rejection) => Resolution::anonymous(rejection),
        }
    }

    /// Existence and ban check, bounded by the lookup timeout.
    async fn check(&self, uid: Uid) -> Result<Uid, Rejection> {
        match tokio::time::timeout(self.timeout, self.users.fields(uid)).await {
            Err(_) => {
                log::error!("[hybrid] lookup of user {} timed out", uid);
                Err(Rejection::Unavailable)
            }
            Ok(Err(e)) => {
                log::error!("[hybrid] lookup of user {} failed: {:#}", uid, e);
                Err(Rejection::Unavailable)
            }
            Ok(Ok(None)) => {
                log::warn!("[hybrid] user {} not found", uid);
                Err(Rejection::Unknown)
            }
            Ok(Ok(Some(user))) if user.uid == ANONYMOUS => {
                log::warn!("[hybrid] user {} has no uid on record", uid);
                Err(Rejection::Unknown)
            }
            Ok(Ok(Some(user))) if user.banned => {
                log::info!("[hybrid] user {} is banned", uid);
                Err(Rejection::Banned)
            }
            Ok(Ok(Some(_))) => Ok(uid),
        }
    }

    /// Session attached to the request, else the one its session id names.
    pub async fn session(&self, credentials: &Credentials) -> anyhow::Result<Option<SessionRef>> {
        if let Some(session) = credentials.session() {
            return Ok(Some(session.clone()));
        }
        match credentials.sid() {
            None => Ok(None),
            Some(sid) => tokio::time::timeout(self.timeout, self.sessions.load(sid))
                .await
                .map_err(|_| anyhow::anyhow!("session lookup timed out"))?,
        }
    }

    /// Token cookie for `uid`; token and cookie share one lifetime.
    fn mint(&self, uid: Uid, remember: bool, policy: &Policy) -> Option<Cookie<'static>> {
        let lifetime = policy.lifetime(remember);
        match self.crypto.generate(uid, remember, policy) {
            Ok(token) => {
                log::debug!("[hybrid] token issued for user {} (remember: {})", uid, remember);
                Some(self.jar.issue(token, lifetime))
            }
            Err(e) => {
                log::error!("[hybrid] token signing for user {} failed: {}", uid, e);
                None
            }
        }
    }

    /// Sampled, detached "last seen" refresh. Never awaited.
    fn touch(&self, uid: Uid) {
        if !rand::random_bool(self.touch_rate) {
            return;
        }
        let users = self.users.clone();
        tokio::spawn(async move {
            if let Err(e) = users.touch(uid).await {
                log::error!("[touch] last-seen update for user {} failed: {:#}", uid, e);
            }
        });
    }

    /// Token cookie for an already-authenticated principal, outside the
    /// resolve flow. `None` when anonymous or tokens are disabled.
    pub fn migration(
        &self,
        principal: &Principal,
        session: Option<&SessionRef>,
    ) -> Option<Cookie<'static>> {
        let policy = self.policies.current();
        match principal.is_authenticated() && policy.jwt_enabled {
            true => self.mint(principal.uid(), session.is_some_and(SessionRef::remember), &policy),
            false => None,
        }
    }

    /// Attaches a migration cookie to `res`. Reports whether one was set.
    pub fn migrate(
        &self,
        principal: &Principal,
        session: Option<&SessionRef>,
        res: &mut HttpResponse,
    ) -> bool {
        match self.migration(principal, session) {
            None => false,
            Some(cookie) => match res.add_cookie(&cookie) {
                Ok(()) => {
                    log::debug!("[hybrid] user {} migrated to token", principal.uid());
                    true
                }
                Err(e) => {
                    log::error!("[hybrid] migration cookie rejected: {}", e);
                    false
                }
            },
        }
    }

    /// Which credentials are present, verified or not. Diagnostic only.
    pub async fn classify(&self, credentials: &Credentials) -> Method {
        let token = credentials.token().is_some();
        let session = match self.session(credentials).await {
            Ok(session) => session.is_some_and(|s| s.has_user()),
            Err(e) => {
                log::debug!("[hybrid] session unavailable for classification: {:#}", e);
                false
            }
        };
        Method::from((token, session))
    }
}

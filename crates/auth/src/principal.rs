use gk_core::ANONYMOUS;
use gk_core::Uid;
use serde::Deserialize;
use serde::Serialize;

/// Which credential established, or would establish, a request's identity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    None,
    Jwt,
    Session,
    Hybrid,
}

/// (token present, session present)
impl From<(bool, bool)> for Method {
    fn from((token, session): (bool, bool)) -> Self {
        match (token, session) {
            (true, true) => Self::Hybrid,
            (true, false) => Self::Jwt,
            (false, true) => Self::Session,
            (false, false) => Self::None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Jwt => write!(f, "jwt"),
            Self::Session => write!(f, "session"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Minimal user reference handed to downstream handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub uid: Uid,
}

/// Resolved identity of a single request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    uid: Uid,
    authenticated: bool,
    method: Method,
    user: Option<UserRef>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            uid: ANONYMOUS,
            authenticated: false,
            method: Method::None,
            user: None,
        }
    }
    pub fn authenticated(uid: Uid, method: Method) -> Self {
        Self {
            uid,
            authenticated: uid > ANONYMOUS,
            method,
            user: Some(UserRef { uid }),
        }
    }
    pub fn uid(&self) -> Uid {
        self.uid
    }
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
    pub fn method(&self) -> Method {
        self.method
    }
    pub fn user(&self) -> Option<UserRef> {
        self.user
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::anonymous()
    }
}

//! Hybrid token and legacy-session authentication.
//!
//! Every request is resolved to a [`Principal`]: a signed token is tried
//! first, and a legacy server-side session is consulted only when no
//! token verifies. A session that authenticates is migrated by attaching a
//! fresh token cookie to the response.
//!
//! ## Token Service
//!
//! - [`Claims`]: Token payload bound to one deployment
//! - [`Crypto`]: HS256 signing and verification
//! - [`Jar`]: Token cookie issuance and removal
//! - [`Credentials`]: What a request presents, see [`extract`]
//!
//! ## Resolution
//!
//! - [`Resolver`]: Per-request state machine producing a [`Resolution`]
//! - [`Policy`] / [`Policies`]: Feature switches and lifetimes, swappable at runtime
//! - [`Settings`] / [`Config`]: Deployment values loaded at startup
//!
//! ## Collaborators
//!
//! - [`UserStore`]: Existence, ban status, last-seen bookkeeping
//! - [`SessionLayer`]: Read access to legacy sessions
//!
//! In-memory adapters back both; with the `database` feature a
//! `tokio_postgres::Client` does too.
mod claims;
mod cookies;
mod credentials;
mod crypto;
mod handlers;
mod hybrid;
mod middleware;
mod policy;
mod principal;
mod sessions;
mod settings;
mod store;

pub use claims::*;
pub use cookies::*;
pub use credentials::*;
pub use crypto::*;
pub use handlers::*;
pub use hybrid::*;
pub use middleware::*;
pub use policy::*;
pub use principal::*;
pub use sessions::*;
pub use settings::*;
pub use store::*;

#[cfg(feature = "database")]
mod repository;

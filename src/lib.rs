//! Hybrid token and legacy-session authentication.
//!
//! This facade crate re-exports the gatekeep crates for convenient access.
//!
//! ## Crate Organization
//!
//! - [`core`]: Uid alias, defaults, clock, logging bootstrap
//! - [`database`]: PostgreSQL connectivity and table names
//! - [`auth`]: Token service, hybrid resolver, middleware, handlers
//! - [`server`]: actix-web route table and server entry point

pub use gk_core     as core;
pub use gk_database as database;
pub use gk_auth     as auth;
pub use gk_server   as server;

// Re-export commonly used types at the root
pub use gk_auth::*;

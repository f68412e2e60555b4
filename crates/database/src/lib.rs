//! PostgreSQL connectivity for the user and session stores.
//!
//! ## Connectivity
//!
//! - [`db()`]: Establishes a database connection from a connection string
//!
//! ## Table Names
//!
//! Constants for the tables the authentication layer reads: registered
//! users and the legacy server-side session table.
use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection.
///
/// Spawns the connection driver onto the current tokio runtime and returns
/// an `Arc<Client>` suitable for sharing across async tasks.
pub async fn db(url: &str) -> Result<Arc<Client>, PgErr> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(url, tls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    Ok(Arc::new(client))
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for registered user accounts.
#[rustfmt::skip]
pub const USERS:    &str = "users";
/// Table for legacy server-side sessions (connect-pg-simple layout).
#[rustfmt::skip]
pub const SESSIONS: &str = "session";

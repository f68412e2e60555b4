//! Core type aliases, constants, and runtime helpers for gatekeep.
//!
//! Everything here is shared by the token service, the hybrid resolver,
//! and the operator binaries. Defaults mirror what a fresh deployment
//! runs with before any policy has been persisted.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Numeric user identifier. Zero is reserved for anonymous visitors.
pub type Uid = u64;
/// Seconds since the Unix epoch, as carried in token claims.
pub type Epoch = i64;

/// The uid every anonymous request resolves to.
pub const ANONYMOUS: Uid = 0;

// ============================================================================
// TRANSPORT
// ============================================================================
/// Cookie carrying the signed token.
pub const TOKEN_COOKIE: &str = "jwt_token";
/// Scheme prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";
/// Cookie carrying the legacy session id.
pub const SESSION_COOKIE: &str = "express.sid";
/// Cookie path when no base path is configured.
pub const DEFAULT_BASE_PATH: &str = "/";

// ============================================================================
// POLICY DEFAULTS
// ============================================================================
/// Lifetime of an ordinary token (seconds).
pub const TOKEN_EXPIRY_SECS: u64 = 1200;
/// Lifetime of a "remember me" token (days).
pub const REMEMBER_EXPIRY_DAYS: u64 = 14;
/// Seconds in a day.
pub const DAY_SECS: u64 = 24 * 60 * 60;
/// Sessions whose cookie outlives this are migrated to "remember me" tokens.
pub const REMEMBER_THRESHOLD: std::time::Duration = std::time::Duration::from_secs(DAY_SECS);
/// Longest lifetime any token is signed for, whatever the policy says.
pub const MAX_LIFETIME_SECS: u64 = 10 * 365 * DAY_SECS;

// ============================================================================
// RESOLVER TUNING
// ============================================================================
/// Probability that a token-authenticated request refreshes "last seen".
pub const TOUCH_RATE: f64 = 0.1;
/// Upper bound on a single user-store or session-store call.
pub const LOOKUP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

// ============================================================================
// CLOCK
// ============================================================================
/// Wall-clock time in whole seconds since the Unix epoch.
/// A clock set before 1970 reads as zero rather than failing.
pub fn now() -> Epoch {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as Epoch)
        .unwrap_or_default()
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
/// Falls back to terminal-only logging when the file cannot be created.
#[cfg(feature = "server")]
pub fn log() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![term];
    match std::fs::create_dir_all("logs")
        .and_then(|_| std::fs::File::create(format!("logs/{}.log", now())))
    {
        Ok(file) => loggers.push(simplelog::WriteLogger::new(
            log::LevelFilter::Debug,
            config,
            file,
        )),
        Err(e) => eprintln!("log file unavailable: {}", e),
    }
    if let Err(e) = simplelog::CombinedLogger::init(loggers) {
        eprintln!("logger already initialized: {}", e);
    }
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, exiting immediately");
            std::process::exit(0);
        }
    });
}

//! Backend Binary
//!
//! Serves the hybrid-authenticated API. Configuration comes from
//! CONFIG_PATH (default config.json) with JWT_SECRET, CANONICAL_URL,
//! BIND_ADDR and DB_URL taking precedence. SIGHUP re-reads the policy.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gk_core::log();
    gk_core::kys();
    gk_server::run().await
}

//! Probe Binary
//!
//! Exercises a running backend: presents one token as a Bearer header and
//! as a cookie, then asks which mechanism the server saw. Exits non-zero
//! when the Bearer request is not accepted.
//!
//! Options: --base, --uid, --token, --remember

use anyhow::Context;
use clap::Parser;
use gk_auth::Config;
use gk_auth::Crypto;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::header::COOKIE;

#[derive(Parser)]
#[command(author, version, about = "Probe token authentication end to end", long_about = None)]
struct Probe {
    /// Backend base url (defaults to the configured canonical url)
    #[arg(long)]
    base: Option<String>,
    /// Mint a token for this uid with the configured secret
    #[arg(long, default_value_t = 1)]
    uid: u64,
    /// Present this token instead of minting one
    #[arg(long)]
    token: Option<String>,
    /// Mint a "remember me" token
    #[arg(long)]
    remember: bool,
}

impl Probe {
    fn token(&self, config: &Config) -> anyhow::Result<String> {
        match self.token.clone() {
            Some(token) => Ok(token),
            None => {
                anyhow::ensure!(self.uid > gk_core::ANONYMOUS, "uid must be positive");
                Crypto::from_settings(&config.settings)
                    .generate(self.uid, self.remember, &config.policy)
                    .context("signing token")
            }
        }
    }
}

async fn report(label: &str, req: reqwest::RequestBuilder) -> anyhow::Result<StatusCode> {
    let res = req.send().await.with_context(|| format!("{} request", label))?;
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    log::info!("{:<8} {} {}", label, status, body);
    Ok(status)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gk_core::log();
    let probe = Probe::parse();
    let config = Config::load()?;
    let token = probe.token(&config)?;
    let base = probe
        .base
        .clone()
        .unwrap_or_else(|| config.settings.canonical_url.clone());
    let base = base.trim_end_matches('/');
    let client = reqwest::Client::new();
    let bearer = report(
        "bearer",
        client
            .get(format!("{}/api/self", base))
            .header(AUTHORIZATION, format!("{}{}", gk_core::BEARER_PREFIX, token)),
    )
    .await?;
    report(
        "cookie",
        client
            .get(format!("{}/api/self", base))
            .header(COOKIE, format!("{}={}", gk_core::TOKEN_COOKIE, token)),
    )
    .await?;
    report(
        "method",
        client
            .get(format!("{}/auth/method", base))
            .header(AUTHORIZATION, format!("{}{}", gk_core::BEARER_PREFIX, token)),
    )
    .await?;
    anyhow::ensure!(bearer == StatusCode::OK, "bearer request returned {}", bearer);
    Ok(())
}

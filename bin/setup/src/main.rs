//! Setup Binary
//!
//! Writes the authentication policy into the config file, keeping every
//! other key intact. A running backend picks the change up on SIGHUP.
//!
//! Options: --config, --jwt, --token-expiry, --remember-expiry, --session

use clap::ArgAction;
use clap::Parser;
use gk_auth::Config;
use gk_auth::ConfigFile;
use gk_auth::Policy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Set hybrid authentication policy", long_about = None)]
struct Setup {
    /// Config file to update (defaults to CONFIG_PATH, then config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Accept and issue signed tokens
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    jwt: bool,
    /// Ordinary token lifetime in seconds
    #[arg(long, default_value_t = gk_core::TOKEN_EXPIRY_SECS)]
    token_expiry: u64,
    /// "Remember me" token lifetime in days
    #[arg(long, default_value_t = gk_core::REMEMBER_EXPIRY_DAYS)]
    remember_expiry: u64,
    /// Fall back to legacy sessions
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    session: bool,
}

impl Setup {
    fn policy(&self) -> anyhow::Result<Policy> {
        anyhow::ensure!(self.token_expiry > 0, "token expiry must be positive");
        anyhow::ensure!(self.remember_expiry > 0, "remember expiry must be positive");
        Ok(Policy {
            jwt_enabled: self.jwt,
            token_expiry_secs: self.token_expiry,
            remember_expiry_days: self.remember_expiry,
            session_enabled: self.session,
        })
    }
}

fn main() -> anyhow::Result<()> {
    gk_core::log();
    let setup = Setup::parse();
    let policy = setup.policy()?;
    let path = setup.config.clone().unwrap_or_else(Config::path);
    let mut file = ConfigFile::read(&path)?;
    let before = file.policy();
    file.set_policy(&policy);
    file.write(&path)?;
    log::info!("policy written to {}", path.display());
    log::info!("was: {:?}", before);
    log::info!("now: {:?}", file.policy());
    Ok(())
}

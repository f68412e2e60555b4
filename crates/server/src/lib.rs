//! Backend Server
//!
//! Mounts the hybrid authentication middleware in front of every route
//! and serves the authentication endpoints on an actix-web server.
//!
//! ## Routes
//!
//! - `GET  /health`: liveness, plus a database ping when one is configured
//! - `GET  /api/self`: the resolved principal; 401 when anonymous
//! - `POST /auth/upgrade`: issue a token cookie to an authenticated principal
//! - `POST /auth/logout`: clear the token cookie
//! - `GET  /auth/method`: which credentials the request presents

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::middleware::from_fn;
use actix_web::web;
use gk_auth::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_postgres::Client;

async fn health(client: Option<web::Data<Arc<Client>>>) -> impl Responder {
    let Some(client) = client else {
        return HttpResponse::Ok().body("ok");
    };
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

/// Route table. The caller supplies the `Resolver` and the middleware.
#[rustfmt::skip]
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/api")
                .route("/self", web::get().to(gk_auth::me)),
        )
        .service(
            web::scope("/auth")
                .route("/upgrade", web::post().to(gk_auth::upgrade))
                .route("/logout", web::post().to(gk_auth::logout))
                .route("/method", web::get().to(gk_auth::method)),
        );
}

/// User and session stores backed by `client`, or in-process tables.
pub fn stores(client: Option<Arc<Client>>) -> (Arc<dyn UserStore>, Arc<dyn SessionLayer>) {
    match client {
        Some(client) => (Arc::new(client.clone()), Arc::new(client)),
        None => {
            log::warn!("no DB_URL set, using in-memory user and session stores");
            (
                Arc::new(MemoryStore::default()),
                Arc::new(MemorySessions::default()),
            )
        }
    }
}

/// Re-reads the policy from the config file on SIGHUP.
/// Settings are fixed for the life of the process; only the policy moves.
#[cfg(unix)]
pub fn reload(policies: Policies, path: PathBuf) -> std::io::Result<()> {
    use tokio::signal::unix::SignalKind;
    let mut hangups = tokio::signal::unix::signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            match ConfigFile::read(&path) {
                Ok(file) => {
                    policies.replace(file.policy());
                }
                Err(e) => log::error!("policy reload failed: {:#}", e),
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn reload(_: Policies, _: PathBuf) -> std::io::Result<()> {
    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    let settings = config.settings;
    let policies = Policies::new(config.policy);
    reload(policies.clone(), Config::path())?;
    let client = match settings.db_url.as_deref() {
        Some(url) => Some(gk_database::db(url).await?),
        None => None,
    };
    let (users, sessions) = stores(client.clone());
    let resolver = web::Data::new(Resolver::new(&settings, policies, users, sessions));
    let client = client.map(web::Data::new);
    log::info!(
        "starting server on {} for {} (policy: {:?})",
        settings.bind_addr,
        settings.canonical_url,
        resolver.policies().current()
    );
    HttpServer::new(move || {
        let app = App::new()
            .wrap(from_fn(hybrid))
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials(),
            )
            .app_data(resolver.clone())
            .configure(routes);
        match client.clone() {
            Some(client) => app.app_data(client),
            None => app,
        }
    })
    .bind(&settings.bind_addr)?
    .run()
    .await?;
    Ok(())
}

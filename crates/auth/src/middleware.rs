use super::*;
use actix_web::FromRequest;
use actix_web::HttpMessage;
use actix_web::HttpRequest;
use actix_web::body::MessageBody;
use actix_web::dev::Payload;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::middleware::Next;
use actix_web::web;
use std::future::Ready;
use std::future::ready;

/// Resolves every request before it reaches a handler.
///
/// Mount with `actix_web::middleware::from_fn(hybrid)` alongside a
/// `web::Data<Resolver>`. The resolved [`Principal`] is left in request
/// extensions; a migration cookie, if one was minted, is appended to
/// whatever response the downstream service produces.
pub async fn hybrid(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let resolver = req
        .app_data::<web::Data<Resolver>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("resolver not configured"))?;
    let credentials = resolver.credentials(req.request());
    if log::log_enabled!(log::Level::Trace) {
        let method = resolver.classify(&credentials).await;
        log::trace!("[hybrid] {} {} presents {}", req.method(), req.path(), method);
    }
    let resolution = resolver.resolve(&credentials).await;
    req.extensions_mut().insert(resolution.principal());
    let mut res = next.call(req).await?;
    if let Some(cookie) = resolution.cookie() {
        if let Err(e) = res.response_mut().add_cookie(cookie) {
            log::error!("[hybrid] could not attach token cookie: {}", e);
        }
    }
    Ok(res)
}

/// Anonymous when the middleware did not run.
impl FromRequest for Principal {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Principal>()
            .copied()
            .unwrap_or_default()))
    }
}

/// Extractor for endpoints that require a user.
pub struct Auth(pub Principal);

impl Auth {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
    pub fn uid(&self) -> gk_core::Uid {
        self.0.uid()
    }
}

impl FromRequest for Auth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req
            .extensions()
            .get::<Principal>()
            .copied()
            .unwrap_or_default();
        ready(match principal.is_authenticated() {
            true => Ok(Auth(principal)),
            false => Err(actix_web::error::ErrorUnauthorized("not authenticated")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::HttpResponse;
    use actix_web::Responder;
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::middleware::from_fn;
    use actix_web::test;
    use std::sync::Arc;
    use std::time::Duration;

    const SECRET: &str = "correct horse battery staple";
    const URL: &str = "http://localhost:4567";

    async fn whoami(principal: Principal) -> impl Responder {
        HttpResponse::Ok().json(principal)
    }

    async fn secret(auth: Auth) -> impl Responder {
        HttpResponse::Ok().body(auth.uid().to_string())
    }

    async fn resolver() -> (web::Data<Resolver>, Arc<MemorySessions>) {
        let users = Arc::new(MemoryStore::default());
        let sessions = Arc::new(MemorySessions::default());
        users.insert(7).await;
        sessions.insert("s7", SessionRef::of(7, Duration::from_secs(3600))).await;
        let mut settings = Settings::new(SECRET, URL);
        settings.touch_rate = 0.0;
        let resolver = Resolver::new(&settings, Policies::default(), users, sessions.clone());
        (web::Data::new(resolver), sessions)
    }

    #[actix_web::test]
    async fn principal_defaults_to_anonymous_without_middleware() {
        let app = test::init_service(App::new().route("/", web::get().to(whoami))).await;
        let principal: Principal =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(principal, Principal::anonymous());
    }

    #[actix_web::test]
    async fn auth_rejects_anonymous() {
        let (resolver, _) = resolver().await;
        let app = test::init_service(
            App::new()
                .app_data(resolver)
                .wrap(from_fn(hybrid))
                .route("/", web::get().to(secret)),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn bearer_reaches_handler() {
        let (resolver, _) = resolver().await;
        let token = resolver.crypto().generate(7, false, &Policy::default()).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(resolver)
                .wrap(from_fn(hybrid))
                .route("/", web::get().to(secret)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "7");
    }

    #[actix_web::test]
    async fn session_request_gets_token_cookie() {
        let (resolver, sessions) = resolver().await;
        let app = test::init_service(
            App::new()
                .app_data(resolver)
                .wrap(from_fn(hybrid))
                .route("/", web::get().to(whoami)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .cookie(Cookie::new(gk_core::SESSION_COOKIE, "s7"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(sessions.loads(), 1);
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == gk_core::TOKEN_COOKIE)
            .expect("token cookie");
        assert_eq!(cookie.http_only(), Some(true));
        let principal: Principal = test::read_body_json(res).await;
        assert_eq!(principal, Principal::authenticated(7, Method::Session));
    }

    #[actix_web::test]
    async fn missing_resolver_is_a_server_error() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(hybrid))
                .route("/", web::get().to(whoami)),
        )
        .await;
        let res = test::try_call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let status = match res {
            Ok(res) => res.status(),
            Err(e) => e.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

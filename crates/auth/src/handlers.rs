use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;

pub async fn me(auth: Auth) -> impl Responder {
    HttpResponse::Ok().json(auth.principal())
}

/// Issues a token cookie to a principal that does not carry one yet.
pub async fn upgrade(
    req: HttpRequest,
    principal: Principal,
    resolver: web::Data<Resolver>,
) -> impl Responder {
    if !principal.is_authenticated() {
        return HttpResponse::Unauthorized().body("not authenticated");
    }
    let session = match resolver.session(&resolver.credentials(&req)).await {
        Ok(session) => session,
        Err(e) => {
            log::error!("[hybrid] session unavailable for upgrade: {:#}", e);
            None
        }
    };
    let mut res = HttpResponse::Ok().json(serde_json::json!({ "migrated": true }));
    match resolver.migrate(&principal, session.as_ref(), &mut res) {
        true => res,
        false => HttpResponse::Ok().json(serde_json::json!({ "migrated": false })),
    }
}

/// Always succeeds, with or without a cookie to clear.
pub async fn logout(resolver: web::Data<Resolver>) -> impl Responder {
    let mut res = HttpResponse::Ok().json(serde_json::json!({ "status": "logged_out" }));
    match resolver.jar().clear_cookie(&mut res) {
        Ok(()) => res,
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

pub async fn method(req: HttpRequest, resolver: web::Data<Resolver>) -> impl Responder {
    let method = resolver.classify(&resolver.credentials(&req)).await;
    HttpResponse::Ok().json(serde_json::json!({ "method": method }))
}

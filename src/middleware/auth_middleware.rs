use crate::errors::ApiError;
use crate::handlers::auth::{TokenCodec, TokenError};
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready};
use log::warn;
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Resolves the caller's identity from the access-token cookie or, failing
/// that, an `Authorization: Bearer` header. Requests without a token pass
/// through as guests; a token that does not verify halts the request with 401.
pub struct AuthResolver {
    codec: Rc<TokenCodec>,
    cookie_name: Rc<str>,
}

impl AuthResolver {
    pub fn new(codec: TokenCodec, cookie_name: impl Into<String>) -> Self {
        AuthResolver {
            codec: Rc::new(codec),
            cookie_name: Rc::from(cookie_name.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthResolver
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthResolverMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthResolverMiddleware {
            service: Rc::new(service),
            codec: self.codec.clone(),
            cookie_name: self.cookie_name.clone(),
        })
    }
}

pub struct AuthResolverMiddleware<S> {
    service: Rc<S>,
    codec: Rc<TokenCodec>,
    cookie_name: Rc<str>,
}

fn request_token(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl<S, B> Service<ServiceRequest> for AuthResolverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let codec = self.codec.clone();
        let cookie_name = self.cookie_name.clone();

        Box::pin(async move {
            if let Some(token) = request_token(&req, &cookie_name) {
                match codec.parse(&token) {
                    Ok(claims) => {
                        req.extensions_mut().insert(claims);
                    }
                    Err(e) => {
                        warn!("Rejected token on {} {}: {}", req.method(), req.path(), e);
                        let message = match e {
                            TokenError::Expired => "Token expired",
                            _ => "Invalid token",
                        };
                        let response = ApiError::unauthorized(message).error_response();
                        return Ok(req.into_response(response).map_into_right_body());
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::auth::Claims;
    use crate::models::all_models::Role;
    use actix_web::{cookie::Cookie, test, web, App, HttpResponse};
    use chrono::{Duration, Utc};

    fn codec() -> TokenCodec {
        TokenCodec::new("middleware-secret", Duration::hours(1))
    }

    fn claims(username: &str, role: Role) -> Claims {
        Claims {
            matricula: format!("m-{}", username),
            email: format!("{}@example.com", username),
            username: username.to_string(),
            role,
            phone_number: None,
            plan_type: None,
            start_date: None,
            end_date: None,
        }
    }

    async fn whoami(claims: Option<Claims>) -> HttpResponse {
        match claims {
            Some(c) => HttpResponse::Ok().body(c.username),
            None => HttpResponse::Ok().body("guest"),
        }
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .wrap(AuthResolver::new(codec(), "accessToken"))
                    .route("/whoami", web::get().to(whoami)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn no_token_proceeds_as_guest() {
        let app = app!();
        let req = test::TestRequest::get().uri("/whoami").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "guest");
    }

    #[actix_web::test]
    async fn bearer_token_attaches_identity() {
        let app = app!();
        let token = codec().issue(&claims("ana", Role::User)).unwrap();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ana");
    }

    #[actix_web::test]
    async fn cookie_wins_over_header() {
        let app = app!();
        let from_cookie = codec().issue(&claims("cookie", Role::User)).unwrap();
        let from_header = codec().issue(&claims("header", Role::Admin)).unwrap();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new("accessToken", from_cookie))
            .insert_header(("Authorization", format!("Bearer {}", from_header)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "cookie");
    }

    #[actix_web::test]
    async fn bearer_scheme_is_case_insensitive() {
        let app = app!();
        let token = codec().issue(&claims("ana", Role::User)).unwrap();
        for scheme in ["bearer", "BEARER"] {
            let req = test::TestRequest::get()
                .uri("/whoami")
                .insert_header(("Authorization", format!("{} {}", scheme, token)))
                .to_request();
            let body = test::call_and_read_body(&app, req).await;
            assert_eq!(body, "ana");
        }

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn non_bearer_header_is_ignored() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Basic YW5hOnB3"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "guest");
    }

    #[actix_web::test]
    async fn expired_token_is_rejected_with_401() {
        let app = app!();
        let token = codec()
            .issue_at(&claims("ana", Role::User), Utc::now() - Duration::hours(2))
            .unwrap();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Token expired");
    }

    #[actix_web::test]
    async fn invalid_cookie_token_is_not_downgraded_to_guest() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new("accessToken", "garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid token");
    }
}

use crate::errors::ApiError;
use crate::handlers::auth::Claims;
use crate::models::all_models::Role;
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, Ready};
use log::info;
use std::{
    collections::HashSet,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Admits a request only when the resolved identity holds one of the listed
/// roles. Must sit behind [`AuthResolver`](super::auth_middleware::AuthResolver).
pub struct RoleGate {
    allowed: Rc<HashSet<Role>>,
}

impl RoleGate {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        RoleGate {
            allowed: Rc::new(roles.into_iter().collect()),
        }
    }

    pub fn admin() -> Self {
        RoleGate::new([Role::Admin])
    }

    pub fn member() -> Self {
        RoleGate::new([Role::Admin, Role::User])
    }
}

pub fn check_role(claims: Option<&Claims>, allowed: &HashSet<Role>) -> Result<(), ApiError> {
    match claims {
        None => Err(ApiError::unauthorized("Authorization required")),
        Some(c) if allowed.contains(&c.role) => Ok(()),
        Some(_) => Err(ApiError::forbidden("Insufficient permissions")),
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RoleGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RoleGateMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        })
    }
}

pub struct RoleGateMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<HashSet<Role>>,
}

impl<S, B> Service<ServiceRequest> for RoleGateMiddleware<S>
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
        let allowed = self.allowed.clone();

        Box::pin(async move {
            let verdict = check_role(req.extensions().get::<Claims>(), &allowed);
            if let Err(e) = verdict {
                info!("Denied {} {}: {}", req.method(), req.path(), e);
                let response = e.error_response();
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

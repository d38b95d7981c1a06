use crate::handlers::auth::Claims;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::{error, info, warn};
use std::{rc::Rc, time::Instant};

// Request logger middleware. Logs the caller as "guest" or by matricula/role
// once the auth resolver has run further down the chain.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

fn caller(res: &ServiceResponse<impl Sized>) -> String {
    match res.request().extensions().get::<Claims>() {
        Some(claims) => format!("{} ({})", claims.matricula, claims.role),
        None => "guest".to_string(),
    }
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_owned();

        info!("[BELIEVE-REQUEST] {} - {} {}", client_ip, method, path);

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start_time.elapsed();

            match &res {
                Ok(response) => {
                    let status = response.status();
                    let who = caller(response);
                    if status.is_server_error() {
                        error!(
                            "[BELIEVE-RESPONSE] {} - {} {} - Caller: {} - Status: {} - Time: {:.2?}",
                            client_ip, method, path, who, status.as_u16(), elapsed
                        );
                    } else if status.is_client_error() {
                        warn!(
                            "[BELIEVE-RESPONSE] {} - {} {} - Caller: {} - Status: {} - Time: {:.2?}",
                            client_ip, method, path, who, status.as_u16(), elapsed
                        );
                    } else {
                        info!(
                            "[BELIEVE-RESPONSE] {} - {} {} - Caller: {} - Status: {} - Time: {:.2?}",
                            client_ip, method, path, who, status.as_u16(), elapsed
                        );
                    }
                }
                Err(err) => {
                    error!(
                        "[BELIEVE-ERROR] {} - {} {} - Error: {} - Time: {:.2?}",
                        client_ip, method, path, err, elapsed
                    );
                }
            }

            res
        })
    }
}

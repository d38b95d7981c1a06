use crate::errors::ApiError;
use crate::handlers::auth::Claims;
use crate::handlers::verification::{set_admin_code, verify_admin_code};
use crate::middleware::role_gate::RoleGate;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: String,
}

pub async fn set_code(
    store: web::Data<dyn Store>,
    claims: Claims,
    payload: web::Json<CodeRequest>,
) -> Result<HttpResponse, ApiError> {
    set_admin_code(store.get_ref(), &payload.code).await?;
    info!("Admin code replaced by {}", claims.matricula);
    Ok(HttpResponse::Ok().json(json!({ "message": "Verification code saved" })))
}

pub async fn get_code(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let current = store
        .admin_code()
        .await?
        .ok_or_else(|| ApiError::not_found("No verification code has been set"))?;
    Ok(HttpResponse::Ok().json(current))
}

//Verify Code
//Marks the caller as verified when the submitted code matches
pub async fn verify_code(
    store: web::Data<dyn Store>,
    claims: Claims,
    payload: web::Json<CodeRequest>,
) -> Result<HttpResponse, ApiError> {
    verify_admin_code(store.get_ref(), &claims.matricula, &payload.code).await?;
    info!("Member {} verified", claims.matricula);
    Ok(HttpResponse::Ok().json(json!({ "message": "Member verified" })))
}

pub fn config_verification_code_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/set-code", web::post().to(set_code).wrap(RoleGate::admin()))
        .route("/get-code", web::get().to(get_code).wrap(RoleGate::admin()))
        .route(
            "/verify-code",
            web::post().to(verify_code).wrap(RoleGate::member()),
        );
}

use crate::config::SessionCookie;
use crate::errors::ApiError;
use crate::handlers::auth::{Claims, TokenCodec};
use crate::handlers::password::{hash_password, verify_password};
use crate::handlers::validation::{normalize_member_phone, require, valid_email};
use crate::models::all_models::{Member, NewMember, PlanType, Role};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

//Register Request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub matricula: String,
    pub phone_number: String,
    #[serde(default)]
    pub plan_type: Option<PlanType>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

//Register
//Register Input: RegisterRequest
//Register Output: Member (201)
pub async fn register(
    store: web::Data<dyn Store>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let username = require(&payload.username, "Username")?;
    let matricula = require(&payload.matricula, "Matricula")?;
    let email = require(&payload.email, "Email")?.to_lowercase();
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }
    if !valid_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    let phone_number = normalize_member_phone(&payload.phone_number)?;

    if store.find_member_by_email(&email).await?.is_some() {
        return Err(ApiError::validation("Email already registered"));
    }
    if store.find_member(&matricula).await?.is_some() {
        return Err(ApiError::validation("Matricula already registered"));
    }

    let plan_type = payload.plan_type.unwrap_or_default();
    let start_date = payload
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let end_date = plan_type
        .end_date(start_date)
        .ok_or_else(|| ApiError::validation("Start date out of range"))?;

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::Internal("Failed to hash password".to_string())
    })?;

    let member = store
        .insert_member(NewMember {
            matricula,
            username,
            email,
            password_hash,
            phone_number,
            role: Role::User,
            plan_type,
            start_date,
            end_date,
        })
        .await?;

    info!("Registered member {} ({})", member.matricula, member.plan_type);
    Ok(HttpResponse::Created().json(member))
}

//Login Request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//Login Response
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub member: Member,
}

//Login
//Login Input: LoginRequest
//Login Output: LoginResponse + access cookie
pub async fn login(
    store: web::Data<dyn Store>,
    codec: web::Data<TokenCodec>,
    cookie: web::Data<SessionCookie>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let invalid = || ApiError::validation("Invalid credentials");

    let member = store
        .find_member_by_email(&payload.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    let verified = verify_password(&payload.password, &member.password_hash).map_err(|e| {
        error!("Stored password hash for {} is unreadable: {}", member.matricula, e);
        ApiError::Internal("Error verifying password".to_string())
    })?;
    if !verified {
        return Err(invalid());
    }

    let token = codec.issue(&Claims::from(&member)).map_err(|e| {
        error!("Failed to issue token: {}", e);
        ApiError::Internal("Failed to issue token".to_string())
    })?;

    info!("Member {} logged in", member.matricula);
    Ok(HttpResponse::Ok()
        .cookie(cookie.build(&token, codec.ttl()))
        .json(LoginResponse {
            message: "Login successful",
            token,
            member,
        }))
}

//Logout
pub async fn logout(cookie: web::Data<SessionCookie>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookie.removal())
        .json(json!({ "message": "Logged out" }))
}

pub fn config_user_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout));
}

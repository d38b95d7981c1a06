use crate::errors::ApiError;
use crate::handlers::auth::Claims;
use crate::handlers::password::{hash_password, verify_password};
use crate::handlers::validation::{normalize_member_phone, require, valid_email};
use crate::middleware::role_gate::RoleGate;
use crate::models::all_models::{MemberChanges, Role};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;

//Get Logged In Member Info
pub async fn get_logged_in_member(
    store: web::Data<dyn Store>,
    claims: Claims,
) -> Result<HttpResponse, ApiError> {
    let member = store
        .find_member(&claims.matricula)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;
    Ok(HttpResponse::Ok().json(member))
}

//Get All Members (except the caller)
pub async fn get_all_members(
    store: web::Data<dyn Store>,
    claims: Claims,
) -> Result<HttpResponse, ApiError> {
    let members = store.list_members_except(&claims.matricula).await?;
    Ok(HttpResponse::Ok().json(members))
}

pub async fn get_member(
    store: web::Data<dyn Store>,
    matricula: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let member = store
        .find_member(&matricula)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;
    Ok(HttpResponse::Ok().json(member))
}

//Update Member Request
#[derive(Deserialize)]
pub struct UpdateMemberRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl UpdateMemberRequest {
    fn into_changes(self) -> Result<MemberChanges, ApiError> {
        let username = self
            .username
            .map(|u| require(&u, "Username"))
            .transpose()?;
        let email = match self.email {
            Some(e) => {
                let e = e.trim().to_lowercase();
                if !valid_email(&e) {
                    return Err(ApiError::validation("Invalid email format"));
                }
                Some(e)
            }
            None => None,
        };
        let phone_number = self
            .phone_number
            .map(|p| normalize_member_phone(&p))
            .transpose()?;
        Ok(MemberChanges {
            username,
            email,
            phone_number,
        })
    }
}

//Update Member
//ADMIN may update anyone; USER only themself
pub async fn update_member(
    store: web::Data<dyn Store>,
    claims: Claims,
    matricula: web::Path<String>,
    payload: web::Json<UpdateMemberRequest>,
) -> Result<HttpResponse, ApiError> {
    let matricula = matricula.into_inner();
    if claims.role != Role::Admin && claims.matricula != matricula {
        return Err(ApiError::forbidden("You can only update your own account"));
    }

    let changes = payload.into_inner().into_changes()?;
    if changes.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    if let Some(other) = store.find_conflicting_member(&matricula, &changes).await? {
        let field = if changes.email.as_deref() == Some(other.email.as_str()) {
            "Email"
        } else if changes.username.as_deref() == Some(other.username.as_str()) {
            "Username"
        } else {
            "Phone number"
        };
        return Err(ApiError::validation(format!("{} already in use", field)));
    }

    let member = store
        .update_member(&matricula, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    info!("Member {} updated by {}", member.matricula, claims.matricula);
    Ok(HttpResponse::Ok().json(member))
}

pub async fn delete_member(
    store: web::Data<dyn Store>,
    claims: Claims,
    matricula: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !store.delete_member(&matricula).await? {
        return Err(ApiError::not_found("Member not found"));
    }
    info!("Member {} deleted by {}", matricula, claims.matricula);
    Ok(HttpResponse::Ok().json(json!({ "message": "Member deleted" })))
}

//Change Password Request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    store: web::Data<dyn Store>,
    claims: Claims,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    if payload.new_password.is_empty() {
        return Err(ApiError::validation("New password is required"));
    }

    let member = store
        .find_member(&claims.matricula)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    let hash_failure = |e: argon2::password_hash::Error| {
        error!("Password hashing failed for {}: {}", member.matricula, e);
        ApiError::Internal("Error verifying password".to_string())
    };

    if !verify_password(&payload.current_password, &member.password_hash).map_err(hash_failure)? {
        return Err(ApiError::validation("Current password is incorrect"));
    }
    if payload.new_password == payload.current_password {
        return Err(ApiError::validation(
            "New password must be different from the current one",
        ));
    }

    let new_hash = hash_password(&payload.new_password).map_err(hash_failure)?;
    store.update_password(&member.matricula, &new_hash).await?;

    info!("Member {} changed their password", member.matricula);
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}

pub fn config_user_data_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/userinfo",
        web::get().to(get_logged_in_member).wrap(RoleGate::member()),
    )
    .route(
        "/all-users",
        web::get().to(get_all_members).wrap(RoleGate::admin()),
    )
    .service(
        web::resource("/members/{matricula}")
            .route(web::get().to(get_member).wrap(RoleGate::member()))
            .route(web::put().to(update_member).wrap(RoleGate::member()))
            .route(web::delete().to(delete_member).wrap(RoleGate::admin())),
    )
    .route(
        "/change-password",
        web::post().to(change_password).wrap(RoleGate::member()),
    );
}

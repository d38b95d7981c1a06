use crate::errors::ApiError;
use crate::handlers::auth::Claims;
use crate::handlers::validation::{require, valid_email, validate_partner_phone};
use crate::handlers::verification::dispatch_claim_code;
use crate::handlers::whatsapp::Messenger;
use crate::middleware::role_gate::RoleGate;
use crate::models::all_models::{NewPartnership, PartnershipChanges};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

//Claim Benefit
//Sends the same code to the member and to the partner company
pub async fn claim_benefit(
    store: web::Data<dyn Store>,
    messenger: web::Data<dyn Messenger>,
    claims: Claims,
    benefit_id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let dispatch = dispatch_claim_code(
        store.get_ref(),
        messenger.get_ref(),
        &claims.matricula,
        benefit_id.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Verification code sent to the member and the partner company",
        "benefit_id": dispatch.benefit_id,
        "company_name": dispatch.company_name,
        "notified": dispatch.notified,
    })))
}

pub async fn list_benefits(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_partnerships().await?))
}

pub async fn get_benefit(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let partnership = store
        .find_partnership(id.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Benefit not found"))?;
    Ok(HttpResponse::Ok().json(partnership))
}

//Benefit Request (create and partial update share the shape)
#[derive(Deserialize)]
pub struct BenefitRequest {
    pub company_name: Option<String>,
    pub company_email: Option<String>,
    pub phone_number: Option<String>,
    pub discount: Option<f64>,
    pub description: Option<String>,
}

impl BenefitRequest {
    fn into_changes(self) -> Result<PartnershipChanges, ApiError> {
        let company_email = match self.company_email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if !valid_email(&email) {
                    return Err(ApiError::validation("Invalid company email"));
                }
                Some(email)
            }
            None => None,
        };
        if let Some(discount) = self.discount {
            if !discount.is_finite() || discount < 0.0 {
                return Err(ApiError::validation("Discount must be zero or greater"));
            }
        }
        Ok(PartnershipChanges {
            company_name: self
                .company_name
                .map(|n| require(&n, "Company name"))
                .transpose()?,
            company_email,
            phone_number: self
                .phone_number
                .map(|p| validate_partner_phone(&p))
                .transpose()?,
            discount: self.discount,
            description: self.description,
        })
    }
}

pub async fn create_benefit(
    store: web::Data<dyn Store>,
    claims: Claims,
    payload: web::Json<BenefitRequest>,
) -> Result<HttpResponse, ApiError> {
    let changes = payload.into_inner().into_changes()?;
    let partnership = store
        .insert_partnership(NewPartnership {
            company_name: changes
                .company_name
                .ok_or_else(|| ApiError::validation("Company name is required"))?,
            company_email: changes
                .company_email
                .ok_or_else(|| ApiError::validation("Company email is required"))?,
            phone_number: changes.phone_number,
            discount: changes
                .discount
                .ok_or_else(|| ApiError::validation("Discount is required"))?,
            description: changes.description,
        })
        .await?;

    info!(
        "Benefit {} ({}) created by {}",
        partnership.id, partnership.company_name, claims.matricula
    );
    Ok(HttpResponse::Created().json(partnership))
}

pub async fn update_benefit(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<BenefitRequest>,
) -> Result<HttpResponse, ApiError> {
    let changes = payload.into_inner().into_changes()?;
    let partnership = store
        .update_partnership(id.into_inner(), &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Benefit not found"))?;
    Ok(HttpResponse::Ok().json(partnership))
}

pub async fn delete_benefit(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    if !store.delete_partnership(id.into_inner()).await? {
        return Err(ApiError::not_found("Benefit not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Benefit deleted" })))
}

pub fn config_benefit_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/benefits")
            .route(
                "/claim/{id}",
                web::post().to(claim_benefit).wrap(RoleGate::member()),
            )
            .service(
                web::resource("")
                    .route(web::get().to(list_benefits))
                    .route(web::post().to(create_benefit).wrap(RoleGate::admin())),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_benefit))
                    .route(web::put().to(update_benefit).wrap(RoleGate::admin()))
                    .route(web::delete().to(delete_benefit).wrap(RoleGate::admin())),
            ),
    );
}

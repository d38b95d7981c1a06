pub mod benefits;
pub mod calendar;
pub mod gallery;
pub mod tutorials;
pub mod user_auth;
pub mod user_data;
pub mod verification_codes;

use crate::errors::{json_error_handler, path_error_handler, query_error_handler};
use actix_web::{web, HttpResponse};

/// Registers every route plus the extractor configs that turn malformed
/// input into JSON 400s. Identity resolution is wrapped around this by the
/// caller.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/auth")
                .configure(user_auth::config_user_auth_routes)
                .configure(user_data::config_user_data_routes)
                .configure(verification_codes::config_verification_code_routes),
        )
        .configure(benefits::config_benefit_routes)
        .configure(calendar::config_calendar_routes)
        .configure(tutorials::config_tutorial_routes)
        .configure(gallery::config_gallery_routes)
        .route(
            "/",
            web::get().to(|| async { HttpResponse::Ok().body("Welcome to the Believe API") }),
        );
}

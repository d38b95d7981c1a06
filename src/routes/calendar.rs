use crate::errors::ApiError;
use crate::handlers::validation::require;
use crate::middleware::role_gate::RoleGate;
use crate::models::all_models::{CalendarEventChanges, NewCalendarEvent};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

// Dates travel as YYYY-MM-DD; anything else fails deserialization with a 400.
#[derive(Deserialize)]
pub struct CalendarEventRequest {
    pub date: Option<NaiveDate>,
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub event_photo: Option<String>,
}

pub async fn list_events(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_calendar_events().await?))
}

pub async fn get_event(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let event = store
        .find_calendar_event(id.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn create_event(
    store: web::Data<dyn Store>,
    payload: web::Json<CalendarEventRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let date = payload
        .date
        .ok_or_else(|| ApiError::validation("Date is required"))?;
    let event_name = require(payload.event_name.as_deref().unwrap_or_default(), "Event name")?;

    let event = store
        .insert_calendar_event(NewCalendarEvent {
            date,
            event_name,
            description: payload.description,
            event_photo: payload.event_photo,
        })
        .await?;
    Ok(HttpResponse::Created().json(event))
}

pub async fn update_event(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<CalendarEventRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let changes = CalendarEventChanges {
        date: payload.date,
        event_name: payload
            .event_name
            .map(|n| require(&n, "Event name"))
            .transpose()?,
        description: payload.description,
        event_photo: payload.event_photo,
    };

    let event = store
        .update_calendar_event(id.into_inner(), &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn delete_event(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    if !store.delete_calendar_event(id.into_inner()).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Event deleted" })))
}

pub fn config_calendar_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/calendar")
            .service(
                web::resource("")
                    .route(web::get().to(list_events))
                    .route(web::post().to(create_event).wrap(RoleGate::admin())),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_event))
                    .route(web::put().to(update_event).wrap(RoleGate::admin()))
                    .route(web::delete().to(delete_event).wrap(RoleGate::admin())),
            ),
    );
}

use crate::errors::ApiError;
use crate::handlers::auth::Claims;
use crate::handlers::validation::require;
use crate::middleware::role_gate::RoleGate;
use crate::models::all_models::{GalleryEvent, GalleryEventInput, NewPhoto, Photo, Visibility};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

//Gallery Event Request
//Without an id a new event is created, otherwise the event is replaced
#[derive(Deserialize)]
pub struct GalleryEventRequest {
    pub id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
}

#[derive(Serialize)]
pub struct GalleryEventWithPhotos {
    #[serde(flatten)]
    pub event: GalleryEvent,
    pub photos: Vec<Photo>,
}

pub async fn save_event(
    store: web::Data<dyn Store>,
    payload: web::Json<GalleryEventRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let creating = payload.id.is_none();
    let event = store
        .save_gallery_event(GalleryEventInput {
            id: payload.id,
            name: require(&payload.name, "Event name")?,
            description: payload.description,
            event_date: payload.event_date,
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    if creating {
        info!("Gallery event {} created", event.id);
        Ok(HttpResponse::Created().json(event))
    } else {
        Ok(HttpResponse::Ok().json(event))
    }
}

//Get Event
//Guests only see PUBLIC photos; any authenticated member sees all of them
pub async fn get_event(
    store: web::Data<dyn Store>,
    claims: Option<Claims>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let event = store
        .find_gallery_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    let photos = store.list_photos(id, claims.is_none()).await?;
    Ok(HttpResponse::Ok().json(GalleryEventWithPhotos { event, photos }))
}

pub async fn delete_event(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    if !store.delete_gallery_event(id).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    info!("Gallery event {} deleted with its photos", id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Event deleted" })))
}

#[derive(Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

pub async fn set_description(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<DescriptionRequest>,
) -> Result<HttpResponse, ApiError> {
    let description = require(&payload.description, "Description")?;
    let event = store
        .set_gallery_event_description(id.into_inner(), Some(&description))
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn clear_description(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let event = store
        .set_gallery_event_description(id.into_inner(), None)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    Ok(HttpResponse::Ok().json(event))
}

#[derive(Deserialize)]
pub struct PhotoRequest {
    pub photo_url: String,
    pub photo_name: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Deserialize)]
pub struct AddPhotosRequest {
    pub photos: Vec<PhotoRequest>,
}

pub async fn add_photos(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<AddPhotosRequest>,
) -> Result<HttpResponse, ApiError> {
    let event_id = id.into_inner();
    let payload = payload.into_inner();
    if payload.photos.is_empty() {
        return Err(ApiError::validation("At least one photo is required"));
    }

    let photos = payload
        .photos
        .into_iter()
        .map(|p| {
            Ok(NewPhoto {
                photo_url: require(&p.photo_url, "Photo URL")?,
                photo_name: p.photo_name,
                visibility: p.visibility,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    if store.find_gallery_event(event_id).await?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }

    let created = store.insert_photos(event_id, photos).await?;
    info!("Added {} photos to gallery event {}", created.len(), event_id);
    Ok(HttpResponse::Created().json(created))
}

pub async fn list_photos(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let photos = store.list_photos(id.into_inner(), false).await?;
    if photos.is_empty() {
        return Err(ApiError::not_found("No photos found for this event"));
    }
    Ok(HttpResponse::Ok().json(photos))
}

pub async fn delete_event_photos(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let event_id = id.into_inner();
    if store.find_gallery_event(event_id).await?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }
    let deleted = store.delete_event_photos(event_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": deleted })))
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub visibility: String,
}

pub async fn set_photo_visibility(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<VisibilityRequest>,
) -> Result<HttpResponse, ApiError> {
    let visibility = Visibility::from_str(payload.visibility.trim())
        .map_err(|_| ApiError::validation("Visibility must be PUBLIC or PRIVATE"))?;
    let photo = store
        .set_photo_visibility(id.into_inner(), visibility)
        .await?
        .ok_or_else(|| ApiError::not_found("Photo not found"))?;
    Ok(HttpResponse::Ok().json(photo))
}

pub async fn delete_photo(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    if !store.delete_photo(id.into_inner()).await? {
        return Err(ApiError::not_found("Photo not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Photo deleted" })))
}

pub fn config_gallery_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gallery")
            .route("/events", web::post().to(save_event).wrap(RoleGate::admin()))
            .service(
                web::resource("/events/{id}")
                    .route(web::get().to(get_event))
                    .route(web::delete().to(delete_event).wrap(RoleGate::admin())),
            )
            .service(
                web::resource("/events/{id}/description")
                    .route(web::put().to(set_description).wrap(RoleGate::admin()))
                    .route(web::delete().to(clear_description).wrap(RoleGate::admin())),
            )
            .service(
                web::resource("/events/{id}/photos")
                    .route(web::post().to(add_photos).wrap(RoleGate::admin()))
                    .route(web::get().to(list_photos).wrap(RoleGate::member()))
                    .route(web::delete().to(delete_event_photos).wrap(RoleGate::admin())),
            )
            .route(
                "/photos/{id}/visibility",
                web::put().to(set_photo_visibility).wrap(RoleGate::admin()),
            )
            .route(
                "/photos/{id}",
                web::delete().to(delete_photo).wrap(RoleGate::admin()),
            ),
    );
}

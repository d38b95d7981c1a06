use crate::errors::ApiError;
use crate::handlers::validation::require;
use crate::middleware::role_gate::RoleGate;
use crate::models::all_models::{
    DifficultyLevel, NewTutorial, TutorialChanges, TutorialFilter, TutorialPage,
};
use crate::store::Store;
use actix_web::{web, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
pub struct TutorialRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
}

#[derive(Deserialize)]
pub struct TutorialQuery {
    pub title: Option<String>,
    pub difficulty_level: Option<DifficultyLevel>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl TutorialQuery {
    fn into_filter(self) -> Result<TutorialFilter, ApiError> {
        let page = self.page.unwrap_or(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 || page_size == 0 {
            return Err(ApiError::validation("page and page_size must be at least 1"));
        }
        Ok(TutorialFilter {
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            difficulty_level: self.difficulty_level,
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }
}

pub async fn create_tutorial(
    store: web::Data<dyn Store>,
    payload: web::Json<TutorialRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let title = require(payload.title.as_deref().unwrap_or_default(), "Title")?;
    let url = require(payload.url.as_deref().unwrap_or_default(), "URL")?;
    let description = require(payload.description.as_deref().unwrap_or_default(), "Description")?;

    if store.find_tutorial_by_url(&url).await?.is_some() {
        return Err(ApiError::validation("A tutorial with this URL already exists"));
    }

    let tutorial = store
        .insert_tutorial(NewTutorial {
            title,
            url,
            description,
            difficulty_level: payload.difficulty_level.unwrap_or_default(),
        })
        .await?;
    info!("Tutorial {} created", tutorial.id);
    Ok(HttpResponse::Created().json(tutorial))
}

//List Tutorials
//Filters: title substring (case-insensitive), difficulty; paginated
pub async fn list_tutorials(
    store: web::Data<dyn Store>,
    query: web::Query<TutorialQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = query.into_inner().into_filter()?;
    let (tutorials, total) = store.list_tutorials(&filter).await?;
    Ok(HttpResponse::Ok().json(TutorialPage {
        tutorials,
        total,
        page: filter.page,
        page_size: filter.page_size,
    }))
}

pub async fn update_tutorial(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    payload: web::Json<TutorialRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let payload = payload.into_inner();
    let changes = TutorialChanges {
        title: payload.title.map(|t| require(&t, "Title")).transpose()?,
        url: payload.url.map(|u| require(&u, "URL")).transpose()?,
        description: payload
            .description
            .map(|d| require(&d, "Description"))
            .transpose()?,
        difficulty_level: payload.difficulty_level,
    };

    if let Some(url) = &changes.url {
        if let Some(existing) = store.find_tutorial_by_url(url).await? {
            if existing.id != id {
                return Err(ApiError::validation("A tutorial with this URL already exists"));
            }
        }
    }

    let tutorial = store
        .update_tutorial(id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Tutorial not found"))?;
    Ok(HttpResponse::Ok().json(tutorial))
}

pub async fn delete_tutorial(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    if !store.delete_tutorial(id.into_inner()).await? {
        return Err(ApiError::not_found("Tutorial not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Tutorial deleted" })))
}

pub fn config_tutorial_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tutorial")
            .service(
                web::resource("")
                    .route(web::get().to(list_tutorials).wrap(RoleGate::member()))
                    .route(web::post().to(create_tutorial).wrap(RoleGate::admin())),
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(update_tutorial).wrap(RoleGate::admin()))
                    .route(web::delete().to(delete_tutorial).wrap(RoleGate::admin())),
            ),
    );
}

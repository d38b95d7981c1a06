mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod store;
#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web};
use config::Config;
use handlers::auth::TokenCodec;
use handlers::whatsapp::{Messenger, WhatsAppClient};
use log::{error, info};
use middleware::{auth_middleware::AuthResolver, request_logger::RequestLogger};
use routes::configure_app;
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use store::{postgres::PgStore, Store};

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static> {
    info!("=== Believe API Server Starting ===");

    let config = match Config::from_lookup(|key| secrets.get(key)) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(shuttle_runtime::Error::Custom(anyhow::anyhow!(
                "Invalid configuration: {}",
                e
            )));
        }
    };

    // Connect to the database with the same pool settings in every environment
    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to Postgres: {}", e);
            return Err(shuttle_runtime::Error::Custom(anyhow::anyhow!(
                "Database connection failed"
            )));
        }
    };

    if let Err(e) = sqlx::migrate!().run(&pool).await {
        error!("Failed to run migrations: {}", e);
        return Err(shuttle_runtime::Error::Custom(anyhow::anyhow!(
            "Database migration failed: {}",
            e
        )));
    }

    if handlers::db::check_db_connection(&pool).await {
        info!("Database connection established and verified");
    } else {
        info!("Database connection established but verification failed");
    }

    let messenger: Arc<dyn Messenger> = match WhatsAppClient::new(config.whatsapp.clone()) {
        Ok(client) => {
            info!("WhatsApp client initialized");
            Arc::new(client)
        }
        Err(e) => {
            error!("Failed to initialize WhatsApp client: {}", e);
            return Err(shuttle_runtime::Error::Custom(anyhow::anyhow!(
                "WhatsApp client initialization failed: {}",
                e
            )));
        }
    };

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let codec = TokenCodec::new(&config.jwt_secret, config.token_ttl);
    let cookie = config.cookie.clone();

    info!("Starting Believe API Server with Shuttle...");

    let service_config = move |cfg: &mut web::ServiceConfig| {
        // Browser clients send the access cookie cross-site
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .supports_credentials()
            .max_age(3600);

        cfg.app_data(web::Data::from(store.clone()));
        cfg.app_data(web::Data::from(messenger.clone()));
        cfg.app_data(web::Data::new(codec.clone()));
        cfg.app_data(web::Data::new(cookie.clone()));
        cfg.service(
            web::scope("")
                .wrap(AuthResolver::new(codec.clone(), cookie.name.clone()))
                .wrap(cors)
                .wrap(RequestLogger)
                .wrap(Logger::new(
                    "%t [%s] \"%r\" %b %D ms \"%{Referer}i\" \"%{User-Agent}i\" %a",
                ))
                .configure(configure_app),
        );
    };

    Ok(service_config.into())
}

use sqlx::PgPool;

pub async fn check_db_connection(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Database connection check failed: {}", e);
            false
        }
    }
}

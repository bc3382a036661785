use shared::models::{CarouselImage, CarouselImageCreate, CarouselImageUpdate};
use sqlx::PgPool;

const COLUMNS: &str = "id, image_url, title, subtitle, link_url, sort_order, is_active, created_at";

pub async fn list(
    pool: &PgPool,
    company_id: &str,
    active_only: bool,
) -> Result<Vec<CarouselImage>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM carousel_images
         WHERE company_id = $1 AND ($2 = FALSE OR is_active)
         ORDER BY sort_order, id"
    ))
    .bind(company_id)
    .bind(active_only)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    company_id: &str,
    data: &CarouselImageCreate,
    now: i64,
) -> Result<CarouselImage, sqlx::Error> {
    sqlx::query_as(&format!(
        "INSERT INTO carousel_images (id, company_id, image_url, title, subtitle, link_url, sort_order,
            is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 0), COALESCE($8, TRUE), $9)
         RETURNING {COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.image_url)
    .bind(&data.title)
    .bind(&data.subtitle)
    .bind(&data.link_url)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &CarouselImageUpdate,
) -> Result<Option<CarouselImage>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE carousel_images SET
            image_url = COALESCE($3, image_url),
            title = COALESCE($4, title),
            subtitle = COALESCE($5, subtitle),
            link_url = COALESCE($6, link_url),
            sort_order = COALESCE($7, sort_order),
            is_active = COALESCE($8, is_active)
         WHERE id = $1 AND company_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.image_url)
    .bind(&data.title)
    .bind(&data.subtitle)
    .bind(&data.link_url)
    .bind(data.sort_order)
    .bind(data.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM carousel_images WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

//! Blog categories and posts

use shared::error::{AppError, ErrorCode};
use shared::models::{
    BlogCategory, BlogCategoryCreate, BlogCategoryUpdate, BlogPost, BlogPostCreate,
    BlogPostFilter, BlogPostUpdate, PageWindow, PostStatus,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::like_pattern;
use crate::error::ServiceResult;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";
const POST_COLUMNS: &str = "id, category_id, author_id, title, slug, excerpt, content, cover_image_url,
    status, published_at, created_at, updated_at";

/// Explicit slug, or one derived from the title/name
pub fn resolve_slug(explicit: Option<&str>, fallback: &str) -> Result<String, AppError> {
    let slug = shared::util::slugify(explicit.unwrap_or(fallback));
    if slug.is_empty() {
        return Err(AppError::validation("Slug is empty").with_detail("slug", "invalid"));
    }
    Ok(slug)
}

// ── Categories ──

pub async fn list_categories(pool: &PgPool, company_id: &str) -> Result<Vec<BlogCategory>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM blog_categories WHERE company_id = $1 ORDER BY name"
    ))
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn create_category(
    pool: &PgPool,
    company_id: &str,
    data: &BlogCategoryCreate,
    now: i64,
) -> ServiceResult<BlogCategory> {
    let slug = resolve_slug(data.slug.as_deref(), &data.name)?;
    let category = sqlx::query_as(&format!(
        "INSERT INTO blog_categories (id, company_id, name, slug, description, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(&data.name)
    .bind(&slug)
    .bind(&data.description)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(category)
}

pub async fn update_category(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &BlogCategoryUpdate,
) -> ServiceResult<Option<BlogCategory>> {
    let slug = data
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), s))
        .transpose()?;
    let category = sqlx::query_as(&format!(
        "UPDATE blog_categories SET
            name = COALESCE($3, name),
            slug = COALESCE($4, slug),
            description = COALESCE($5, description)
         WHERE id = $1 AND company_id = $2
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(&data.name)
    .bind(&slug)
    .bind(&data.description)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

/// Posts in the category keep existing with `category_id = NULL`
pub async fn delete_category(pool: &PgPool, company_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blog_categories WHERE id = $1 AND company_id = $2")
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn ensure_category(pool: &PgPool, company_id: &str, category_id: i64) -> ServiceResult<()> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM blog_categories WHERE id = $1 AND company_id = $2)",
    )
    .bind(category_id)
    .bind(company_id)
    .fetch_one(pool)
    .await?;
    if !exists {
        return Err(AppError::new(ErrorCode::BlogCategoryNotFound)
            .with_detail("category_id", category_id)
            .into());
    }
    Ok(())
}

// ── Posts ──

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, company_id: &str, f: &BlogPostFilter) {
    qb.push(" WHERE company_id = ")
        .push_bind(company_id.to_string())
        .push(" AND deleted_at IS NULL");
    if let Some(category_id) = f.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(status) = f.status {
        qb.push(" AND status = ").push_bind(status.as_db());
    }
    if let Some(search) = f.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR excerpt ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list_posts(
    pool: &PgPool,
    company_id: &str,
    filter: &BlogPostFilter,
) -> Result<(Vec<BlogPost>, i64, PageWindow), sqlx::Error> {
    let window = PageWindow::new(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blog_posts");
    push_filters(&mut count, company_id, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {POST_COLUMNS} FROM blog_posts"));
    push_filters(&mut qb, company_id, filter);
    // drafts (no published_at) sort by creation among themselves
    qb.push(" ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ")
        .push_bind(window.per_page)
        .push(" OFFSET ")
        .push_bind(window.offset());
    let posts = qb.build_query_as::<BlogPost>().fetch_all(pool).await?;

    Ok((posts, total, window))
}

/// Published posts for the storefront
pub async fn list_published(
    pool: &PgPool,
    company_id: &str,
    category_id: Option<i64>,
    window: PageWindow,
) -> Result<(Vec<BlogPost>, i64), sqlx::Error> {
    let filter = BlogPostFilter {
        category_id,
        status: Some(PostStatus::Published),
        search: None,
        page: Some(window.page),
        per_page: Some(window.per_page),
    };
    let (posts, total, _) = list_posts(pool, company_id, &filter).await?;
    Ok((posts, total))
}

pub async fn find_post(
    pool: &PgPool,
    company_id: &str,
    id: i64,
) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
    ))
    .bind(id)
    .bind(company_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_published_by_slug(
    pool: &PgPool,
    company_id: &str,
    slug: &str,
) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM blog_posts
         WHERE company_id = $1 AND slug = $2 AND status = $3 AND deleted_at IS NULL"
    ))
    .bind(company_id)
    .bind(slug)
    .bind(PostStatus::Published.as_db())
    .fetch_optional(pool)
    .await
}

pub async fn create_post(
    pool: &PgPool,
    company_id: &str,
    author_id: i64,
    data: &BlogPostCreate,
    now: i64,
) -> ServiceResult<BlogPost> {
    if let Some(category_id) = data.category_id {
        ensure_category(pool, company_id, category_id).await?;
    }
    let slug = resolve_slug(data.slug.as_deref(), &data.title)?;
    let status = data.status.unwrap_or(PostStatus::Draft);
    let published_at = (status == PostStatus::Published).then_some(now);

    let post = sqlx::query_as(&format!(
        "INSERT INTO blog_posts (id, company_id, category_id, author_id, title, slug, excerpt, content,
            cover_image_url, status, published_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
         RETURNING {POST_COLUMNS}"
    ))
    .bind(shared::util::snowflake_id())
    .bind(company_id)
    .bind(data.category_id)
    .bind(author_id)
    .bind(&data.title)
    .bind(&slug)
    .bind(&data.excerpt)
    .bind(&data.content)
    .bind(&data.cover_image_url)
    .bind(status.as_db())
    .bind(published_at)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(post)
}

/// `published_at` is stamped the first time a post goes live and kept
/// across later unpublish/republish cycles.
pub async fn update_post(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    data: &BlogPostUpdate,
    now: i64,
) -> ServiceResult<Option<BlogPost>> {
    if let Some(category_id) = data.category_id {
        ensure_category(pool, company_id, category_id).await?;
    }
    let slug = data
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), s))
        .transpose()?;

    let post = sqlx::query_as(&format!(
        "UPDATE blog_posts SET
            category_id = COALESCE($3, category_id),
            title = COALESCE($4, title),
            slug = COALESCE($5, slug),
            excerpt = COALESCE($6, excerpt),
            content = COALESCE($7, content),
            cover_image_url = COALESCE($8, cover_image_url),
            status = COALESCE($9, status),
            published_at = CASE WHEN COALESCE($9, status) = 'published'
                THEN COALESCE(published_at, $10) ELSE published_at END,
            updated_at = $10
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
         RETURNING {POST_COLUMNS}"
    ))
    .bind(id)
    .bind(company_id)
    .bind(data.category_id)
    .bind(&data.title)
    .bind(&slug)
    .bind(&data.excerpt)
    .bind(&data.content)
    .bind(&data.cover_image_url)
    .bind(data.status.map(|s| s.as_db()))
    .bind(now)
    .fetch_optional(pool)
    .await?;
    Ok(post)
}

pub async fn soft_delete_post(
    pool: &PgPool,
    company_id: &str,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE blog_posts SET deleted_at = $3, updated_at = $3
         WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(company_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_slug() {
        assert_eq!(resolve_slug(None, "Spring Menu 2026!").unwrap(), "spring-menu-2026");
        assert_eq!(resolve_slug(Some("Our Story"), "ignored").unwrap(), "our-story");
        let err = resolve_slug(Some("!!!"), "x").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_published_filter_sql() {
        let filter = BlogPostFilter {
            category_id: Some(2),
            status: Some(PostStatus::Published),
            search: Some("truffle".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM blog_posts");
        push_filters(&mut qb, "c1", &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM blog_posts WHERE company_id = $1 AND deleted_at IS NULL \
             AND category_id = $2 AND status = $3 AND (title ILIKE $4 OR excerpt ILIKE $5)"
        );
    }
}

//! Consistency checks that need a PostgreSQL server.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
//! Every test seeds its own company, so a shared database is fine.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{MenuCategoryCreate, MenuItemCreate};
use shared::modules::Role;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tavola_cloud::auth::CurrentUser;
use tavola_cloud::auth::user_auth::create_token;
use tavola_cloud::config::Config;
use tavola_cloud::db;
use tavola_cloud::db::users::{NewUser, UserChanges};
use tavola_cloud::error::ServiceError;
use tavola_cloud::state::AppState;
use tower::ServiceExt;

const JWT_SECRET: &str = "db-test-secret";

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn config(database_url: String) -> Config {
    Config {
        database_url,
        http_port: 0,
        database_max_connections: 5,
        environment: "test".into(),
        jwt_secret: JWT_SECRET.into(),
        stripe_secret_key: "sk_test_unused".into(),
        stripe_webhook_secret: "whsec_test".into(),
        app_base_url: "http://localhost:3000".into(),
        cors_allowed_origins: vec![],
    }
}

async fn seed_company(pool: &PgPool) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO companies (id, name, slug, email, status, created_at, updated_at)
         VALUES ($1, 'Test Bistro', $1, 'owner@example.com', 'active', $2, $2)",
    )
    .bind(&id)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn seed_user(pool: &PgPool, company_id: &str, role: Role) -> i64 {
    let id = shared::util::snowflake_id();
    let email = format!("{id}@example.com");
    db::users::create(
        pool,
        &NewUser {
            id,
            company_id,
            email: &email,
            name: "Test User",
            password_hash: "unused",
            role: role.as_db(),
            now: shared::util::now_millis(),
        },
    )
    .await
    .unwrap();
    id
}

fn item_in(category_id: i64) -> MenuItemCreate {
    MenuItemCreate {
        category_id,
        name: "Margherita".into(),
        description: None,
        price: Decimal::new(1150, 2),
        image_url: None,
        is_available: None,
        is_featured: None,
        dietary_tags: None,
        sort_order: None,
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn item_create_waits_for_category_delete() {
    let pool = pool().await;
    let company_id = seed_company(&pool).await;
    let now = shared::util::now_millis();
    let category = db::menu::create_category(
        &pool,
        &company_id,
        &MenuCategoryCreate {
            name: "Pizza".into(),
            description: None,
            sort_order: None,
        },
        now,
    )
    .await
    .unwrap();
    let category_id = category.id;

    // same lock and write as delete_category, held open while an item is created
    let mut tx = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM menu_categories WHERE id = $1 FOR UPDATE")
        .bind(category_id)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::query("UPDATE menu_categories SET deleted_at = $2 WHERE id = $1")
        .bind(category_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .unwrap();

    let writer = {
        let pool = pool.clone();
        let company_id = company_id.clone();
        tokio::spawn(async move {
            db::menu::create_item(&pool, &company_id, &item_in(category_id), now).await
        })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.commit().await.unwrap();

    match writer.await.unwrap() {
        Err(ServiceError::App(err)) => assert_eq!(err.code, ErrorCode::CategoryNotFound),
        other => panic!("expected CategoryNotFound, got {other:?}"),
    }
    let (live,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM menu_items WHERE category_id = $1 AND deleted_at IS NULL",
    )
    .bind(category_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(live, 0);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn category_delete_refused_after_concurrent_item() {
    let pool = pool().await;
    let company_id = seed_company(&pool).await;
    let now = shared::util::now_millis();
    let category = db::menu::create_category(
        &pool,
        &company_id,
        &MenuCategoryCreate {
            name: "Pasta".into(),
            description: None,
            sort_order: None,
        },
        now,
    )
    .await
    .unwrap();
    db::menu::create_item(&pool, &company_id, &item_in(category.id), now)
        .await
        .unwrap();

    match db::menu::delete_category(&pool, &company_id, category.id).await {
        Err(ServiceError::App(err)) => assert_eq!(err.code, ErrorCode::CategoryHasItems),
        other => panic!("expected CategoryHasItems, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn stripe_customer_is_claimed_once() {
    let pool = pool().await;
    let company_id = seed_company(&pool).await;

    let (first, second) = tokio::join!(
        db::companies::claim_stripe_customer(&pool, &company_id, "cus_first"),
        db::companies::claim_stripe_customer(&pool, &company_id, "cus_second"),
    );
    let first = first.unwrap().unwrap();
    let second = second.unwrap().unwrap();
    assert_eq!(first, second);

    let stored = db::companies::find_by_id(&pool, &company_id)
        .await
        .unwrap()
        .unwrap()
        .stripe_customer_id;
    assert_eq!(stored.as_deref(), Some(first.as_str()));

    let missing = db::companies::claim_stripe_customer(&pool, "no-such-company", "cus_x")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn account_changes_reach_live_sessions() {
    let pool = pool().await;
    let company_id = seed_company(&pool).await;
    let user_id = seed_user(&pool, &company_id, Role::Admin).await;
    let url = std::env::var("DATABASE_URL").unwrap();
    let state = AppState::with_pool(&config(url), pool.clone());

    let claimed = CurrentUser {
        user_id,
        company_id: company_id.clone(),
        role: Role::Admin,
        email: format!("{user_id}@example.com"),
    };
    let user = state.module_cache.refresh_user(&pool, &claimed).await.unwrap();
    assert_eq!(user.role, Role::Admin);

    // demotion
    db::users::update(
        &pool,
        &company_id,
        user_id,
        &UserChanges {
            role: Some(Role::Staff.as_db()),
            ..Default::default()
        },
        shared::util::now_millis(),
    )
    .await
    .unwrap();
    state.module_cache.invalidate_account(user_id).await;
    let user = state.module_cache.refresh_user(&pool, &claimed).await.unwrap();
    assert_eq!(user.role, Role::Staff);

    // deletion
    db::users::soft_delete(&pool, &company_id, user_id, shared::util::now_millis())
        .await
        .unwrap();
    state.module_cache.invalidate_account(user_id).await;
    match state.module_cache.refresh_user(&pool, &claimed).await {
        Err(ServiceError::App(err)) => assert_eq!(err.code, ErrorCode::AccountDisabled),
        other => panic!("expected AccountDisabled, got {other:?}"),
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn deleted_user_token_is_refused() {
    let pool = pool().await;
    let company_id = seed_company(&pool).await;
    let user_id = seed_user(&pool, &company_id, Role::Manager).await;
    let url = std::env::var("DATABASE_URL").unwrap();
    let config = config(url);
    let app = tavola_cloud::api::create_router(AppState::with_pool(&config, pool.clone()), &config);

    let token = create_token(
        user_id,
        &company_id,
        Role::Manager,
        &format!("{user_id}@example.com"),
        JWT_SECRET,
    )
    .unwrap();
    db::users::soft_delete(&pool, &company_id, user_id, shared::util::now_millis())
        .await
        .unwrap();

    let resp = app
        .oneshot(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

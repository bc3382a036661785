//! Pricing package administration (platform admins only)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router, middleware};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{PricingPackage, PricingPackageCreate, PricingPackageUpdate};
use shared::modules::{Role, parse_module};
use shared::util::now_millis;
use validator::Validate;

use super::ApiResult;
use crate::auth::require_role;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/packages", get(list_packages).post(create_package))
        .route(
            "/api/admin/packages/{id}",
            put(update_package).delete(delete_package),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_role(&[Role::PlatformAdmin]),
        ))
}

/// Every feature must name a dashboard module; duplicates are dropped.
fn normalize_features(features: &[String]) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(features.len());
    for f in features {
        let module = parse_module(f.trim()).ok_or_else(|| {
            AppError::validation(format!("Unknown module '{f}'")).with_detail("features", f.as_str())
        })?;
        if !out.iter().any(|m| m == module.as_str()) {
            out.push(module.as_str().to_string());
        }
    }
    Ok(out)
}

fn check_prices(prices: &[Option<Decimal>]) -> Result<(), AppError> {
    match prices.iter().flatten().find(|p| p.is_sign_negative() && !p.is_zero()) {
        Some(p) => Err(AppError::new(ErrorCode::InvalidPrice).with_detail("price", p.to_string())),
        None => Ok(()),
    }
}

/// All packages, inactive ones included
pub async fn list_packages(State(state): State<AppState>) -> ApiResult<Vec<PricingPackage>> {
    Ok(Json(db::packages::list(&state.pool, false).await?))
}

pub async fn create_package(
    State(state): State<AppState>,
    Json(data): Json<PricingPackageCreate>,
) -> ApiResult<PricingPackage> {
    data.validate()?;
    check_prices(&[Some(data.monthly_price), Some(data.yearly_price)])?;
    let features = normalize_features(&data.features)?;

    let package = db::packages::create(
        &state.pool,
        shared::util::snowflake_id(),
        &data,
        &features,
        now_millis(),
    )
    .await?;
    tracing::info!(package_id = package.id, name = %package.name, "Pricing package created");
    Ok(Json(package))
}

pub async fn update_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<PricingPackageUpdate>,
) -> ApiResult<PricingPackage> {
    data.validate()?;
    check_prices(&[data.monthly_price, data.yearly_price])?;
    let features = data.features.as_deref().map(normalize_features).transpose()?;

    let package = db::packages::update(&state.pool, id, &data, features.as_deref(), now_millis())
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;
    Ok(Json(package))
}

pub async fn delete_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ServiceError> {
    if !db::packages::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::PackageNotFound).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_features() {
        let out = normalize_features(&strings(&["menu", " orders ", "menu"])).unwrap();
        assert_eq!(out, strings(&["menu", "orders"]));

        let err = normalize_features(&strings(&["menu", "kitchen"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(normalize_features(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_check_prices() {
        assert!(check_prices(&[Some(Decimal::ZERO), None]).is_ok());
        let err = check_prices(&[None, Some(Decimal::new(-500, 2))]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrice);
    }
}

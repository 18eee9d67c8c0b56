//! Read-only views the public site renders from.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use showroom_types::Record;
use showroom_types::catalog::{self, CatalogPage, CatalogQuery, View};
use showroom_types::models::Item;

use crate::error::ApiResult;
use crate::state::{AppState, with_db};

async fn all_items(state: &AppState) -> ApiResult<Vec<Record<Item>>> {
    with_db(state, |db| Ok(db.find_all::<Item>()?)).await
}

pub async fn collabs(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<CatalogPage>> {
    let items = all_items(&state).await?;
    Ok(Json(catalog::browse(items, View::Collabs, &query, Utc::now())?))
}

pub async fn releases(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<CatalogPage>> {
    let items = all_items(&state).await?;
    Ok(Json(catalog::browse(items, View::Releases, &query, Utc::now())?))
}

pub async fn featured(State(state): State<AppState>) -> ApiResult<Json<Vec<Record<Item>>>> {
    let items = all_items(&state).await?;
    Ok(Json(catalog::featured(items)))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use showroom_types::Record;
use showroom_types::api::{ItemRequest, parse_date};
use showroom_types::models::Item;
use showroom_types::validate::require;

use crate::common::{IdQuery, envelope, message, optional_text};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

/// Tags and brands arrive from free-text inputs; drop the blanks.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Overlay the request onto `item`. Fields that are absent stay as they are.
fn apply(item: &mut Item, req: ItemRequest) -> ApiResult<()> {
    if let Some(name) = req.name {
        item.name = name.trim().to_string();
    }
    if let Some(description) = req.description {
        item.description = description;
    }
    if let Some(brands) = req.brands {
        item.brands = clean_list(brands);
    }
    if let Some(tags) = req.tags {
        item.tags = clean_list(tags);
    }
    if req.category.is_some() {
        item.category = optional_text(req.category);
    }
    if req.image.is_some() {
        item.image = optional_text(req.image);
    }
    if req.link.is_some() {
        item.link = optional_text(req.link);
    }
    if req.release_date.is_some() {
        item.release_date = parse_date(req.release_date.as_deref()).map_err(ApiError::BadRequest)?;
    }
    if let Some(featured) = req.is_featured {
        item.is_featured = featured;
    }
    if let Some(active) = req.is_active {
        item.is_active = active;
    }
    Ok(())
}

pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<Vec<Record<Item>>>> {
    let items = with_db(&state, |db| Ok(db.find_all::<Item>()?)).await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Record<Item>>> {
    let item = with_db(&state, move |db| {
        db.get::<Item>(&id)?.ok_or_else(|| ApiError::not_found("Item"))
    })
    .await?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<impl IntoResponse> {
    require(&[("name", req.name.as_deref())])?;

    let mut item = Item {
        name: String::new(),
        description: String::new(),
        brands: Vec::new(),
        category: None,
        tags: Vec::new(),
        image: None,
        link: None,
        release_date: None,
        is_featured: false,
        is_active: true,
    };
    apply(&mut item, req)?;

    let item = with_db(&state, move |db| Ok(db.insert(&item)?)).await?;
    info!("Item '{}' created", item.doc.name);
    Ok((StatusCode::CREATED, envelope("Item created", "item", &item)?))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.is_some() {
        require(&[("name", req.name.as_deref())])?;
    }

    let item = with_db(&state, move |db| {
        let Some(current) = db.get::<Item>(&id)? else {
            return Err(ApiError::not_found("Item"));
        };
        let mut item = current.doc;
        apply(&mut item, req)?;
        db.replace(&id, &item)?.ok_or_else(|| ApiError::not_found("Item"))
    })
    .await?;

    Ok(envelope("Item updated", "item", &item)?)
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_item_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("Item")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<serde_json::Value>> {
    with_db(state, move |db| {
        db.delete::<Item>(&id)?.ok_or_else(|| ApiError::not_found("Item"))
    })
    .await?;
    Ok(message("Item deleted"))
}

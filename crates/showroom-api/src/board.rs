//! Project status board: one column per status, holding the projects whose
//! `board_active` flag is set.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use showroom_types::Record;
use showroom_types::api::{BoardAddRequest, BoardColumn, BoardMoveRequest, WithClient};
use showroom_types::models::{Project, ProjectStatus};
use showroom_types::validate::present;

use crate::common::{ClientIndex, envelope};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct BoardRemoveQuery {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

/// Split on-board projects into status columns, in status order.
pub fn columns<T>(
    projects: Vec<T>,
    status_of: impl Fn(&T) -> ProjectStatus,
) -> Vec<BoardColumn<T>> {
    let mut columns: Vec<BoardColumn<T>> = ProjectStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            id: *status,
            title: status.as_str(),
            projects: Vec::new(),
        })
        .collect();

    for project in projects {
        let status = status_of(&project);
        if let Some(column) = columns.iter_mut().find(|c| c.id == status) {
            column.projects.push(project);
        }
    }
    columns
}

/// GET /api/board
pub async fn get_board(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BoardColumn<WithClient<Project>>>>> {
    let projects = with_db(&state, |db| {
        let clients = ClientIndex::load(db)?;
        Ok(db
            .find_all::<Project>()?
            .into_iter()
            .filter(|p| p.doc.board_active)
            .map(|p| {
                let client_id = p.doc.client_id.clone();
                clients.attach(p, &client_id)
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(Json(columns(projects, |p| p.record.doc.status)))
}

async fn set_flag(state: &AppState, id: String, active: bool) -> ApiResult<Record<Project>> {
    with_db(state, move |db| {
        db.modify::<Project, _>(&id, |project| {
            project.board_active = active;
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("Project"))
    })
    .await
}

/// PATCH /api/board/{id} — move a project to another column.
pub async fn move_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<BoardMoveRequest>,
) -> ApiResult<impl IntoResponse> {
    let status: ProjectStatus = present(req.status.as_deref())
        .ok_or_else(|| ApiError::bad_request("status is required"))?
        .parse()?;

    let project = with_db(&state, move |db| {
        db.modify::<Project, _>(&id, |project| {
            project.status = status;
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("Project"))
    })
    .await?;

    info!("Project {} moved to '{}'", project.doc.project_id, status);
    envelope("Project moved", "project", &project)
}

/// POST /api/board {projectId} — put a project back on the board.
pub async fn add_to_board(
    State(state): State<AppState>,
    Json(req): Json<BoardAddRequest>,
) -> ApiResult<impl IntoResponse> {
    let id = present(req.project_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("Project ID is required"))?
        .to_string();

    let project = set_flag(&state, id, true).await?;
    envelope("Project added to board", "project", &project)
}

/// DELETE /api/board?projectId= — hide a project from the board. The
/// document itself is kept.
pub async fn remove_from_board(
    State(state): State<AppState>,
    Query(query): Query<BoardRemoveQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = present(query.project_id.as_deref())
        .ok_or_else(|| ApiError::bad_request("Project ID is required"))?
        .to_string();

    let project = set_flag(&state, id, false).await?;
    envelope("Project removed from board", "project", &project)
}

/// POST /api/migrate/projects — give projects stored without a board flag
/// the default `board_active = true`.
pub async fn migrate_projects(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let modified = with_db(&state, |db| {
        Ok(db.backfill_missing_field::<Project>("board_active", &json!(true))?)
    })
    .await?;

    info!("Migration completed: {} projects updated", modified);
    Ok(Json(json!({
        "message": "Migration completed successfully",
        "modifiedCount": modified,
    })))
}

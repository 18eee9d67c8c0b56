use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use showroom_types::api::{ProjectRequest, WithClient};
use showroom_types::models::{Project, ProjectStatus};
use showroom_types::validate::{present, require};

use crate::common::{ClientIndex, IdQuery, descending, envelope, lookup_client, message, require_client, text, wrap};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub sort: Option<String>,
    pub status: Option<String>,
    pub client_id: Option<String>,
    /// `true` restricts the list to projects shown on the board.
    pub board: Option<bool>,
}

struct ProjectFields {
    client_id: String,
    project_name: String,
    project_description: String,
    status: Option<ProjectStatus>,
}

impl TryFrom<ProjectRequest> for ProjectFields {
    type Error = ApiError;

    fn try_from(req: ProjectRequest) -> ApiResult<Self> {
        require(&[
            ("client_id", req.client_id.as_deref()),
            ("project_name", req.project_name.as_deref()),
        ])?;
        let status = present(req.status.as_deref())
            .map(str::parse::<ProjectStatus>)
            .transpose()?;

        Ok(Self {
            client_id: text(req.client_id),
            project_name: text(req.project_name),
            project_description: req.project_description.unwrap_or_default(),
            status,
        })
    }
}

/// GET /api/projects, ordered by project name, each with its client resolved.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Vec<WithClient<Project>>>> {
    let projects = with_db(&state, move |db| {
        let mut projects = db.find_all::<Project>()?;
        if let Some(status) = present(query.status.as_deref()) {
            projects.retain(|p| p.doc.status.as_str() == status);
        }
        if let Some(client_id) = present(query.client_id.as_deref()) {
            projects.retain(|p| p.doc.client_id == client_id);
        }
        if query.board == Some(true) {
            projects.retain(|p| p.doc.board_active);
        }
        projects.sort_by(|a, b| a.doc.project_name.cmp(&b.doc.project_name));
        if descending(query.sort.as_deref()) {
            projects.reverse();
        }

        let clients = ClientIndex::load(db)?;
        Ok(projects
            .into_iter()
            .map(|p| {
                let client_id = p.doc.client_id.clone();
                clients.attach(p, &client_id)
            })
            .collect())
    })
    .await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = ProjectFields::try_from(req)?;

    let project = with_db(&state, move |db| {
        require_client(db, &fields.client_id)?;
        Ok(db.insert_sequenced(|project_id| Project {
            project_id,
            client_id: fields.client_id,
            project_name: fields.project_name,
            project_description: fields.project_description,
            status: fields.status.unwrap_or_default(),
            board_active: true,
        })?)
    })
    .await?;

    info!("Project {} '{}' created", project.doc.project_id, project.doc.project_name);
    Ok((StatusCode::CREATED, envelope("Project created", "project", &project)?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let project = with_db(&state, move |db| {
        let project = db.get::<Project>(&id)?.ok_or_else(|| ApiError::not_found("Project"))?;
        let client = lookup_client(db, &project.doc.client_id)?;
        Ok(WithClient {
            record: project,
            client,
        })
    })
    .await?;
    wrap("project", &project)
}

/// PUT /api/projects/{id}. Status and board membership are kept when the
/// body omits them.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = ProjectFields::try_from(req)?;

    let project = with_db(&state, move |db| {
        if db.get::<Project>(&id)?.is_none() {
            return Err(ApiError::not_found("Project"));
        }
        require_client(db, &fields.client_id)?;

        db.modify::<Project, _>(&id, |project| {
            project.client_id = fields.client_id;
            project.project_name = fields.project_name;
            project.project_description = fields.project_description;
            if let Some(status) = fields.status {
                project.status = status;
            }
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("Project"))
    })
    .await?;

    Ok(envelope("Project updated", "project", &project)?)
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_project_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("Project")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<Value>> {
    with_db(state, move |db| {
        db.delete::<Project>(&id)?.ok_or_else(|| ApiError::not_found("Project"))
    })
    .await?;
    Ok(message("Project deleted"))
}

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};

use showroom_db::Database;
use showroom_types::Record;
use showroom_types::api::{CollectionCounts, DashboardResponse, DashboardStats};
use showroom_types::events::{Activity, ActivityKind, most_recent};
use showroom_types::models::{
    Client, ClientStatus, Faq, Hosting, HostingStatus, Item, Project, ProjectStatus, User,
};

use crate::error::ApiResult;
use crate::state::{AppState, with_db};

const RECENT_ACTIVITY: usize = 4;

/// Newest `n` records by creation time.
fn newest<T>(mut records: Vec<Record<T>>, n: usize) -> Vec<Record<T>> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(n);
    records
}

fn counts<T>(records: &[Record<T>], active: impl Fn(&T) -> bool) -> CollectionCounts {
    CollectionCounts::from_flags(records.iter().map(|r| active(&r.doc)))
}

pub fn summarize(db: &Database, now: DateTime<Utc>) -> anyhow::Result<DashboardResponse> {
    let users = db.find_all::<User>()?;
    let items = db.find_all::<Item>()?;
    let faqs = db.find_all::<Faq>()?;
    let clients = db.find_all::<Client>()?;
    let projects = db.find_all::<Project>()?;
    let hostings = db.find_all::<Hosting>()?;

    let mut collections = BTreeMap::new();
    collections.insert("users".to_string(), counts(&users, |_| true));
    collections.insert("items".to_string(), counts(&items, |i| i.is_active));
    collections.insert("faqs".to_string(), counts(&faqs, |f| f.is_active));
    collections.insert(
        "clients".to_string(),
        counts(&clients, |c| c.status == ClientStatus::Active),
    );
    collections.insert(
        "projects".to_string(),
        counts(&projects, |p| p.status != ProjectStatus::Completed),
    );
    collections.insert(
        "hostings".to_string(),
        counts(&hostings, |h| h.status == HostingStatus::Active),
    );

    let stats = DashboardStats {
        total_users: users.len(),
        total_items: items.len(),
        active_items: collections["items"].active,
        total_questions: faqs.len(),
        total_clients: clients.len(),
        total_projects: projects.len(),
        total_hostings: hostings.len(),
    };

    let activity: Vec<Activity> = newest(users, 2)
        .into_iter()
        .map(|u| Activity::new(ActivityKind::User, u.doc.name, u.created_at, now))
        .chain(
            newest(items, 2)
                .into_iter()
                .map(|i| Activity::new(ActivityKind::Item, i.doc.name, i.created_at, now)),
        )
        .chain(
            newest(faqs, 1)
                .into_iter()
                .map(|f| Activity::new(ActivityKind::Question, f.doc.question, f.created_at, now)),
        )
        .collect();

    Ok(DashboardResponse {
        stats,
        collections,
        recent_activity: most_recent(activity, RECENT_ACTIVITY),
    })
}

/// GET /api/dashboard
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let summary = with_db(&state, |db| Ok(summarize(db, Utc::now())?)).await?;
    Ok(Json(summary))
}

use std::collections::{BTreeMap, HashMap};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use showroom_db::{Database, Unique};
use showroom_types::Record;
use showroom_types::api::{
    BulkClientEntry, BulkRequest, BulkResponse, BulkResults, ClientRequest, ClientSearchResponse,
    ClientStats, IndustryCount, MonthCount, Pagination, YearCount, parse_date,
};
use showroom_types::models::{Client, ClientStatus};
use showroom_types::validate::{optional_email, present, require};

use crate::common::{IdQuery, descending, envelope, message, optional_text, wrap};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

const SEARCH_PAGE_SIZE: usize = 50;
const TOP_INDUSTRIES: usize = 10;
const RECENT_DAYS: i64 = 30;
const GROWTH_MONTHS: u32 = 6;

/// Validated client fields from a request body. `None` means "not sent".
#[derive(Debug, Default)]
struct ClientFields {
    client_id: Option<String>,
    company_name: Option<String>,
    contact_name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
    industry: Option<String>,
    client_since: Option<DateTime<Utc>>,
    status: Option<ClientStatus>,
}

impl TryFrom<ClientRequest> for ClientFields {
    type Error = ApiError;

    fn try_from(req: ClientRequest) -> ApiResult<Self> {
        if let Some(email) = req.email.as_deref() {
            optional_email(email.trim())?;
        }
        let status = present(req.status.as_deref())
            .map(str::parse::<ClientStatus>)
            .transpose()?;
        let client_since = parse_date(req.client_since.as_deref()).map_err(ApiError::BadRequest)?;
        let client_id = optional_text(req.client_id).map(|id| client_number(&id)).transpose()?;

        Ok(Self {
            client_id,
            company_name: req.company_name.map(|v| v.trim().to_string()),
            contact_name: req.contact_name.map(|v| v.trim().to_string()),
            email: req.email.map(|v| v.trim().to_string()),
            phone_number: req.phone_number,
            address: req.address,
            industry: req.industry.map(|v| v.trim().to_string()),
            client_since,
            status,
        })
    }
}

impl ClientFields {
    fn into_client(self, client_id: String) -> Client {
        Client {
            client_id,
            company_name: self.company_name.unwrap_or_default(),
            contact_name: self.contact_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone_number: self.phone_number.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            industry: self.industry.unwrap_or_default(),
            client_since: self.client_since.unwrap_or_else(Utc::now),
            status: self.status.unwrap_or_default(),
        }
    }

    /// Full update: omitted text fields become empty and status resets to the
    /// default. `client_id` and `client_since` are kept unless sent.
    fn replace_into(self, client: &mut Client) {
        if let Some(id) = self.client_id {
            client.client_id = id;
        }
        client.company_name = self.company_name.unwrap_or_default();
        client.contact_name = self.contact_name.unwrap_or_default();
        client.email = self.email.unwrap_or_default();
        client.phone_number = self.phone_number.unwrap_or_default();
        client.address = self.address.unwrap_or_default();
        client.industry = self.industry.unwrap_or_default();
        if let Some(since) = self.client_since {
            client.client_since = since;
        }
        client.status = self.status.unwrap_or_default();
    }

    /// Partial update: only the fields that were sent change.
    fn merge_into(self, client: &mut Client) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }
        set(&mut client.client_id, self.client_id);
        set(&mut client.company_name, self.company_name);
        set(&mut client.contact_name, self.contact_name);
        set(&mut client.email, self.email);
        set(&mut client.phone_number, self.phone_number);
        set(&mut client.address, self.address);
        set(&mut client.industry, self.industry);
        set(&mut client.client_since, self.client_since);
        set(&mut client.status, self.status);
    }
}

/// A hand-set `client_id` must be a number the sequence can still count past.
/// Returned in canonical form, so `"007"` and `"7"` are the same id.
fn client_number(raw: &str) -> ApiResult<String> {
    match raw.parse::<i64>() {
        Ok(n) if (1..i64::MAX).contains(&n) => Ok(n.to_string()),
        _ => Err(ApiError::bad_request(format!(
            "client_id must be a whole number between 1 and {}",
            i64::MAX - 1
        ))),
    }
}

fn require_names(req: &ClientRequest) -> ApiResult<()> {
    require(&[
        ("company_name", req.company_name.as_deref()),
        ("contact_name", req.contact_name.as_deref()),
    ])?;
    Ok(())
}

// -- CRUD --

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub sort: Option<String>,
    pub status: Option<String>,
    pub industry: Option<String>,
}

/// GET /api/clients, ordered by company name.
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> ApiResult<Json<Vec<Record<Client>>>> {
    let mut clients = with_db(&state, |db| Ok(db.find_all::<Client>()?)).await?;

    if let Some(status) = present(query.status.as_deref()) {
        clients.retain(|c| c.doc.status.as_str() == status);
    }
    if let Some(industry) = present(query.industry.as_deref()) {
        let industry = industry.to_lowercase();
        clients.retain(|c| contains_ci(&c.doc.industry, &industry));
    }

    clients.sort_by(|a, b| a.doc.company_name.cmp(&b.doc.company_name));
    if descending(query.sort.as_deref()) {
        clients.reverse();
    }
    Ok(Json(clients))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(req): Json<ClientRequest>,
) -> ApiResult<impl IntoResponse> {
    require_names(&req)?;
    let fields = ClientFields::try_from(req)?;

    let client = with_db(&state, move |db| {
        Ok(db.insert_sequenced(|client_id| fields.into_client(client_id))?)
    })
    .await?;

    info!("Client {} '{}' created", client.doc.client_id, client.doc.company_name);
    Ok((StatusCode::CREATED, envelope("Client created", "client", &client)?))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let client = with_db(&state, move |db| {
        db.get::<Client>(&id)?.ok_or_else(|| ApiError::not_found("Client"))
    })
    .await?;
    wrap("client", &client)
}

/// PUT /api/clients/{id}. May renumber the client; a clash is a 409.
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ClientRequest>,
) -> ApiResult<impl IntoResponse> {
    require_names(&req)?;
    let fields = ClientFields::try_from(req)?;

    let client = with_db(&state, move |db| {
        let written = db.modify_unique::<Client, _>(&id, "client_id", |client| {
            fields.replace_into(client);
            Ok(())
        })?;
        match written {
            Some(Unique::Written(client)) => Ok(client),
            Some(Unique::Taken) => Err(ApiError::Conflict("Client ID already exists".to_string())),
            None => Err(ApiError::not_found("Client")),
        }
    })
    .await?;

    Ok(envelope("Client updated", "client", &client)?)
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_client_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("Client")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<Value>> {
    let client = with_db(state, move |db| {
        db.delete::<Client>(&id)?.ok_or_else(|| ApiError::not_found("Client"))
    })
    .await?;
    info!("Client {} deleted", client.doc.client_id);
    Ok(message("Client deleted"))
}

// -- Search --

#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub industry: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive substring match over the searchable fields.
fn matches_query(client: &Client, q: &str) -> bool {
    let q = q.to_lowercase();
    [
        &client.company_name,
        &client.contact_name,
        &client.email,
        &client.client_id,
        &client.industry,
    ]
    .iter()
    .any(|field| contains_ci(field, &q))
}

pub fn search(
    clients: Vec<Record<Client>>,
    query: &ClientSearchQuery,
) -> ClientSearchResponse<Record<Client>> {
    let mut hits: Vec<Record<Client>> = clients
        .into_iter()
        .filter(|c| present(query.q.as_deref()).is_none_or(|q| matches_query(&c.doc, q)))
        .filter(|c| present(query.status.as_deref()).is_none_or(|s| c.doc.status.as_str() == s))
        .filter(|c| {
            present(query.industry.as_deref())
                .is_none_or(|i| contains_ci(&c.doc.industry, &i.to_lowercase()))
        })
        .collect();
    hits.sort_by(|a, b| a.doc.company_name.cmp(&b.doc.company_name));

    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(SEARCH_PAGE_SIZE);
    let total_count = hits.len();

    let clients = hits
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    ClientSearchResponse {
        clients,
        pagination: Pagination {
            page,
            limit,
            total_count,
            total_pages: total_count.div_ceil(limit),
        },
    }
}

/// GET /api/clients/search?q&status&industry&page&limit
pub async fn search_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientSearchQuery>,
) -> ApiResult<Json<ClientSearchResponse<Record<Client>>>> {
    let clients = with_db(&state, |db| Ok(db.find_all::<Client>()?)).await?;
    Ok(Json(search(clients, &query)))
}

// -- Stats --

pub fn stats(clients: &[Record<Client>], now: DateTime<Utc>) -> ClientStats {
    let recent_since = now - Duration::days(RECENT_DAYS);
    let growth_since = now.checked_sub_months(Months::new(GROWTH_MONTHS)).unwrap_or(now);

    let mut status_breakdown = BTreeMap::new();
    let mut industries: HashMap<&str, usize> = HashMap::new();
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    let mut years: BTreeMap<i32, usize> = BTreeMap::new();

    for client in clients {
        *status_breakdown
            .entry(client.doc.status.as_str().to_string())
            .or_insert(0) += 1;
        if !client.doc.industry.is_empty() {
            *industries.entry(client.doc.industry.as_str()).or_insert(0) += 1;
        }
        if client.created_at >= growth_since {
            let key = (client.created_at.year(), client.created_at.month());
            *months.entry(key).or_insert(0) += 1;
        }
        *years.entry(client.doc.client_since.year()).or_insert(0) += 1;
    }

    let mut top_industries: Vec<IndustryCount> = industries
        .into_iter()
        .map(|(industry, count)| IndustryCount {
            industry: industry.to_string(),
            count,
        })
        .collect();
    top_industries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.industry.cmp(&b.industry)));
    top_industries.truncate(TOP_INDUSTRIES);

    ClientStats {
        total_clients: clients.len(),
        recent_clients: clients.iter().filter(|c| c.created_at >= recent_since).count(),
        status_breakdown,
        top_industries,
        monthly_growth: months
            .into_iter()
            .map(|((year, month), count)| MonthCount { year, month, count })
            .collect(),
        clients_since_breakdown: years
            .into_iter()
            .rev()
            .map(|(year, count)| YearCount { year, count })
            .collect(),
    }
}

pub async fn client_stats(State(state): State<AppState>) -> ApiResult<Json<ClientStats>> {
    let clients = with_db(&state, |db| Ok(db.find_all::<Client>()?)).await?;
    Ok(Json(stats(&clients, Utc::now())))
}

// -- Bulk --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Create,
    Update,
    Delete,
    UpdateStatus,
}

impl BulkOperation {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "updateStatus" => Some(Self::UpdateStatus),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::UpdateStatus => "status update",
        }
    }
}

fn failure(entry: &BulkClientEntry, error: impl std::fmt::Display) -> Value {
    json!({
        "_id": entry.id,
        "client_id": entry.fields.client_id,
        "company_name": entry.fields.company_name,
        "error": error.to_string(),
    })
}

fn reference(entry: &BulkClientEntry) -> Value {
    json!({ "_id": entry.id, "client_id": entry.fields.client_id })
}

fn record_json(client: &Record<Client>) -> Value {
    serde_json::to_value(client).unwrap_or(Value::Null)
}

/// Find a client by `_id`, falling back to its `client_id`.
fn locate(db: &Database, entry: &BulkClientEntry) -> anyhow::Result<Option<String>> {
    if let Some(id) = entry.id.as_deref() {
        return Ok(db.get::<Client>(id)?.map(|c| c.id));
    }
    match entry.fields.client_id.as_deref() {
        Some(client_id) => Ok(db.find_one_by::<Client>("client_id", client_id)?.map(|c| c.id)),
        None => Ok(None),
    }
}

fn bulk_create(db: &Database, entry: BulkClientEntry, results: &mut BulkResults) -> ApiResult<()> {
    if let Err(e) = require_names(&entry.fields) {
        results.failed.push(failure(&entry, e));
        return Ok(());
    }
    let fields = match ClientFields::try_from(entry.fields.clone()) {
        Ok(fields) => fields,
        Err(e) => {
            results.failed.push(failure(&entry, e));
            return Ok(());
        }
    };

    let client = match fields.client_id.clone() {
        Some(client_id) => {
            let client = fields.into_client(client_id.clone());
            match db.insert_unique("client_id", &client_id, &client)? {
                Unique::Written(client) => client,
                Unique::Taken => {
                    results.duplicates.get_or_insert_default().push(reference(&entry));
                    return Ok(());
                }
            }
        }
        None => db.insert_sequenced(|client_id| fields.into_client(client_id))?,
    };
    results.successful.push(record_json(&client));
    Ok(())
}

fn bulk_update(db: &Database, entry: BulkClientEntry, results: &mut BulkResults) -> ApiResult<()> {
    let Some(id) = entry.id.clone() else {
        results.failed.push(failure(&entry, "_id is required for updates"));
        return Ok(());
    };
    let fields = match ClientFields::try_from(entry.fields.clone()) {
        Ok(fields) => fields,
        Err(e) => {
            results.failed.push(failure(&entry, e));
            return Ok(());
        }
    };
    match db.modify_unique::<Client, _>(&id, "client_id", |client| {
        fields.merge_into(client);
        Ok(())
    })? {
        Some(Unique::Written(client)) => results.successful.push(record_json(&client)),
        Some(Unique::Taken) => results.failed.push(failure(&entry, "Client ID already exists")),
        None => results.not_found.get_or_insert_default().push(reference(&entry)),
    }
    Ok(())
}

fn bulk_delete(db: &Database, entry: BulkClientEntry, results: &mut BulkResults) -> ApiResult<()> {
    if entry.id.is_none() && entry.fields.client_id.is_none() {
        results.failed.push(failure(&entry, "_id or client_id is required for deletion"));
        return Ok(());
    }

    let deleted = match locate(db, &entry)? {
        Some(id) => db.delete::<Client>(&id)?,
        None => None,
    };
    match deleted {
        Some(client) => results.successful.push(json!({
            "_id": client.id,
            "client_id": client.doc.client_id,
            "company_name": client.doc.company_name,
        })),
        None => results.not_found.get_or_insert_default().push(reference(&entry)),
    }
    Ok(())
}

fn bulk_update_status(
    db: &Database,
    entry: BulkClientEntry,
    results: &mut BulkResults,
) -> ApiResult<()> {
    if entry.id.is_none() && entry.fields.client_id.is_none() {
        results.failed.push(failure(&entry, "_id or client_id is required for status updates"));
        return Ok(());
    }
    let status = match present(entry.fields.status.as_deref()).map(str::parse::<ClientStatus>) {
        None => {
            results.failed.push(failure(&entry, "status is required"));
            return Ok(());
        }
        Some(Err(e)) => {
            results.failed.push(failure(&entry, e));
            return Ok(());
        }
        Some(Ok(status)) => status,
    };

    let updated = match locate(db, &entry)? {
        Some(id) => db.modify::<Client, _>(&id, |client| {
            client.status = status;
            Ok(())
        })?,
        None => None,
    };
    match updated {
        Some(client) => results.successful.push(record_json(&client)),
        None => results.not_found.get_or_insert_default().push(reference(&entry)),
    }
    Ok(())
}

fn summary(operation: BulkOperation, results: &BulkResults) -> String {
    let mut text = format!(
        "Bulk {} completed: {} successful, {} failed",
        operation.label(),
        results.successful.len(),
        results.failed.len()
    );
    match operation {
        BulkOperation::Create => {
            let duplicates = results.duplicates.as_ref().map_or(0, Vec::len);
            text.push_str(&format!(", {duplicates} duplicates"));
        }
        _ => {
            let missing = results.not_found.as_ref().map_or(0, Vec::len);
            text.push_str(&format!(", {missing} not found"));
        }
    }
    text
}

/// Apply one operation to each entry independently. A bad entry is reported
/// in `failed` and never aborts the rest.
pub fn run_bulk(db: &Database, operation: BulkOperation, entries: Vec<Value>) -> ApiResult<BulkResponse> {
    let mut results = BulkResults::default();
    match operation {
        BulkOperation::Create => results.duplicates = Some(Vec::new()),
        _ => results.not_found = Some(Vec::new()),
    }

    for raw in entries {
        let entry: BulkClientEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                results.failed.push(json!({ "error": format!("Invalid client entry: {e}") }));
                continue;
            }
        };
        match operation {
            BulkOperation::Create => bulk_create(db, entry, &mut results)?,
            BulkOperation::Update => bulk_update(db, entry, &mut results)?,
            BulkOperation::Delete => bulk_delete(db, entry, &mut results)?,
            BulkOperation::UpdateStatus => bulk_update_status(db, entry, &mut results)?,
        }
    }

    Ok(BulkResponse {
        message: summary(operation, &results),
        results,
    })
}

/// POST /api/clients/bulk
pub async fn bulk_clients(
    State(state): State<AppState>,
    Json(req): Json<BulkRequest>,
) -> ApiResult<Json<BulkResponse>> {
    let (Some(operation), Some(entries)) = (req.operation, req.clients) else {
        return Err(ApiError::bad_request("Operation and clients array are required"));
    };
    let operation = BulkOperation::parse(&operation).ok_or_else(|| {
        warn!("Rejected bulk operation '{}'", operation);
        ApiError::bad_request(
            "Invalid operation. Use 'create', 'update', 'delete', or 'updateStatus'",
        )
    })?;

    let response = with_db(&state, move |db| run_bulk(db, operation, entries)).await?;
    info!("{}", response.message);
    Ok(Json(response))
}

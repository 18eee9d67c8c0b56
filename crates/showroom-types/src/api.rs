use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Activity;
use crate::models::{
    ClientSummary, ConnectionType, FooterColumn, Hosting, HostingStatus, ProjectStatus, Record,
    SshConnection,
};

// -- JWT Claims --

/// Bearer token payload. `sub` is the `_id` of the user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Parses the date formats the admin forms send: full RFC 3339 timestamps or
/// bare `YYYY-MM-DD` (taken as midnight UTC). Blank means "not provided".
pub fn parse_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| format!("Invalid date: '{raw}'"))
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub name: Option<String>,
    #[serde(alias = "email")]
    pub mail: Option<String>,
    pub password: Option<String>,
}

// -- Items / FAQ --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brands: Option<Vec<String>>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub release_date: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub is_active: Option<bool>,
}

// -- Clients --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientRequest {
    pub client_id: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub client_since: Option<String>,
    pub status: Option<String>,
}

/// One entry of a bulk client operation. `_id` addresses a document,
/// `client_id` addresses a client by its sequential number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkClientEntry {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: ClientRequest,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub operation: Option<String>,
    pub clients: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResults {
    pub successful: Vec<serde_json::Value>,
    pub failed: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkResponse {
    pub message: String,
    pub results: BulkResults,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ClientSearchResponse<T> {
    pub clients: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct IndustryCount {
    pub industry: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_clients: usize,
    pub recent_clients: usize,
    pub status_breakdown: BTreeMap<String, usize>,
    pub top_industries: Vec<IndustryCount>,
    pub monthly_growth: Vec<MonthCount>,
    pub clients_since_breakdown: Vec<YearCount>,
}

// -- Contacts / Projects --

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub client_id: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub client_id: Option<String>,
    pub project_name: Option<String>,
    pub project_description: Option<String>,
    pub status: Option<String>,
}

/// A document with its soft-referenced client resolved (or `null`).
#[derive(Debug, Serialize)]
pub struct WithClient<T> {
    #[serde(flatten)]
    pub record: Record<T>,
    pub client: Option<ClientSummary>,
}

// -- Board --

#[derive(Debug, Deserialize)]
pub struct BoardMoveRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BoardAddRequest {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BoardColumn<T> {
    pub id: ProjectStatus,
    pub title: &'static str,
    pub projects: Vec<T>,
}

// -- Hostings --

#[derive(Debug, Default, Deserialize)]
pub struct SshConnectionRequest {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HostingRequest {
    pub client_id: Option<String>,
    pub host_provider: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub domain_name: Option<String>,
    #[serde(alias = "putty_connection")]
    pub ssh_connection: Option<SshConnectionRequest>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SshConnectionView {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub connection_type: ConnectionType,
    pub has_password: bool,
}

impl From<SshConnection> for SshConnectionView {
    fn from(ssh: SshConnection) -> Self {
        Self {
            hostname: ssh.hostname,
            port: ssh.port,
            username: ssh.username,
            connection_type: ssh.connection_type,
            has_password: ssh.password.is_some(),
        }
    }
}

/// A hosting as returned to clients. Password hashes never leave the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct HostingView {
    pub hosting_id: String,
    pub client_id: String,
    pub host_provider: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub domain_name: Option<String>,
    pub ssh_connection: Option<SshConnectionView>,
    pub status: HostingStatus,
    pub has_password: bool,
}

impl From<Hosting> for HostingView {
    fn from(h: Hosting) -> Self {
        Self {
            hosting_id: h.hosting_id,
            client_id: h.client_id,
            host_provider: h.host_provider,
            username: h.username,
            email: h.email,
            domain_name: h.domain_name,
            ssh_connection: h.ssh_connection.map(SshConnectionView::from),
            status: h.status,
            has_password: h.password.is_some(),
        }
    }
}

// -- Settings --

#[derive(Debug, Default, Deserialize)]
pub struct SocialMediaRequest {
    pub youtube: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterRequest {
    pub columns: Option<Vec<FooterColumn>>,
    pub social_media: Option<SocialMediaRequest>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ColorRequest {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub text: Option<String>,
    pub background: Option<String>,
}

// -- Contact form --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub contact_details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InquiryUpdate {
    pub handled: bool,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub size: u64,
}

// -- Dashboard --

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

impl CollectionCounts {
    pub fn from_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let (mut active, mut inactive) = (0, 0);
        for flag in flags {
            if flag {
                active += 1;
            } else {
                inactive += 1;
            }
        }
        Self {
            total: active + inactive,
            active,
            inactive,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_items: usize,
    pub active_items: usize,
    pub total_questions: usize,
    pub total_clients: usize,
    pub total_projects: usize,
    pub total_hostings: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub collections: BTreeMap<String, CollectionCounts>,
    pub recent_activity: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parse_date_accepts_form_and_rfc3339_dates() {
        let d = parse_date(Some("2024-03-05")).unwrap().unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2024, 3, 5, 0));

        let ts = parse_date(Some("2024-03-05T10:30:00+02:00")).unwrap().unwrap();
        assert_eq!(ts.hour(), 8);

        assert_eq!(parse_date(Some("  ")).unwrap(), None);
        assert_eq!(parse_date(None).unwrap(), None);
        assert!(parse_date(Some("05/03/2024")).is_err());
    }

    #[test]
    fn collection_counts_total_is_active_plus_inactive() {
        let counts = CollectionCounts::from_flags([true, false, true, true]);
        assert_eq!(counts.active, 3);
        assert_eq!(counts.inactive, 1);
        assert_eq!(counts.total, counts.active + counts.inactive);
    }

    #[test]
    fn hosting_view_hides_password_hashes() {
        let hosting = Hosting {
            hosting_id: "1".into(),
            client_id: "2".into(),
            host_provider: "Acme".into(),
            username: None,
            email: None,
            password: Some("$argon2id$secret".into()),
            domain_name: None,
            ssh_connection: Some(SshConnection {
                hostname: "h".into(),
                port: 22,
                username: "root".into(),
                password: Some("$argon2id$other".into()),
                connection_type: ConnectionType::Ssh,
            }),
            status: HostingStatus::Active,
        };

        let json = serde_json::to_string(&HostingView::from(hosting)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"has_password\":true"));
    }
}

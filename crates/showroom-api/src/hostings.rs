use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use showroom_types::Record;
use showroom_types::api::{HostingRequest, HostingView, SshConnectionRequest, WithClient};
use showroom_types::models::{ConnectionType, Hosting, HostingStatus, SshConnection};
use showroom_types::validate::{optional_email, present, require};

use crate::auth::hash_password;
use crate::common::{ClientIndex, IdQuery, descending, envelope, lookup_client, message, optional_text, require_client, text, wrap};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Deserialize)]
pub struct HostingListQuery {
    pub sort: Option<String>,
    pub status: Option<String>,
    pub client_id: Option<String>,
    pub host_provider: Option<String>,
}

fn view(record: Record<Hosting>) -> Record<HostingView> {
    record.map(HostingView::from)
}

/// Parsed SSH block. Passwords are still plaintext here.
struct SshFields {
    hostname: String,
    port: u16,
    username: String,
    password: Option<String>,
    connection_type: ConnectionType,
}

impl SshFields {
    /// `None` when the block carries nothing worth storing.
    fn parse(req: SshConnectionRequest) -> ApiResult<Option<Self>> {
        let hostname = text(req.hostname);
        let username = text(req.username);
        let password = optional_text(req.password);
        if hostname.is_empty() && username.is_empty() && password.is_none() {
            return Ok(None);
        }

        let connection_type = present(req.connection_type.as_deref())
            .map(str::parse::<ConnectionType>)
            .transpose()?
            .unwrap_or_default();

        Ok(Some(Self {
            hostname,
            port: req.port.filter(|p| *p > 0).unwrap_or(DEFAULT_SSH_PORT),
            username,
            password,
            connection_type,
        }))
    }

    /// Hash the new password, or keep `previous` when none was sent.
    fn into_connection(self, previous: Option<String>) -> ApiResult<SshConnection> {
        let password = match self.password {
            Some(plain) => Some(hash_password(&plain)?),
            None => previous,
        };
        Ok(SshConnection {
            hostname: self.hostname,
            port: self.port,
            username: self.username,
            password,
            connection_type: self.connection_type,
        })
    }
}

struct HostingFields {
    client_id: String,
    host_provider: String,
    username: Option<Option<String>>,
    email: Option<Option<String>>,
    password: Option<String>,
    domain_name: Option<Option<String>>,
    ssh: Option<Option<SshFields>>,
    status: Option<HostingStatus>,
}

impl TryFrom<HostingRequest> for HostingFields {
    type Error = ApiError;

    fn try_from(req: HostingRequest) -> ApiResult<Self> {
        require(&[
            ("client_id", req.client_id.as_deref()),
            ("host_provider", req.host_provider.as_deref()),
        ])?;
        if let Some(email) = req.email.as_deref() {
            optional_email(email.trim())?;
        }
        let status = present(req.status.as_deref())
            .map(str::parse::<HostingStatus>)
            .transpose()?;
        let ssh = req.ssh_connection.map(SshFields::parse).transpose()?;

        Ok(Self {
            client_id: text(req.client_id),
            host_provider: text(req.host_provider),
            // Outer `None`: not sent. Inner `None`: sent blank.
            username: req.username.map(|v| optional_text(Some(v))),
            email: req.email.map(|v| optional_text(Some(v))),
            password: optional_text(req.password),
            domain_name: req.domain_name.map(|v| optional_text(Some(v))),
            ssh,
            status,
        })
    }
}

impl HostingFields {
    fn into_hosting(self, hosting_id: String) -> ApiResult<Hosting> {
        Ok(Hosting {
            hosting_id,
            client_id: self.client_id,
            host_provider: self.host_provider,
            username: self.username.flatten(),
            email: self.email.flatten(),
            password: self.password.as_deref().map(hash_password).transpose()?,
            domain_name: self.domain_name.flatten(),
            ssh_connection: self.ssh.flatten().map(|s| s.into_connection(None)).transpose()?,
            status: self.status.unwrap_or_default(),
        })
    }

    /// Blank passwords keep the stored hash.
    fn apply(self, hosting: &mut Hosting) -> ApiResult<()> {
        hosting.client_id = self.client_id;
        hosting.host_provider = self.host_provider;
        if let Some(username) = self.username {
            hosting.username = username;
        }
        if let Some(email) = self.email {
            hosting.email = email;
        }
        if let Some(domain_name) = self.domain_name {
            hosting.domain_name = domain_name;
        }
        if let Some(plain) = self.password {
            hosting.password = Some(hash_password(&plain)?);
        }
        if let Some(ssh) = self.ssh {
            let previous = hosting.ssh_connection.take().and_then(|s| s.password);
            hosting.ssh_connection = ssh.map(|s| s.into_connection(previous)).transpose()?;
        }
        hosting.status = self.status.unwrap_or_default();
        Ok(())
    }
}

/// GET /api/hostings, ordered by domain name. Password hashes are replaced by
/// `has_password` flags.
pub async fn list_hostings(
    State(state): State<AppState>,
    Query(query): Query<HostingListQuery>,
) -> ApiResult<Json<Vec<WithClient<HostingView>>>> {
    let hostings = with_db(&state, move |db| {
        let mut hostings = db.find_all::<Hosting>()?;
        if let Some(status) = present(query.status.as_deref()) {
            hostings.retain(|h| h.doc.status.as_str() == status);
        }
        if let Some(client_id) = present(query.client_id.as_deref()) {
            hostings.retain(|h| h.doc.client_id == client_id);
        }
        if let Some(provider) = present(query.host_provider.as_deref()) {
            let provider = provider.to_lowercase();
            hostings.retain(|h| h.doc.host_provider.to_lowercase().contains(&provider));
        }
        hostings.sort_by(|a, b| a.doc.domain_name.cmp(&b.doc.domain_name));
        if descending(query.sort.as_deref()) {
            hostings.reverse();
        }

        let clients = ClientIndex::load(db)?;
        Ok(hostings
            .into_iter()
            .map(|h| {
                let client_id = h.doc.client_id.clone();
                clients.attach(view(h), &client_id)
            })
            .collect())
    })
    .await?;
    Ok(Json(hostings))
}

pub async fn create_hosting(
    State(state): State<AppState>,
    Json(req): Json<HostingRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = HostingFields::try_from(req)?;

    let hosting = with_db(&state, move |db| {
        require_client(db, &fields.client_id)?;
        // Hash before taking the store lock.
        let hosting = fields.into_hosting(String::new())?;
        Ok(db.insert_sequenced(|hosting_id| Hosting { hosting_id, ..hosting })?)
    })
    .await?;

    info!("Hosting {} created for client {}", hosting.doc.hosting_id, hosting.doc.client_id);
    Ok((StatusCode::CREATED, envelope("Hosting created", "hosting", &view(hosting))?))
}

pub async fn get_hosting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let hosting = with_db(&state, move |db| {
        let hosting = db.get::<Hosting>(&id)?.ok_or_else(|| ApiError::not_found("Hosting"))?;
        let client = lookup_client(db, &hosting.doc.client_id)?;
        Ok(WithClient {
            record: view(hosting),
            client,
        })
    })
    .await?;
    wrap("hosting", &hosting)
}

pub async fn update_hosting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<HostingRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = HostingFields::try_from(req)?;

    let hosting = with_db(&state, move |db| {
        let Some(current) = db.get::<Hosting>(&id)? else {
            return Err(ApiError::not_found("Hosting"));
        };
        require_client(db, &fields.client_id)?;

        let mut hosting = current.doc;
        fields.apply(&mut hosting)?;
        db.replace(&id, &hosting)?
            .ok_or_else(|| ApiError::not_found("Hosting"))
    })
    .await?;

    Ok(envelope("Hosting updated", "hosting", &view(hosting))?)
}

pub async fn delete_hosting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_hosting_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("Hosting")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<Value>> {
    with_db(state, move |db| {
        db.delete::<Hosting>(&id)?.ok_or_else(|| ApiError::not_found("Hosting"))
    })
    .await?;
    Ok(message("Hosting deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    fn request(ssh: Option<SshConnectionRequest>, password: Option<&str>) -> HostingRequest {
        HostingRequest {
            client_id: Some("1".into()),
            host_provider: Some("Acme Hosting".into()),
            username: None,
            email: None,
            password: password.map(str::to_string),
            domain_name: Some("example.com".into()),
            ssh_connection: ssh,
            status: None,
        }
    }

    #[test]
    fn empty_ssh_block_is_not_stored() {
        let fields = HostingFields::try_from(request(Some(SshConnectionRequest::default()), None)).unwrap();
        let hosting = fields.into_hosting("1".into()).unwrap();
        assert!(hosting.ssh_connection.is_none());
        assert!(hosting.password.is_none());
        assert_eq!(hosting.status, HostingStatus::Active);
    }

    #[test]
    fn blank_password_on_update_keeps_stored_hashes() {
        let ssh = SshConnectionRequest {
            hostname: Some("srv".into()),
            password: Some("ssh-secret".into()),
            ..Default::default()
        };
        let fields = HostingFields::try_from(request(Some(ssh), Some("panel-secret"))).unwrap();
        let mut hosting = fields.into_hosting("1".into()).unwrap();
        let panel_hash = hosting.password.clone().unwrap();
        assert!(verify_password("panel-secret", &panel_hash));

        let ssh = SshConnectionRequest {
            hostname: Some("srv2".into()),
            password: Some("   ".into()),
            ..Default::default()
        };
        let fields = HostingFields::try_from(request(Some(ssh), Some(""))).unwrap();
        fields.apply(&mut hosting).unwrap();

        assert_eq!(hosting.password.as_deref(), Some(panel_hash.as_str()));
        let ssh = hosting.ssh_connection.unwrap();
        assert_eq!(ssh.hostname, "srv2");
        assert_eq!(ssh.port, 22);
        assert!(verify_password("ssh-secret", ssh.password.as_deref().unwrap()));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut req = request(None, None);
        req.email = Some("not-an-email".into());
        assert!(matches!(HostingFields::try_from(req), Err(ApiError::BadRequest(_))));
    }
}

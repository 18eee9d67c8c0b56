use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;

use showroom_types::api::{ContactRequest, WithClient};
use showroom_types::models::Contact;
use showroom_types::validate::{present, require};

use crate::common::{ClientIndex, IdQuery, descending, envelope, lookup_client, message, require_client, text, wrap};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    pub sort: Option<String>,
    pub client_id: Option<String>,
}

/// Request body after the required-field check.
struct ContactFields {
    client_id: String,
    name: String,
    company: String,
    role: String,
    email: String,
    phone: String,
    notes: String,
}

impl TryFrom<ContactRequest> for ContactFields {
    type Error = ApiError;

    fn try_from(req: ContactRequest) -> ApiResult<Self> {
        require(&[("client_id", req.client_id.as_deref()), ("name", req.name.as_deref())])?;
        Ok(Self {
            client_id: text(req.client_id),
            name: text(req.name),
            company: text(req.company),
            role: text(req.role),
            email: text(req.email),
            phone: text(req.phone),
            notes: req.notes.unwrap_or_default(),
        })
    }
}

impl ContactFields {
    fn into_contact(self, contact_id: String) -> Contact {
        Contact {
            contact_id,
            client_id: self.client_id,
            name: self.name,
            company: self.company,
            role: self.role,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
        }
    }
}

/// GET /api/contacts, ordered by name, each with its client resolved.
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> ApiResult<Json<Vec<WithClient<Contact>>>> {
    let contacts = with_db(&state, move |db| {
        let mut contacts = db.find_all::<Contact>()?;
        if let Some(client_id) = present(query.client_id.as_deref()) {
            contacts.retain(|c| c.doc.client_id == client_id);
        }
        contacts.sort_by(|a, b| a.doc.name.cmp(&b.doc.name));
        if descending(query.sort.as_deref()) {
            contacts.reverse();
        }

        let clients = ClientIndex::load(db)?;
        Ok(contacts
            .into_iter()
            .map(|c| {
                let client_id = c.doc.client_id.clone();
                clients.attach(c, &client_id)
            })
            .collect())
    })
    .await?;
    Ok(Json(contacts))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = ContactFields::try_from(req)?;

    let contact = with_db(&state, move |db| {
        require_client(db, &fields.client_id)?;
        Ok(db.insert_sequenced(|contact_id| fields.into_contact(contact_id))?)
    })
    .await?;

    Ok((StatusCode::CREATED, envelope("Contact created", "contact", &contact)?))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let contact = with_db(&state, move |db| {
        let contact = db.get::<Contact>(&id)?.ok_or_else(|| ApiError::not_found("Contact"))?;
        let client = lookup_client(db, &contact.doc.client_id)?;
        Ok(WithClient {
            record: contact,
            client,
        })
    })
    .await?;
    wrap("contact", &contact)
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ContactRequest>,
) -> ApiResult<impl IntoResponse> {
    let fields = ContactFields::try_from(req)?;

    let contact = with_db(&state, move |db| {
        if db.get::<Contact>(&id)?.is_none() {
            return Err(ApiError::not_found("Contact"));
        }
        require_client(db, &fields.client_id)?;

        db.modify::<Contact, _>(&id, |contact| {
            *contact = fields.into_contact(contact.contact_id.clone());
            Ok(())
        })?
        .ok_or_else(|| ApiError::not_found("Contact"))
    })
    .await?;

    Ok(envelope("Contact updated", "contact", &contact)?)
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, id).await
}

pub async fn delete_contact_by_query(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<impl IntoResponse> {
    remove(&state, query.require("Contact")?).await
}

async fn remove(state: &AppState, id: String) -> ApiResult<Json<Value>> {
    with_db(state, move |db| {
        db.delete::<Contact>(&id)?.ok_or_else(|| ApiError::not_found("Contact"))
    })
    .await?;
    Ok(message("Contact deleted"))
}

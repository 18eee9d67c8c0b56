use std::collections::HashSet;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use showroom_api::auth::{create_token, hash_password};
use showroom_api::{AppState, AppStateInner, router};
use showroom_db::Database;
use showroom_types::models::User;

const SECRET: &str = "test-secret";

struct TestApp {
    app: Router,
    state: AppState,
    token: String,
}

fn setup() -> TestApp {
    let db = Database::open_in_memory().unwrap();
    let admin = db
        .insert(&User {
            name: "Admin".into(),
            mail: "admin@example.com".into(),
            password: hash_password("correct horse").unwrap(),
        })
        .unwrap();

    let uploads = std::env::temp_dir().join(format!("showroom-test-{}", uuid::Uuid::new_v4()));
    let state = AppStateInner::new(db, SECRET, uploads);
    TestApp {
        app: router(state.clone()),
        token: create_token(SECRET, &admin.id).unwrap(),
        state,
    }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(&self.token), None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(&self.token), Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(&self.token), Some(body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(&self.token), Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(&self.token), None).await
    }

    async fn create_client(&self, company: &str) -> Value {
        let (status, body) = self
            .post("/api/clients", json!({ "company_name": company, "contact_name": "Jan" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["client"].clone()
    }
}

// -- Auth --

#[tokio::test]
async fn login_distinguishes_unknown_mail_and_wrong_password() {
    let t = setup();

    let (status, _) = t
        .call(Method::POST, "/api/auth/login", None, Some(json!({ "email": "nobody@example.com", "password": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t
        .call(Method::POST, "/api/auth/login", None, Some(json!({ "email": "admin@example.com", "password": "wrong" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid password");

    let (status, body) = t
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "  correct horse  " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = t.call(Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["mail"], "admin@example.com");
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_live_user() {
    let t = setup();

    let (status, _) = t.call(Method::GET, "/api/clients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.call(Method::GET, "/api/clients", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ghost = create_token(SECRET, "deleted-user").unwrap();
    let (status, _) = t.call(Method::GET, "/api/clients", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.call(Method::GET, "/api/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_listing_never_exposes_hashes_and_mail_is_unique() {
    let t = setup();

    let (status, _) = t
        .post("/api/users", json!({ "name": "Eve", "mail": "admin@example.com", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, created) = t
        .post("/api/users", json!({ "name": "Bob", "mail": "bob@example.com", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["user"].get("password").is_none());

    let (_, users) = t.get("/api/users").await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

// -- Clients --

#[tokio::test]
async fn client_ids_strictly_increase_and_are_never_reused() {
    let t = setup();

    let a = t.create_client("Acme").await;
    let b = t.create_client("Globex").await;
    assert_eq!(a["client_id"], "1");
    assert_eq!(b["client_id"], "2");
    assert_eq!(a["status"], "Prospect");

    let id = b["_id"].as_str().unwrap();
    let (status, _) = t.delete(&format!("/api/clients/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let c = t.create_client("Initech").await;
    assert_eq!(c["client_id"], "3");
}

#[tokio::test]
async fn concurrent_client_creates_get_distinct_ids() {
    let t = setup();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let app = t.app.clone();
            let token = t.token.clone();
            tokio::spawn(async move {
                let req = Request::builder()
                    .method(Method::POST)
                    .uri("/api/clients")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "company_name": format!("Co {i}"), "contact_name": "X" }).to_string(),
                    ))
                    .unwrap();
                let response = app.oneshot(req).await.unwrap();
                let bytes = response.into_body().collect().await.unwrap().to_bytes();
                let body: Value = serde_json::from_slice(&bytes).unwrap();
                body["client"]["client_id"].as_str().unwrap().to_string()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn deleting_missing_documents_is_404() {
    let t = setup();

    for uri in [
        "/api/clients/nope",
        "/api/contacts/nope",
        "/api/projects/nope",
        "/api/hostings/nope",
        "/api/items/nope",
        "/api/faq/nope",
        "/api/inquiries/nope",
        "/api/clients?id=nope",
        "/api/users?id=nope",
    ] {
        let (status, body) = t.delete(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}: {body}");
    }

    let (status, _) = t.delete("/api/clients").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_validation_and_renumber_conflicts() {
    let t = setup();

    let (status, body) = t.post("/api/clients", json!({ "company_name": "Acme" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "company_name and contact_name are required");

    let (status, _) = t
        .post("/api/clients", json!({ "company_name": "Acme", "contact_name": "Jan", "email": "bad@" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    t.create_client("Acme").await;
    let b = t.create_client("Globex").await;
    let id = b["_id"].as_str().unwrap();

    let (status, _) = t
        .put(
            &format!("/api/clients/{id}"),
            json!({ "client_id": "1", "company_name": "Globex", "contact_name": "Jan" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .put(
            &format!("/api/clients/{id}"),
            json!({ "client_id": "20", "company_name": "Globex", "contact_name": "Jan", "status": "Active" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client"]["client_id"], "20");

    // Numbering continues after the manually chosen id.
    let c = t.create_client("Initech").await;
    assert_eq!(c["client_id"], "21");

    let (_, body) = t.get(&format!("/api/clients/{id}")).await;
    assert_eq!(body["client"]["status"], "Active");
}

#[tokio::test]
async fn client_search_and_bulk_status() {
    let t = setup();
    for name in ["Alpha", "beta", "Gamma"] {
        t.create_client(name).await;
    }

    let (status, body) = t.get("/api/clients/search?q=BET").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalCount"], 1);
    assert_eq!(body["clients"][0]["company_name"], "beta");

    let (status, body) = t
        .post(
            "/api/clients/bulk",
            json!({ "operation": "updateStatus", "clients": [{ "client_id": "1", "status": "Inactive" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bulk status update completed: 1 successful, 0 failed, 0 not found");

    let (status, _) = t.post("/api/clients/bulk", json!({ "operation": "merge", "clients": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = t.get("/api/clients/stats").await;
    assert_eq!(stats["totalClients"], 3);
    assert_eq!(stats["statusBreakdown"]["Inactive"], 1);
}

// -- Contacts / projects / board --

#[tokio::test]
async fn dependents_require_an_existing_client() {
    let t = setup();

    let (status, _) = t.post("/api/contacts", json!({ "client_id": "9", "name": "Ann" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    t.create_client("Acme").await;
    let (status, body) = t.post("/api/contacts", json!({ "client_id": "1", "name": "Ann" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["contact"]["contact_id"], "1");

    let (_, list) = t.get("/api/contacts").await;
    assert_eq!(list[0]["client"]["company_name"], "Acme");
    assert_eq!(list[0]["company"], "");
}

#[tokio::test]
async fn board_moves_and_hides_projects_without_deleting_them() {
    let t = setup();
    t.create_client("Acme").await;

    let (status, body) = t
        .post("/api/projects", json!({ "client_id": "1", "project_name": "Site" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["project"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["project"]["status"], "Not Started");
    assert_eq!(body["project"]["board_active"], true);

    let (status, body) = t.patch(&format!("/api/board/{id}"), json!({ "status": "In Progress" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["status"], "In Progress");

    let (status, _) = t.patch(&format!("/api/board/{id}"), json!({ "status": "Done" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, board) = t.get("/api/board").await;
    assert_eq!(board.as_array().unwrap().len(), 4);
    assert_eq!(board[1]["id"], "In Progress");
    assert_eq!(board[1]["projects"][0]["_id"], id.as_str());

    let (status, body) = t.delete(&format!("/api/board?projectId={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["board_active"], false);

    let (status, body) = t.get(&format!("/api/projects/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["status"], "In Progress");
    assert_eq!(body["project"]["board_active"], false);

    let (_, board) = t.get("/api/board").await;
    assert!(board[1]["projects"].as_array().unwrap().is_empty());

    let (status, _) = t.post("/api/board", json!({ "projectId": id })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, on_board) = t.get("/api/projects?board=true").await;
    assert_eq!(on_board.as_array().unwrap().len(), 1);

    let (_, body) = t.post("/api/migrate/projects", json!({})).await;
    assert_eq!(body["modifiedCount"], 0);
}

// -- Hostings --

#[tokio::test]
async fn hosting_responses_never_contain_password_hashes() {
    let t = setup();
    t.create_client("Acme").await;

    let (status, body) = t
        .post(
            "/api/hostings",
            json!({
                "client_id": "1",
                "host_provider": "Provider",
                "password": "panel",
                "putty_connection": { "hostname": "srv", "password": "ssh" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let text = body.to_string();
    assert!(!text.contains("argon2"));
    assert_eq!(body["hosting"]["has_password"], true);
    assert_eq!(body["hosting"]["ssh_connection"]["has_password"], true);
    assert_eq!(body["hosting"]["ssh_connection"]["port"], 22);

    let (_, list) = t.get("/api/hostings").await;
    assert!(!list.to_string().contains("argon2"));
    assert_eq!(list[0]["client"]["company_name"], "Acme");
}

// -- Dashboard / settings / public forms --

#[tokio::test]
async fn dashboard_totals_are_active_plus_inactive() {
    let t = setup();
    t.post("/api/items", json!({ "name": "Live" })).await;
    t.post("/api/items", json!({ "name": "Hidden", "isActive": false })).await;
    t.post("/api/faq", json!({ "question": "Q?", "answer": "A." })).await;
    t.create_client("Acme").await;

    let (status, body) = t.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    for (name, counts) in body["collections"].as_object().unwrap() {
        let total = counts["total"].as_u64().unwrap();
        let sum = counts["active"].as_u64().unwrap() + counts["inactive"].as_u64().unwrap();
        assert_eq!(total, sum, "{name}");
    }
    assert_eq!(body["stats"]["totalItems"], 2);
    assert_eq!(body["stats"]["activeItems"], 1);
    assert_eq!(body["collections"]["clients"]["inactive"], 1);
    assert_eq!(body["recentActivity"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn footer_post_fills_missing_social_links() {
    let t = setup();

    let (status, footer) = t.call(Method::GET, "/api/settings/footer", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(footer["columns"][0]["title"], "Legal");

    let (status, body) = t
        .post(
            "/api/settings/footer",
            json!({ "columns": [], "socialMedia": { "instagram": "https://instagram.com/shop" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let social = &body["settings"]["socialMedia"];
    assert_eq!(social["instagram"], "https://instagram.com/shop");
    assert_eq!(social["youtube"], "");
    assert_eq!(social["facebook"], "");
    assert_eq!(social["twitter"], "");
    assert_eq!(body["settings"]["backgroundColor"], "#202020");

    let (_, body) = t.delete("/api/settings/footer").await;
    assert_eq!(body["settings"]["columns"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn contact_form_is_public_and_validated() {
    let t = setup();

    let (status, _) = t
        .call(Method::POST, "/api/contact", None, Some(json!({ "title": "Hi" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .call(
            Method::POST,
            "/api/contact",
            None,
            Some(json!({ "title": "Hi", "message": "Collab?", "contactDetails": "me@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, inquiries) = t.get("/api/inquiries").await;
    assert_eq!(inquiries[0]["handled"], false);
    let id = inquiries[0]["_id"].as_str().unwrap();

    let (status, body) = t.patch(&format!("/api/inquiries/{id}"), json!({ "handled": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inquiry"]["handled"], true);
}

#[tokio::test]
async fn catalog_splits_released_and_upcoming_items() {
    let t = setup();
    t.post("/api/items", json!({ "name": "Past", "releaseDate": "2020-01-01" })).await;
    t.post("/api/items", json!({ "name": "Future", "releaseDate": "2999-01-01", "isFeatured": true }))
        .await;

    let (_, collabs) = t.call(Method::GET, "/api/catalog/collabs", None, None).await;
    assert_eq!(collabs["totalItems"], 1);
    assert_eq!(collabs["items"][0]["name"], "Past");

    let (_, releases) = t.call(Method::GET, "/api/catalog/releases?sort=soonest", None, None).await;
    assert_eq!(releases["items"][0]["name"], "Future");
    assert_eq!(releases["limit"], 12);

    let (_, featured) = t.call(Method::GET, "/api/catalog/featured", None, None).await;
    assert_eq!(featured.as_array().unwrap().len(), 1);

    let (status, _) = t.post("/api/items", json!({ "name": "Bad date", "releaseDate": "tomorrow" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploads_accept_images_only() {
    let t = setup();

    let upload = |name: &str, body: &'static [u8]| {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/uploads?name={name}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", t.token))
            .body(Body::from(body))
            .unwrap()
    };

    let response = t.app.clone().oneshot(upload("notes.txt", b"hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = t.app.clone().oneshot(upload("logo.PNG", b"\x89PNG")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with("/uploads/") && path.ends_with(".png"));

    let file = path.trim_start_matches("/uploads/");
    let req = Request::builder()
        .uri(format!("/api/uploads?file={file}"))
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    std::fs::remove_dir_all(&t.state.uploads_dir).ok();
}

#[tokio::test]
async fn renumbering_to_the_integer_limit_is_rejected() {
    let t = setup();
    let a = t.create_client("Acme").await;
    let id = a["_id"].as_str().unwrap();

    let (status, body) = t
        .put(
            &format!("/api/clients/{id}"),
            json!({ "client_id": "9223372036854775807", "company_name": "Acme", "contact_name": "Jan" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("client_id"));

    for expected in ["2", "3"] {
        let next = t.create_client("Next").await;
        assert_eq!(next["client_id"], expected);
    }
}

#[tokio::test]
async fn client_list_filters_industry_case_insensitively() {
    let t = setup();
    let (status, _) = t
        .post(
            "/api/clients",
            json!({ "company_name": "Shop", "contact_name": "Jan", "industry": "Retail" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    t.create_client("Other").await;

    let (_, list) = t.get("/api/clients?industry=retail").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["company_name"], "Shop");
}

#[tokio::test]
async fn concurrent_signups_with_one_mail_store_one_user() {
    let t = setup();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let app = t.app.clone();
            let token = t.token.clone();
            tokio::spawn(async move {
                let req = Request::builder()
                    .method(Method::POST)
                    .uri("/api/users")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "name": format!("Twin {i}"), "mail": "twin@example.com", "password": "pw" })
                            .to_string(),
                    ))
                    .unwrap();
                app.oneshot(req).await.unwrap().status()
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::CONFLICT);
        }
    }
    assert_eq!(created, 1);

    let (_, users) = t.get("/api/users").await;
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn user_update_cannot_take_another_users_mail() {
    let t = setup();
    let (_, created) = t
        .post("/api/users", json!({ "name": "Bob", "mail": "bob@example.com", "password": "pw" }))
        .await;
    let id = created["user"]["_id"].as_str().unwrap();

    let (status, _) = t
        .put(&format!("/api/users/{id}"), json!({ "name": "Bob", "mail": "admin@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .put(&format!("/api/users/{id}"), json!({ "name": "Robert", "mail": "bob@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Robert");
}

#[tokio::test]
async fn catalog_rejects_unknown_sort_with_json_error() {
    let t = setup();
    let recent = (chrono::Utc::now() - chrono::Duration::days(2)).to_rfc3339();
    t.post("/api/items", json!({ "name": "Fresh", "releaseDate": recent })).await;

    let (status, body) = t.call(Method::GET, "/api/catalog/collabs?sort=random", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid sort order: 'random'");

    let (status, body) = t.call(Method::GET, "/api/catalog/collabs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["name"], "Fresh");
    assert_eq!(body["items"][0]["isNewRelease"], true);
}

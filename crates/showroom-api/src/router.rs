use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
};
use tower_http::services::ServeDir;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{
    auth, board, catalog, clients, contacts, dashboard, faq, hostings, inquiries, items, projects,
    settings, uploads, users,
};

/// Every `/api` route plus the static `/uploads` directory.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/items", get(items::list_items))
        .route("/api/items/{id}", get(items::get_item))
        .route("/api/catalog/collabs", get(catalog::collabs))
        .route("/api/catalog/releases", get(catalog::releases))
        .route("/api/catalog/featured", get(catalog::featured))
        .route("/api/faq", get(faq::list_faqs))
        .route("/api/faq/{id}", get(faq::get_faq))
        .route("/api/settings/footer", get(settings::get_footer))
        .route("/api/settings/colors", get(settings::get_colors))
        .route("/api/settings/colors/variables.scss", get(settings::colors_scss))
        .route("/api/contact", post(inquiries::submit_inquiry))
        .route("/api/uploads", get(uploads::serve_upload));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        // Users
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user).delete(users::delete_user),
        )
        .route("/api/users/{id}", get(users::get_user).put(users::update_user))
        // Catalog content
        .route("/api/items", post(items::create_item).delete(items::delete_item_by_query))
        .route("/api/items/{id}", put(items::update_item).delete(items::delete_item))
        .route("/api/faq", post(faq::create_faq).delete(faq::delete_faq_by_query))
        .route("/api/faq/{id}", put(faq::update_faq).delete(faq::delete_faq))
        // Clients
        .route(
            "/api/clients",
            get(clients::list_clients)
                .post(clients::create_client)
                .delete(clients::delete_client_by_query),
        )
        .route("/api/clients/search", get(clients::search_clients))
        .route("/api/clients/stats", get(clients::client_stats))
        .route("/api/clients/bulk", post(clients::bulk_clients))
        .route(
            "/api/clients/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        // Contacts
        .route(
            "/api/contacts",
            get(contacts::list_contacts)
                .post(contacts::create_contact)
                .delete(contacts::delete_contact_by_query),
        )
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Projects and the board
        .route(
            "/api/projects",
            get(projects::list_projects)
                .post(projects::create_project)
                .delete(projects::delete_project_by_query),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/board",
            get(board::get_board)
                .post(board::add_to_board)
                .delete(board::remove_from_board),
        )
        .route("/api/board/{id}", patch(board::move_project))
        .route("/api/migrate/projects", post(board::migrate_projects))
        // Hostings
        .route(
            "/api/hostings",
            get(hostings::list_hostings)
                .post(hostings::create_hosting)
                .delete(hostings::delete_hosting_by_query),
        )
        .route(
            "/api/hostings/{id}",
            get(hostings::get_hosting)
                .put(hostings::update_hosting)
                .delete(hostings::delete_hosting),
        )
        // Back-office overview and site settings
        .route("/api/dashboard", get(dashboard::dashboard))
        .route(
            "/api/settings/footer",
            post(settings::save_footer).delete(settings::reset_footer),
        )
        .route("/api/settings/colors", post(settings::save_colors))
        .route("/api/inquiries", get(inquiries::list_inquiries))
        .route(
            "/api/inquiries/{id}",
            patch(inquiries::update_inquiry).delete(inquiries::delete_inquiry),
        )
        .route(
            "/api/uploads",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let static_uploads = ServeDir::new(&state.uploads_dir);

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", static_uploads)
        .with_state(state)
}


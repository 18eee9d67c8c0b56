//! HTTP layer: axum handlers for the public site and the admin back-office.

pub mod auth;
pub mod board;
pub mod catalog;
pub mod clients;
pub mod common;
pub mod contacts;
pub mod dashboard;
pub mod error;
pub mod faq;
pub mod hostings;
pub mod inquiries;
pub mod items;
pub mod middleware;
pub mod projects;
pub mod router;
pub mod settings;
pub mod state;
pub mod uploads;
pub mod users;

pub use error::{ApiError, ApiResult};
pub use router::router;
pub use state::{AppState, AppStateInner};

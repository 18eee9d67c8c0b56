//! Shared types for the showroom site and back-office.
//!
//! Document models are stored as-is in the document store and serialized with
//! the field names the browser client already speaks. Request/response shapes
//! for the REST surface live in [`api`].

pub mod api;
pub mod catalog;
pub mod events;
pub mod models;
pub mod validate;

pub use models::Record;

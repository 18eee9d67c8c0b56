use serde::Serialize;
use serde::de::DeserializeOwned;

use showroom_types::models::{
    Client, ColorSettings, Contact, Faq, FooterSettings, Hosting, Inquiry, Item, Project, User,
};

/// A type stored as JSON in one named collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + 'static {
    const COLLECTION: &'static str;
}

/// A document carrying a human-facing sequential number ("1", "2", ...).
pub trait Sequenced: Document {
    /// Top-level field holding the number.
    const SEQUENCE_FIELD: &'static str;
}

impl Document for User {
    const COLLECTION: &'static str = "users";
}

impl Document for Item {
    const COLLECTION: &'static str = "items";
}

impl Document for Faq {
    const COLLECTION: &'static str = "faqs";
}

impl Document for Client {
    const COLLECTION: &'static str = "clients";
}

impl Sequenced for Client {
    const SEQUENCE_FIELD: &'static str = "client_id";
}

impl Document for Contact {
    const COLLECTION: &'static str = "contacts";
}

impl Sequenced for Contact {
    const SEQUENCE_FIELD: &'static str = "contact_id";
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
}

impl Sequenced for Project {
    const SEQUENCE_FIELD: &'static str = "project_id";
}

impl Document for Hosting {
    const COLLECTION: &'static str = "hostings";
}

impl Sequenced for Hosting {
    const SEQUENCE_FIELD: &'static str = "hosting_id";
}

impl Document for FooterSettings {
    const COLLECTION: &'static str = "footers";
}

impl Document for ColorSettings {
    const COLLECTION: &'static str = "color_settings";
}

impl Document for Inquiry {
    const COLLECTION: &'static str = "inquiries";
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored document together with the metadata the store keeps for it.
///
/// Serializes flat, the way the browser client expects:
/// `{"_id": "...", <document fields>, "created_at": ..., "updated_at": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub doc: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T> Record<T> {
    /// Convert the document while keeping id and timestamps.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            id: self.id,
            doc: f(self.doc),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// String-backed enums whose wire form is a human label ("Not Started").
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, default = $default:ident, { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum!(
    /// Lifecycle of a client relationship.
    ClientStatus, "client status", default = Prospect, {
        Active => "Active",
        Inactive => "Inactive",
        Prospect => "Prospect",
    }
);

label_enum!(
    /// Project status. Each value is one column on the board.
    ProjectStatus, "project status", default = NotStarted, {
        NotStarted => "Not Started",
        InProgress => "In Progress",
        ConfirmationNeeded => "Confirmation Needed",
        Completed => "Completed",
    }
);

label_enum!(
    HostingStatus, "hosting status", default = Active, {
        Active => "Active",
        Inactive => "Inactive",
        Suspended => "Suspended",
        Expired => "Expired",
    }
);

label_enum!(
    ConnectionType, "connection type", default = Ssh, {
        Ssh => "SSH",
        Telnet => "Telnet",
        Raw => "Raw",
        Rlogin => "Rlogin",
        Serial => "Serial",
    }
);

fn default_true() -> bool {
    true
}

fn default_ssh_port() -> u16 {
    22
}

// -- Users --

/// Admin account. `password` holds an Argon2 PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub mail: String,
    pub password: String,
}

/// A user as shown to clients: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub mail: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            mail: user.mail,
        }
    }
}

// -- Catalog --

/// A collaboration / release shown in the public catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// -- Back-office --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub company_name: String,
    pub contact_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub industry: String,
    pub client_since: DateTime<Utc>,
    #[serde(default)]
    pub status: ClientStatus,
}

/// The slice of a client embedded into contacts, projects and hostings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client_id: String,
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id.clone(),
            company_name: client.company_name.clone(),
            contact_name: client.contact_name.clone(),
            email: client.email.clone(),
        }
    }
}

/// A person at a client. `client_id` is a soft reference to [`Client::client_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub client_id: String,
    pub project_name: String,
    #[serde(default)]
    pub project_description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// Whether the project shows up on the status board.
    #[serde(default = "default_true")]
    pub board_active: bool,
}

/// Remote shell access for a hosting. `password` is an Argon2 hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshConnection {
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub connection_type: ConnectionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hosting {
    pub hosting_id: String,
    pub client_id: String,
    pub host_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Argon2 hash of the control-panel password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, alias = "putty_connection", skip_serializing_if = "Option::is_none")]
    pub ssh_connection: Option<SshConnection>,
    #[serde(default)]
    pub status: HostingStatus,
}

// -- Site settings --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterLink {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterColumn {
    pub title: String,
    #[serde(default)]
    pub items: Vec<FooterLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
}

pub const DEFAULT_FOOTER_BACKGROUND: &str = "#202020";
pub const DEFAULT_FOOTER_TEXT: &str = "#fefefe";

/// Singleton document driving the public footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterSettings {
    #[serde(default)]
    pub columns: Vec<FooterColumn>,
    #[serde(default)]
    pub social_media: SocialMedia,
    pub background_color: String,
    pub text_color: String,
}

impl Default for FooterSettings {
    fn default() -> Self {
        let link = |text: &str, href: &str| FooterLink {
            text: text.to_string(),
            link: Some(href.to_string()),
            is_external: false,
        };
        let placeholder = || FooterColumn {
            title: "Title".to_string(),
            items: vec![link("Item 1", "/"), link("Item 2", "/"), link("Item 3", "/")],
        };

        Self {
            columns: vec![
                FooterColumn {
                    title: "Legal".to_string(),
                    items: vec![
                        link("Legal Disclaimer", "/legal/disclaimer"),
                        link("Privacy Policy", "/legal/privacy"),
                    ],
                },
                placeholder(),
                placeholder(),
                placeholder(),
            ],
            social_media: SocialMedia::default(),
            background_color: DEFAULT_FOOTER_BACKGROUND.to_string(),
            text_color: DEFAULT_FOOTER_TEXT.to_string(),
        }
    }
}

/// Site palette singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSettings {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub text: String,
    pub background: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            primary: "#1976d2".to_string(),
            secondary: "#9c27b0".to_string(),
            accent: "#ff4081".to_string(),
            text: "#000000".to_string(),
            background: "#ffffff".to_string(),
        }
    }
}

impl ColorSettings {
    /// Render the palette as the SCSS variables file the stylesheet imports.
    pub fn to_scss(&self) -> String {
        format!(
            "$primary-color: {};\n$secondary-color: {};\n$accent-color: {};\n$text-color: {};\n$background-color: {};\n",
            self.primary, self.secondary, self.accent, self.text, self.background
        )
    }
}

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub contact_details: String,
    #[serde(default)]
    pub handled: bool,
}

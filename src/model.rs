//! Fixed internal record types produced by the output normalizer.
//!
//! These are the only shapes the rest of the application ever sees;
//! the drift-tolerant lookup of raw CLI fields happens in `normalize`.
//! Records are never mutated after construction, they are replaced
//! wholesale on each refresh.

use serde::{Deserialize, Serialize};

/// Access role of the current user on a vault.
///
/// Unrecognized or missing roles normalize to `Viewer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultRole {
    Owner,
    Manager,
    Editor,
    #[default]
    Viewer,
}

impl VaultRole {
    /// Parse a raw role string, case-insensitively, defaulting to `Viewer`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("owner") => VaultRole::Owner,
            Some("manager") => VaultRole::Manager,
            Some("editor") => VaultRole::Editor,
            _ => VaultRole::Viewer,
        }
    }
}

/// A named collection of items. Identity key: `share_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub share_id: String,
    pub name: String,
    pub item_count: u64,
    pub role: VaultRole,
}

/// Item kind, derived from the type-discriminator key of the CLI's
/// nested content object. Unknown or future kinds fall back to `Note`
/// so they still render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Login,
    #[default]
    Note,
    CreditCard,
    Identity,
    Alias,
    SshKey,
    Wifi,
}

/// List-view projection of a secret record.
/// Identity key: composite `(share_id, item_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub share_id: String,
    pub item_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub vault_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Derived: a non-empty TOTP URI was present in the decoded content.
    pub has_totp: bool,
}

/// Kind of a custom field value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldKind {
    #[default]
    Text,
    Hidden,
}

/// A single custom field on an item detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: CustomFieldKind,
}

/// Full detail of one item: the list projection plus sensitive fields.
///
/// `custom_fields` is `None` rather than an empty vec when the source
/// had no usable entries, to keep presence checks simple downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Vec<CustomField>>,
}

/// Strength assessment of a password, as reported by pass-cli.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordScore {
    pub numeric_score: f64,
    pub password_score: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalties: Option<Vec<String>>,
}

/// A cache slot payload with its capture timestamp (epoch milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub timestamp: i64,
}

/// Options for `password generate`. Only options explicitly provided
/// are forwarded to the CLI; omitted ones defer to the tool's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratePasswordOptions {
    Random {
        length: Option<u32>,
        numbers: Option<bool>,
        uppercase: Option<bool>,
        symbols: Option<bool>,
    },
    Passphrase {
        words: Option<u32>,
        separator: Option<String>,
        capitalize: Option<bool>,
    },
}

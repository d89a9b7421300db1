//! Output normalizer for pass-cli JSON
//!
//! pass-cli output drifts release to release: field spellings flip
//! between snake_case and camelCase, and responses are sometimes nested
//! in generic envelope keys. Every lookup here therefore goes through a
//! fixed-priority table of candidate key names instead of cascading
//! conditionals. Any structural mismatch is an `InvalidOutput` error,
//! never a raw serde_json error.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    CustomField, CustomFieldKind, Item, ItemDetail, ItemType, PasswordScore, Vault, VaultRole,
};
use crate::{PassCliError, Result};

// Candidate key tables, tried in order. First non-null hit wins.
const ENVELOPE_KEYS: &[&str] = &["item", "data", "result", "response", "payload"];
const SHARE_ID_KEYS: &[&str] = &["shareId", "share_id"];
const VAULT_NAME_KEYS: &[&str] = &["name", "vaultName", "vault_name"];
const ITEM_COUNT_KEYS: &[&str] = &["itemCount", "item_count", "items", "count"];
const ROLE_KEYS: &[&str] = &["role", "shareRole", "share_role"];
const ITEM_ID_KEYS: &[&str] = &["itemId", "item_id", "id"];
const STATE_KEYS: &[&str] = &["state", "itemState", "item_state"];
const TITLE_KEYS: &[&str] = &["name", "title"];
const NOTE_KEYS: &[&str] = &["note"];
const USERNAME_KEYS: &[&str] = &["username", "user_name", "itemUsername"];
const EMAIL_KEYS: &[&str] = &["email", "itemEmail", "item_email"];
const TOTP_URI_KEYS: &[&str] = &["totp_uri", "totpUri"];
const PASSWORD_KEYS: &[&str] = &["password"];
const URLS_KEYS: &[&str] = &["urls", "websites"];
const CUSTOM_FIELDS_KEYS: &[&str] = &[
    "extraFields",
    "extra_fields",
    "customFields",
    "custom_fields",
    "fields",
];
const FIELD_NAME_KEYS: &[&str] = &["name", "fieldName", "field_name", "label"];
const FIELD_VALUE_KEYS: &[&str] = &["value", "data", "content"];
const FIELD_TYPE_KEYS: &[&str] = &["type", "fieldType", "field_type"];
const TOTP_MAP_KEYS: &[&str] = &["totps", "codes", "data", "result", "response", "payload"];
const SCORE_WRAPPER_KEYS: &[&str] = &["data", "result", "response", "payload"];
const NUMERIC_SCORE_KEYS: &[&str] = &["numericScore", "numeric_score", "score"];
const SCORE_LABEL_KEYS: &[&str] = &["passwordScore", "password_score", "label", "strength"];

/// Type-discriminator keys on the nested content object, first match wins.
const TYPE_DISCRIMINATORS: &[(&str, ItemType)] = &[
    ("Login", ItemType::Login),
    ("Note", ItemType::Note),
    ("CreditCard", ItemType::CreditCard),
    ("credit_card", ItemType::CreditCard),
    ("Identity", ItemType::Identity),
    ("Alias", ItemType::Alias),
    ("SshKey", ItemType::SshKey),
    ("ssh_key", ItemType::SshKey),
    ("Wifi", ItemType::Wifi),
    ("wifi", ItemType::Wifi),
];

fn parse(raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| PassCliError::InvalidOutput(format!("not valid JSON: {e}")))
}

/// First non-null value under any of the candidate keys.
fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = value.as_object()?;
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Non-empty trimmed string under any of the candidate keys.
fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    field(value, keys)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn invalid(message: &str) -> PassCliError {
    PassCliError::InvalidOutput(message.to_string())
}

/// Strip at most two levels of generic envelope around an item record,
/// stopping as soon as an item id is visible.
fn unwrap_item_envelope(value: &Value) -> &Value {
    let mut current = value;
    for _ in 0..2 {
        if field(current, ITEM_ID_KEYS).is_some() {
            break;
        }
        match field(current, ENVELOPE_KEYS) {
            Some(inner) if inner.is_object() => current = inner,
            _ => break,
        }
    }
    current
}

fn normalize_vault(value: &Value) -> Result<Vault> {
    let share_id = str_field(value, SHARE_ID_KEYS)
        .ok_or_else(|| invalid("vault record missing share id"))?;
    let name =
        str_field(value, VAULT_NAME_KEYS).ok_or_else(|| invalid("vault record missing name"))?;
    let item_count = field(value, ITEM_COUNT_KEYS)
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let role = VaultRole::parse(str_field(value, ROLE_KEYS));

    Ok(Vault {
        share_id: share_id.to_string(),
        name: name.to_string(),
        item_count,
        role,
    })
}

/// Normalize a `vault list` response, unwrapping an optional top-level
/// envelope. A vault missing its share id or name fails the whole call.
pub fn vaults(raw: &str) -> Result<Vec<Vault>> {
    let value = parse(raw)?;
    let list = match &value {
        Value::Array(entries) => entries,
        other => field(other, &["vaults", "data", "result"])
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("vault list is not an array"))?,
    };
    list.iter().map(normalize_vault).collect()
}

/// CLI-reported lifecycle state, used to drop trashed items before
/// normalization.
fn is_trashed(value: &Value) -> bool {
    str_field(value, STATE_KEYS).is_some_and(|s| s.eq_ignore_ascii_case("trashed"))
}

/// Pick the item type from the content object's discriminator key,
/// returning the matched inner content for field extraction. Unknown or
/// future kinds still have to render, so absence maps to `Note`.
fn detect_type(content: Option<&Value>) -> (ItemType, Option<&Value>) {
    if let Some(content) = content {
        for (key, kind) in TYPE_DISCRIMINATORS {
            if let Some(inner) = content.get(key) {
                let inner = inner.is_object().then_some(inner);
                return (*kind, inner);
            }
        }
    }
    (ItemType::Note, None)
}

fn normalize_item(value: &Value, vault_name: &str) -> Result<Item> {
    let share_id =
        str_field(value, SHARE_ID_KEYS).ok_or_else(|| invalid("item record missing share id"))?;
    let item_id =
        str_field(value, ITEM_ID_KEYS).ok_or_else(|| invalid("item record missing item id"))?;

    // Newer releases nest metadata/content under `data`; older ones flatten.
    let data = field(value, &["data"])
        .filter(|v| v.is_object())
        .unwrap_or(value);
    let metadata = field(data, &["metadata"])
        .filter(|v| v.is_object())
        .unwrap_or(data);
    let title = str_field(metadata, TITLE_KEYS).ok_or_else(|| invalid("item record missing title"))?;

    let content = field(data, &["content"]).filter(|v| v.is_object());
    let (kind, type_content) = detect_type(content);

    let username = type_content
        .and_then(|c| str_field(c, USERNAME_KEYS))
        .map(str::to_string);
    let email = type_content
        .and_then(|c| str_field(c, EMAIL_KEYS))
        .map(str::to_string);
    let has_totp = kind == ItemType::Login
        && type_content
            .and_then(|c| str_field(c, TOTP_URI_KEYS))
            .is_some();

    Ok(Item {
        share_id: share_id.to_string(),
        item_id: item_id.to_string(),
        title: title.to_string(),
        kind,
        vault_name: vault_name.to_string(),
        username,
        email,
        has_totp,
    })
}

/// Normalize an `item list` response for one vault. Trashed items are
/// dropped before normalization.
pub fn items(raw: &str, vault_name: &str) -> Result<Vec<Item>> {
    let value = parse(raw)?;
    let list = match &value {
        Value::Array(entries) => entries,
        other => field(other, &["items", "data", "result"])
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("item list is not an array"))?,
    };
    list.iter()
        .filter(|entry| !is_trashed(entry))
        .map(|entry| normalize_item(entry, vault_name))
        .collect()
}

/// Source entries missing a name or a string value are dropped
/// individually; an all-invalid list normalizes to absent.
fn custom_fields(value: &Value) -> Option<Vec<CustomField>> {
    let entries = value.as_array()?;
    let fields: Vec<CustomField> = entries
        .iter()
        .filter_map(|entry| {
            let name = str_field(entry, FIELD_NAME_KEYS)?;
            let value = str_field(entry, FIELD_VALUE_KEYS)?;
            let kind = match str_field(entry, FIELD_TYPE_KEYS) {
                Some(t) if t.eq_ignore_ascii_case("hidden") || t.eq_ignore_ascii_case("concealed") => {
                    CustomFieldKind::Hidden
                }
                _ => CustomFieldKind::Text,
            };
            Some(CustomField {
                name: name.to_string(),
                value: value.to_string(),
                kind,
            })
        })
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Normalize an `item view` response into full detail.
pub fn item_detail(raw: &str, vault_name: &str) -> Result<ItemDetail> {
    let value = parse(raw)?;
    let record = unwrap_item_envelope(&value);
    let item = normalize_item(record, vault_name)?;

    let data = field(record, &["data"])
        .filter(|v| v.is_object())
        .unwrap_or(record);
    let metadata = field(data, &["metadata"])
        .filter(|v| v.is_object())
        .unwrap_or(data);
    let content = field(data, &["content"]).filter(|v| v.is_object());
    let (_, type_content) = detect_type(content);

    let password = type_content
        .and_then(|c| str_field(c, PASSWORD_KEYS))
        .map(str::to_string);
    let urls = type_content
        .and_then(|c| field(c, URLS_KEYS))
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|urls| !urls.is_empty());
    let note = str_field(metadata, NOTE_KEYS).map(str::to_string);
    let custom_fields = field(data, CUSTOM_FIELDS_KEYS)
        .or_else(|| field(record, CUSTOM_FIELDS_KEYS))
        .and_then(custom_fields);

    Ok(ItemDetail {
        item,
        password,
        urls,
        note,
        custom_fields,
    })
}

/// Extract one code from a mapping of named TOTP values: prefer the key
/// literally named `totp`, otherwise the lexicographically first key.
pub fn totp_code(raw: &str) -> Result<String> {
    let value = parse(raw)?;
    let mut current = &value;
    for _ in 0..2 {
        match field(current, TOTP_MAP_KEYS) {
            Some(inner) if inner.is_object() => current = inner,
            _ => break,
        }
    }
    let obj = current
        .as_object()
        .ok_or_else(|| invalid("TOTP response is not an object"))?;

    let codes: BTreeMap<&str, &str> = obj
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| (key.as_str(), s))
        })
        .collect();

    if let Some(code) = codes.get("totp") {
        return Ok((*code).to_string());
    }
    let code = codes
        .into_iter()
        .next()
        .map(|(_, code)| code.to_string())
        .ok_or_else(|| invalid("no TOTP code for item"));
    code
}

/// Normalize a `password score` response.
pub fn score(raw: &str) -> Result<PasswordScore> {
    let value = parse(raw)?;
    let mut current = &value;
    for _ in 0..2 {
        match field(current, SCORE_WRAPPER_KEYS) {
            Some(inner) if inner.is_object() => current = inner,
            _ => break,
        }
    }

    let numeric_score = field(current, NUMERIC_SCORE_KEYS)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid("score response missing numeric score"))?;
    let password_score = str_field(current, SCORE_LABEL_KEYS)
        .ok_or_else(|| invalid("score response missing score label"))?
        .to_string();
    let penalties = field(current, &["penalties"])
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|p| !p.is_empty());

    Ok(PasswordScore {
        numeric_score,
        password_score,
        penalties,
    })
}

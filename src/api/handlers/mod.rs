//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by resource.

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Article CRUD handlers.
pub mod articles;
/// Authentication handlers (register, login, logout, me).
pub mod auth;
/// Category CRUD handlers.
pub mod categories;
/// Product CRUD and listing handlers.
pub mod products;
/// Image slider handlers.
pub mod sliders;

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

/// Urlencoded pairs as a JSON object. Repeated keys, and `key[]` keys,
/// collect into arrays.
fn urlencoded_object(body: &Bytes) -> Option<Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).ok()?;
    let mut object = Map::new();

    for (key, value) in pairs {
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        match object.get_mut(&key) {
            Some(Value::Array(items)) => items.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                object.insert(key, Value::String(value));
            }
        }
    }

    Some(Value::Object(object))
}

/// Parses a JSON or urlencoded body, treating an empty or malformed one as
/// having no fields.
///
/// Handlers then report the missing fields with their own messages.
pub(crate) fn lenient_body<T: DeserializeOwned + Default>(headers: &HeaderMap, body: &Bytes) -> T {
    if is_urlencoded(headers) {
        return urlencoded_object(body)
            .and_then(|object| serde_json::from_value(object).ok())
            .unwrap_or_default();
    }

    serde_json::from_slice(body).unwrap_or_default()
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Endpoint routing and response envelope decoding.
//!
//! The backend is not uniform: list endpoints answer `{success, <resource>: [...]}`,
//! some answer `{success, data: ...}`, others a bare payload. Every body is
//! decoded exactly once here into a tagged result.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

pub const HEALTH_PATH: &str = "/api/health";
pub const LOGIN_PATH: &str = "/api/auth/login";

/// Backend resource collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Products,
    Customers,
    Quotes,
}

impl Resource {
    pub fn collection_path(&self) -> &'static str {
        match self {
            Resource::Products => "/api/inventory/products",
            Resource::Customers => "/api/customers",
            Resource::Quotes => "/api/quotes",
        }
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection_path(), id)
    }

    /// Key holding the list in a list envelope.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::Customers => "customers",
            Resource::Quotes => "quotes",
        }
    }

    /// Key holding the record in a single-record envelope.
    pub fn item_key(&self) -> &'static str {
        match self {
            Resource::Products => "product",
            Resource::Customers => "customer",
            Resource::Quotes => "quote",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.collection_key())
    }
}

pub fn convert_quote_path(id: &str) -> String {
    format!("{}/convert", Resource::Quotes.item_path(id))
}

/// Decoded list response.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEnvelope<T> {
    Success(Vec<T>),
    /// `{success: false}` with the backend's message.
    Failure(String),
}

/// Decode a list body: a bare array, `{<key>: [...]}` or `{data: [...]}`.
pub fn decode_list<T: DeserializeOwned>(key: &str, body: Value) -> Result<ListEnvelope<T>, ClientError> {
    match body {
        Value::Array(_) => decode_value(body).map(ListEnvelope::Success),
        Value::Object(mut obj) => {
            if let Some(message) = failure_message(&obj) {
                return Ok(ListEnvelope::Failure(message));
            }
            let payload = obj
                .remove(key)
                .or_else(|| obj.remove("data"))
                .ok_or_else(|| ClientError::Decode(format!("response has no '{key}' list")))?;
            decode_value(payload).map(ListEnvelope::Success)
        }
        other => Err(ClientError::Decode(format!(
            "expected a list of {key}, got {}",
            kind(&other)
        ))),
    }
}

/// Decode a single-record body: `{<key>: {...}}`, `{data: {...}}` or the bare record.
pub fn decode_item<T: DeserializeOwned>(key: &str, body: Value) -> Result<T, ClientError> {
    match body {
        Value::Object(mut obj) => {
            if let Some(message) = failure_message(&obj) {
                return Err(ClientError::Backend(message));
            }
            let payload = match obj.remove(key) {
                Some(v) => v,
                None => match obj.remove("data") {
                    Some(v @ Value::Object(_)) => v,
                    Some(other) => {
                        obj.insert("data".to_string(), other);
                        Value::Object(obj)
                    }
                    None => Value::Object(obj),
                },
            };
            decode_value(payload)
        }
        other => Err(ClientError::Decode(format!(
            "expected a {key} object, got {}",
            kind(&other)
        ))),
    }
}

/// Decode an acknowledgement (delete): any body that is not `{success: false}`.
pub fn decode_ack(body: Value) -> Result<(), ClientError> {
    match &body {
        Value::Object(obj) => match failure_message(obj) {
            Some(message) => Err(ClientError::Backend(message)),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

fn failure_message(obj: &Map<String, Value>) -> Option<String> {
    if obj.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let message = ["message", "error"]
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .unwrap_or("request failed");
    Some(message.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Row {
        id: u32,
    }

    #[test]
    fn list_from_named_envelope() {
        let body = json!({"success": true, "products": [{"id": 1}, {"id": 2}]});
        let decoded: ListEnvelope<Row> = decode_list("products", body).unwrap();
        assert_eq!(decoded, ListEnvelope::Success(vec![Row { id: 1 }, Row { id: 2 }]));
    }

    #[test]
    fn list_from_data_envelope_or_bare_array() {
        let decoded: ListEnvelope<Row> = decode_list("quotes", json!({"data": [{"id": 3}]})).unwrap();
        assert_eq!(decoded, ListEnvelope::Success(vec![Row { id: 3 }]));

        let decoded: ListEnvelope<Row> = decode_list("quotes", json!([{"id": 4}])).unwrap();
        assert_eq!(decoded, ListEnvelope::Success(vec![Row { id: 4 }]));
    }

    #[test]
    fn list_failure_envelope_carries_message() {
        let decoded: ListEnvelope<Row> =
            decode_list("customers", json!({"success": false, "error": "db down"})).unwrap();
        assert_eq!(decoded, ListEnvelope::Failure("db down".to_string()));
    }

    #[test]
    fn list_without_payload_is_a_decode_error() {
        let err = decode_list::<Row>("customers", json!({"success": true})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn item_from_every_shape() {
        let a: Row = decode_item("product", json!({"success": true, "product": {"id": 1}})).unwrap();
        let b: Row = decode_item("product", json!({"data": {"id": 2}})).unwrap();
        let c: Row = decode_item("product", json!({"id": 3})).unwrap();
        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn item_failure_is_backend_error() {
        let err = decode_item::<Row>("quote", json!({"success": false, "message": "locked"})).unwrap_err();
        assert_eq!(err, ClientError::Backend("locked".to_string()));
    }

    #[test]
    fn ack_accepts_empty_and_rejects_failure() {
        decode_ack(Value::Null).unwrap();
        decode_ack(json!({"success": true})).unwrap();
        assert!(decode_ack(json!({"success": false})).is_err());
    }

    #[test]
    fn paths() {
        assert_eq!(Resource::Products.item_path("7"), "/api/inventory/products/7");
        assert_eq!(convert_quote_path("q-1"), "/api/quotes/q-1/convert");
    }
}

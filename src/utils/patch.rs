use actix_web::error::ErrorBadRequest;
use serde_json::{Map, Value};

use crate::auth::password::hash_password;

/// ===============================
/// Document patch builder
/// ===============================
/// Build a store patch from a free-form JSON payload, keeping only
/// allow-listed fields. Password values are re-hashed so a raw password
/// never lands in a document.
pub fn build_document_patch(payload: &Value, allowed: &[&str]) -> Result<Value, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let mut patch = Map::with_capacity(obj.len());

    for (key, value) in obj {
        if !allowed.contains(&key.as_str()) {
            return Err(ErrorBadRequest(format!("Unknown field: {}", key)));
        }

        match (key.as_str(), value) {
            ("password", Value::String(raw)) if !raw.is_empty() => {
                patch.insert(key.clone(), Value::String(hash_password(raw)));
            }
            ("password", _) => {
                return Err(ErrorBadRequest("password must be a non-empty string"));
            }
            (_, Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null) => {
                patch.insert(key.clone(), value.clone());
            }
            _ => return Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }

    Ok(Value::Object(patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use serde_json::json;

    const ALLOWED: &[&str] = &["display_name", "password", "is_active"];

    #[test]
    fn keeps_allow_listed_scalars() {
        let patch =
            build_document_patch(&json!({"display_name": "Ana", "is_active": false}), ALLOWED)
                .unwrap();

        assert_eq!(patch["display_name"], "Ana");
        assert_eq!(patch["is_active"], false);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(build_document_patch(&json!({"role": "admin"}), ALLOWED).is_err());
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_document_patch(&json!({}), ALLOWED).is_err());
        assert!(build_document_patch(&json!([1, 2]), ALLOWED).is_err());
    }

    #[test]
    fn rejects_nested_values() {
        assert!(build_document_patch(&json!({"display_name": {"x": 1}}), ALLOWED).is_err());
    }

    #[test]
    fn passwords_are_hashed_in_transit() {
        let patch = build_document_patch(&json!({"password": "bagong-pasword"}), ALLOWED).unwrap();

        let hashed = patch["password"].as_str().unwrap();
        assert_ne!(hashed, "bagong-pasword");
        assert!(verify_password("bagong-pasword", hashed).is_ok());
    }

    #[test]
    fn empty_password_is_refused() {
        assert!(build_document_patch(&json!({"password": ""}), ALLOWED).is_err());
    }
}

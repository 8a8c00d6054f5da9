//! Request validation from declared fields and their rules.

use crate::config::{FieldKind, FieldSpec, ValidationRule};
use crate::error::AppError;
use crate::store::Fields;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

pub struct RequestValidator;

/// Compiled `pattern` rules, keyed by source. Patterns only come from config, so this stays small.
fn compiled_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    static CACHE: OnceLock<RwLock<HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(Default::default);
    if let Some(re) = cache.read().unwrap_or_else(|e| e.into_inner()).get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(pattern.to_string(), re.clone());
    Ok(re)
}

impl RequestValidator {
    /// Validate a full body (create). All required fields must be present and non-null.
    /// Undeclared fields pass through unchecked.
    pub fn validate(body: &Fields, fields: &[FieldSpec]) -> Result<(), AppError> {
        validate_object("", body, fields, true)
    }

    /// Validate only the fields present in body (update). Required is not enforced for missing fields.
    pub fn validate_partial(body: &Fields, fields: &[FieldSpec]) -> Result<(), AppError> {
        validate_object("", body, fields, false)
    }
}

fn path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_object(prefix: &str, body: &Fields, fields: &[FieldSpec], full: bool) -> Result<(), AppError> {
    for spec in fields {
        let name = path(prefix, &spec.name);
        match body.get(&spec.name) {
            None if full && spec.required => {
                return Err(AppError::Validation(format!("{} is required", name)));
            }
            // Clearing a required field is never allowed, even on a partial update.
            Some(Value::Null) if spec.required => {
                return Err(AppError::Validation(format!("{} is required", name)));
            }
            None | Some(Value::Null) => {}
            Some(v) => validate_field(&name, v, spec)?,
        }
    }
    Ok(())
}

fn invalid(name: &str, what: &str) -> AppError {
    AppError::Validation(format!("{} must be {}", name, what))
}

fn validate_field(name: &str, v: &Value, spec: &FieldSpec) -> Result<(), AppError> {
    match &spec.kind {
        FieldKind::Text | FieldKind::LongText => {
            v.as_str().ok_or_else(|| invalid(name, "a string"))?;
        }
        FieldKind::Number => {
            v.as_f64().ok_or_else(|| invalid(name, "a number"))?;
        }
        FieldKind::Boolean => {
            v.as_bool().ok_or_else(|| invalid(name, "a boolean"))?;
        }
        FieldKind::Date => {
            let s = v.as_str().ok_or_else(|| invalid(name, "a date string"))?;
            if !is_date(s) {
                return Err(invalid(name, "an ISO 8601 date"));
            }
        }
        FieldKind::Select { options } => {
            let s = v.as_str().ok_or_else(|| invalid(name, "a string"))?;
            check_option(name, s, options)?;
        }
        FieldKind::MultiSelect { options } => {
            for item in string_array(name, v)? {
                check_option(name, item, options)?;
            }
        }
        FieldKind::Relation { multiple: false, .. } => {
            v.as_str().ok_or_else(|| invalid(name, "an id string"))?;
        }
        FieldKind::Relation { multiple: true, .. } | FieldKind::StringList => {
            string_array(name, v)?;
        }
        FieldKind::Object { fields } => {
            let obj = v.as_object().ok_or_else(|| invalid(name, "an object"))?;
            // Nested objects are replaced wholesale on update, so they are always validated in full.
            validate_object(name, obj, fields, true)?;
        }
        FieldKind::GeoPoint => validate_geo_point(name, v)?,
        FieldKind::VideoLinks => {
            for url in string_array(name, v)? {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(invalid(name, "a list of http(s) links"));
                }
            }
        }
    }
    validate_rules(name, v, &spec.rules)
}

fn string_array<'a>(name: &str, v: &'a Value) -> Result<Vec<&'a str>, AppError> {
    v.as_array()
        .ok_or_else(|| invalid(name, "an array of strings"))?
        .iter()
        .map(|item| item.as_str().ok_or_else(|| invalid(name, "an array of strings")))
        .collect()
}

fn check_option(name: &str, s: &str, options: &[String]) -> Result<(), AppError> {
    if options.is_empty() || options.iter().any(|o| o == s) {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "{} must be one of: {:?}",
        name,
        options.iter().take(5).collect::<Vec<_>>()
    )))
}

fn is_date(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok() || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn validate_geo_point(name: &str, v: &Value) -> Result<(), AppError> {
    let obj = v.as_object().ok_or_else(|| invalid(name, "an object with lat and lng"))?;
    let lat = obj.get("lat").and_then(Value::as_f64);
    let lng = obj.get("lng").and_then(Value::as_f64);
    match (lat, lng) {
        (Some(lat), Some(lng)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) => Ok(()),
        _ => Err(invalid(name, "an object with lat in [-90, 90] and lng in [-180, 180]")),
    }
}

fn validate_rules(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = compiled_pattern(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format.to_lowercase().as_str() {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                return Err(AppError::Validation(format!("{} must be a valid email", col)));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::Validation(format!("{} must be a valid UUID", col)));
            }
        }
        "url" => {
            if !(s.starts_with("https://") || s.starts_with("http://")) {
                return Err(AppError::Validation(format!("{} must be a valid URL", col)));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Vec<FieldSpec> {
        serde_json::from_value(v).unwrap()
    }

    fn body(v: Value) -> Fields {
        v.as_object().cloned().unwrap()
    }

    fn event_fields() -> Vec<FieldSpec> {
        fields(json!([
            { "name": "title", "kind": { "type": "text" }, "required": true, "rules": { "max_length": 10 } },
            { "name": "type", "kind": { "type": "select", "options": ["festival", "social", "workshop"] }, "required": true },
            { "name": "startDate", "kind": { "type": "date" } },
            { "name": "styles", "kind": { "type": "multi_select", "options": ["salsa", "bachata"] } },
            { "name": "location", "kind": { "type": "geo_point" } },
            { "name": "videos", "kind": { "type": "video_links" } },
            { "name": "venue", "kind": { "type": "object", "fields": [
                { "name": "name", "kind": { "type": "text" }, "required": true }
            ] } }
        ]))
    }

    #[test]
    fn accepts_valid_event() {
        RequestValidator::validate(
            &body(json!({
                "title": "Social",
                "type": "social",
                "startDate": "2026-05-01",
                "styles": ["salsa"],
                "location": { "lat": 52.5, "lng": 13.4 },
                "videos": ["https://example.com/v/1"],
                "venue": { "name": "Hall" },
                "unknown": 1
            })),
            &event_fields(),
        )
        .unwrap();
    }

    #[test]
    fn required_only_on_full_validation() {
        let err = RequestValidator::validate(&body(json!({ "type": "social" })), &event_fields()).unwrap_err();
        assert_eq!(err.to_string(), "validation: title is required");
        RequestValidator::validate_partial(&body(json!({ "type": "social" })), &event_fields()).unwrap();
    }

    #[test]
    fn rejects_unknown_option_and_bad_types() {
        let f = event_fields();
        assert!(RequestValidator::validate_partial(&body(json!({ "type": "party" })), &f).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "styles": ["tango"] })), &f).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "title": 5 })), &f).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "startDate": "tomorrow" })), &f).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "title": "far too long title" })), &f).is_err());
    }

    #[test]
    fn nested_object_is_validated_in_full() {
        let err = RequestValidator::validate_partial(&body(json!({ "venue": {} })), &event_fields()).unwrap_err();
        assert_eq!(err.to_string(), "validation: venue.name is required");
    }

    #[test]
    fn geo_point_range_is_checked() {
        let f = event_fields();
        assert!(RequestValidator::validate_partial(&body(json!({ "location": { "lat": 95.0, "lng": 0 } })), &f).is_err());
        assert!(RequestValidator::validate_partial(&body(json!({ "videos": ["ftp://x"] })), &f).is_err());
    }

    #[test]
    fn null_clears_optional_field() {
        RequestValidator::validate_partial(&body(json!({ "startDate": null })), &event_fields()).unwrap();
    }

    #[test]
    fn pattern_is_compiled_once_and_reused() {
        let a = compiled_pattern("^[a-z]+$").unwrap();
        let b = compiled_pattern("^[a-z]+$").unwrap();
        assert_eq!(a.as_str(), b.as_str());
        assert!(b.is_match("salsa"));
        assert!(compiled_pattern("(").is_err());
    }

    #[test]
    fn null_cannot_clear_required_field() {
        let err = RequestValidator::validate_partial(&body(json!({ "title": null })), &event_fields()).unwrap_err();
        assert_eq!(err.to_string(), "validation: title is required");
    }
}

//! Form submission: drop nulls, merge caller extras, route to create or update.

use crate::error::AppError;
use crate::store::Fields;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    Create,
    Update,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FormSubmission {
    pub mode: SubmitMode,
    /// Required in update mode.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub values: Fields,
    /// Merged over `values` after null removal.
    #[serde(default)]
    pub extra: Fields,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PreparedSubmission {
    Create { body: Fields },
    Update { id: String, body: Fields },
}

/// Remove null values, recursing into nested objects, so an untouched input means "absent".
pub fn strip_nulls(fields: Fields) -> Fields {
    fields
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::Object(inner) => Some((k, Value::Object(strip_nulls(inner)))),
            other => Some((k, other)),
        })
        .collect()
}

impl FormSubmission {
    pub fn prepare(self) -> Result<PreparedSubmission, AppError> {
        let mut body = strip_nulls(self.values);
        body.extend(self.extra);
        match self.mode {
            SubmitMode::Create => Ok(PreparedSubmission::Create { body }),
            SubmitMode::Update => {
                let id = self
                    .id
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| AppError::InvalidInput("update submission requires an id".into()))?;
                Ok(PreparedSubmission::Update { id, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(v: Value) -> FormSubmission {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn nulls_removed_then_extra_merged() {
        let s = submission(json!({
            "mode": "create",
            "values": { "title": "Social", "price": null, "venue": { "name": null, "city": "Berlin" } },
            "extra": { "type": "social", "title": "Override" }
        }));
        let PreparedSubmission::Create { body } = s.prepare().unwrap() else {
            panic!("expected create");
        };
        assert_eq!(
            Value::Object(body),
            json!({ "title": "Override", "type": "social", "venue": { "city": "Berlin" } })
        );
    }

    #[test]
    fn update_needs_id() {
        let err = submission(json!({ "mode": "update", "values": {} })).prepare().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let prepared = submission(json!({ "mode": "update", "id": "abc", "values": { "a": 1 } }))
            .prepare()
            .unwrap();
        assert_eq!(
            prepared,
            PreparedSubmission::Update {
                id: "abc".into(),
                body: json!({ "a": 1 }).as_object().cloned().unwrap()
            }
        );
    }
}

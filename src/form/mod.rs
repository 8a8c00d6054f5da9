//! Form descriptors built from declared resource fields, and form submission normalization.

mod label;
mod submission;
mod widget;

pub use label::humanize;
pub use submission::{strip_nulls, FormSubmission, PreparedSubmission, SubmitMode};
pub use widget::{select_widget, Widget, WidgetOverrides};

use crate::config::{FieldKind, FieldSpec, ResolvedResource};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub widget: Widget,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Target resource for relation selectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FormField>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormDescriptor {
    pub resource: String,
    pub fields: Vec<FormField>,
    pub required: Vec<String>,
    pub defaults: BTreeMap<String, Value>,
}

/// One widget per visible field, the required set and the default values.
pub fn describe(resource: &ResolvedResource, overrides: &WidgetOverrides) -> FormDescriptor {
    let visible: Vec<&FieldSpec> = resource
        .fields
        .iter()
        .filter(|f| !overrides.hidden.contains(&f.name))
        .collect();

    FormDescriptor {
        resource: resource.name.clone(),
        fields: visible.iter().map(|f| form_field(f, overrides)).collect(),
        required: visible.iter().filter(|f| f.required).map(|f| f.name.clone()).collect(),
        defaults: visible
            .iter()
            .filter_map(|f| default_value(f).map(|v| (f.name.clone(), v)))
            .collect(),
    }
}

fn form_field(spec: &FieldSpec, overrides: &WidgetOverrides) -> FormField {
    let widget = select_widget(spec, overrides);
    let options = match &spec.kind {
        FieldKind::Select { options } | FieldKind::MultiSelect { options } => Some(options.clone()),
        _ => None,
    };
    let relation = match &spec.kind {
        FieldKind::Relation { resource, .. } => Some(resource.clone()),
        _ => None,
    };
    // Overrides apply to top-level fields only.
    let fields = match &spec.kind {
        FieldKind::Object { fields } => fields
            .iter()
            .map(|f| form_field(f, &WidgetOverrides::default()))
            .collect(),
        _ => Vec::new(),
    };
    FormField {
        name: spec.name.clone(),
        label: spec.label.clone().unwrap_or_else(|| humanize(&spec.name)),
        widget,
        required: spec.required,
        options,
        relation,
        fields,
    }
}

/// Declared default, else the empty value of a multi-valued or toggle kind.
pub fn default_value(spec: &FieldSpec) -> Option<Value> {
    if let Some(v) = &spec.default {
        return Some(v.clone());
    }
    match &spec.kind {
        FieldKind::Boolean => Some(Value::Bool(false)),
        FieldKind::MultiSelect { .. } | FieldKind::StringList | FieldKind::VideoLinks => Some(Value::Array(Vec::new())),
        FieldKind::Relation { multiple: true, .. } => Some(Value::Array(Vec::new())),
        FieldKind::Object { fields } => {
            let nested: serde_json::Map<String, Value> = fields
                .iter()
                .filter_map(|f| default_value(f).map(|v| (f.name.clone(), v)))
                .collect();
            (!nested.is_empty()).then_some(Value::Object(nested))
        }
        _ => None,
    }
}

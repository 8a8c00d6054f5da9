//! Widget selection: caller overrides, then the declared kind. Total over [`FieldKind`].

use crate::config::{FieldKind, FieldSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    TextArea,
    NumberInput,
    Toggle,
    DatePicker,
    Select,
    MultiSelect,
    RelationSelect,
    Fieldset,
    LocationPicker,
    VideoLinkList,
    TagInput,
}

/// Per-request widget overrides, by field name. `hidden` removes the field from the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WidgetOverrides {
    pub multi_select: BTreeSet<String>,
    pub select: BTreeSet<String>,
    pub text_area: BTreeSet<String>,
    pub hidden: BTreeSet<String>,
}

fn split_list(s: Option<&str>) -> BTreeSet<String> {
    s.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

impl WidgetOverrides {
    /// Each argument is a comma-separated list of field names.
    pub fn from_lists(
        multi_select: Option<&str>,
        select: Option<&str>,
        text_area: Option<&str>,
        hidden: Option<&str>,
    ) -> Self {
        WidgetOverrides {
            multi_select: split_list(multi_select),
            select: split_list(select),
            text_area: split_list(text_area),
            hidden: split_list(hidden),
        }
    }
}

pub fn select_widget(spec: &FieldSpec, overrides: &WidgetOverrides) -> Widget {
    if overrides.multi_select.contains(&spec.name) {
        return Widget::MultiSelect;
    }
    if overrides.select.contains(&spec.name) {
        return Widget::Select;
    }
    if overrides.text_area.contains(&spec.name) {
        return Widget::TextArea;
    }
    match &spec.kind {
        FieldKind::Text => Widget::TextInput,
        FieldKind::LongText => Widget::TextArea,
        FieldKind::Number => Widget::NumberInput,
        FieldKind::Boolean => Widget::Toggle,
        FieldKind::Date => Widget::DatePicker,
        FieldKind::Select { .. } => Widget::Select,
        FieldKind::MultiSelect { .. } => Widget::MultiSelect,
        FieldKind::Relation { .. } => Widget::RelationSelect,
        FieldKind::Object { .. } => Widget::Fieldset,
        FieldKind::GeoPoint => Widget::LocationPicker,
        FieldKind::VideoLinks => Widget::VideoLinkList,
        FieldKind::StringList => Widget::TagInput,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationRule;

    fn spec(name: &str, kind: FieldKind) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            kind,
            required: false,
            default: None,
            label: None,
            rules: ValidationRule::default(),
        }
    }

    #[test]
    fn overrides_win_over_kind() {
        let f = spec("styles", FieldKind::StringList);
        let o = WidgetOverrides::from_lists(Some("styles"), Some("styles"), None, None);
        assert_eq!(select_widget(&f, &o), Widget::MultiSelect);

        let o = WidgetOverrides::from_lists(None, Some(" styles ,other"), None, None);
        assert_eq!(select_widget(&f, &o), Widget::Select);

        assert_eq!(select_widget(&f, &WidgetOverrides::default()), Widget::TagInput);
    }

    #[test]
    fn id_suffix_alone_does_not_make_a_relation() {
        let f = spec("externalId", FieldKind::Text);
        assert_eq!(select_widget(&f, &WidgetOverrides::default()), Widget::TextInput);
    }

    #[test]
    fn kind_mapping() {
        let o = WidgetOverrides::default();
        assert_eq!(select_widget(&spec("d", FieldKind::Date), &o), Widget::DatePicker);
        assert_eq!(select_widget(&spec("n", FieldKind::Number), &o), Widget::NumberInput);
        assert_eq!(select_widget(&spec("v", FieldKind::VideoLinks), &o), Widget::VideoLinkList);
        assert_eq!(
            select_widget(&spec("m", FieldKind::MultiSelect { options: vec![] }), &o),
            Widget::MultiSelect
        );
    }
}

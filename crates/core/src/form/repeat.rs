//! Repeated field groups.
//!
//! A [`RepeatTemplate`] is rendered once per group index. Field names get the
//! index appended (`fraction` -> `fraction[2]`, `feedback[text]` ->
//! `feedback[2][text]`), and `{no}` in labels and defaults becomes the
//! 1-based group number. The number of groups is carried by a hidden counter
//! field so it survives a form reload.

use std::collections::BTreeMap;

use super::field::{DisabledIf, Field, FieldKind, ParamType};

/// Placeholder replaced by the 1-based group number.
pub const GROUP_NUMBER_PLACEHOLDER: &str = "{no}";

/// Upper bound on the groups of one repeat. The counter comes from the
/// submitted form and is clamped to this.
pub const MAX_REPEATS: usize = 100;

/// Per-field settings applied to every rendered copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepeatOptions {
    pub default: Option<String>,
    pub param_type: Option<ParamType>,
    pub disabled_if: Option<DisabledIf>,
    pub help: Option<String>,
}

/// A group of fields rendered once per index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepeatTemplate {
    pub fields: Vec<Field>,
    /// Keyed by the template (un-indexed) field name.
    pub options: BTreeMap<String, RepeatOptions>,
}

impl RepeatTemplate {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, options: RepeatOptions) -> Self {
        self.options.insert(name.into(), options);
        self
    }

    /// Render the fields of group `index` (0-based).
    pub fn render_group(&self, index: usize) -> Vec<Field> {
        let number = (index + 1).to_string();

        self.fields
            .iter()
            .map(|template| {
                let mut field = template.clone();
                field.name = indexed_name(&template.name, index);
                field.label = template.label.replace(GROUP_NUMBER_PLACEHOLDER, &number);
                field.default = template
                    .default
                    .as_ref()
                    .map(|d| d.replace(GROUP_NUMBER_PLACEHOLDER, &number));
                field.disabled_if = template
                    .disabled_if
                    .as_ref()
                    .map(|rule| self.index_dependency(rule, index));

                if let Some(options) = self.options.get(&template.name) {
                    if let Some(default) = &options.default {
                        field.default = Some(default.replace(GROUP_NUMBER_PLACEHOLDER, &number));
                    }
                    if options.param_type.is_some() {
                        field.param_type = options.param_type;
                    }
                    if let Some(rule) = &options.disabled_if {
                        field.disabled_if = Some(self.index_dependency(rule, index));
                    }
                    if options.help.is_some() {
                        field.help = options.help.clone();
                    }
                }
                field
            })
            .collect()
    }

    /// Render groups `0..repeats` followed by the hidden counter. `repeats`
    /// is capped at [`MAX_REPEATS`].
    pub fn materialize(&self, counter: &RepeatCounter, repeats: usize) -> Vec<Field> {
        let repeats = repeats.min(MAX_REPEATS);
        let mut fields: Vec<Field> = (0..repeats).flat_map(|i| self.render_group(i)).collect();
        fields.push(counter.hidden_field(repeats));
        fields
    }

    /// A dependency on a field of the same group points at that group's copy.
    fn index_dependency(&self, rule: &DisabledIf, index: usize) -> DisabledIf {
        let cloned = self.fields.iter().any(|f| f.name == rule.dependency);
        DisabledIf {
            dependency: if cloned {
                indexed_name(&rule.dependency, index)
            } else {
                rule.dependency.clone()
            },
            value: rule.value.clone(),
        }
    }
}

/// The hidden field holding the group count and the button that grows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatCounter {
    pub hidden_name: String,
    pub add_button_name: String,
    /// Groups added per press of the add button.
    pub add_count: usize,
}

impl RepeatCounter {
    pub fn new(
        hidden_name: impl Into<String>,
        add_button_name: impl Into<String>,
        add_count: usize,
    ) -> Self {
        Self {
            hidden_name: hidden_name.into(),
            add_button_name: add_button_name.into(),
            add_count,
        }
    }

    /// Number of groups to render: a submitted counter value wins over the
    /// initial count, and pressing the add button grows it by `add_count`.
    /// The result never exceeds [`MAX_REPEATS`].
    pub fn resolve(&self, initial: usize, submitted: Option<usize>, add_pressed: bool) -> usize {
        let repeats = submitted.unwrap_or(initial);
        let repeats = if add_pressed {
            repeats.saturating_add(self.add_count)
        } else {
            repeats
        };
        repeats.min(MAX_REPEATS)
    }

    /// The hidden counter field, pinned to `repeats`.
    pub fn hidden_field(&self, repeats: usize) -> Field {
        Field::new(self.hidden_name.clone(), "", FieldKind::Hidden)
            .with_default(repeats.to_string())
            .with_type(ParamType::Int)
            .constant()
    }
}

/// Append a group index to a field name, before any existing `[...]` suffix.
pub fn indexed_name(name: &str, index: usize) -> String {
    match name.find('[') {
        Some(pos) => format!("{}[{index}]{}", &name[..pos], &name[pos..]),
        None => format!("{name}[{index}]"),
    }
}

//! Field types of the authoring form.

use serde::Serialize;

/// How a submitted value is cleaned before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Int,
    Bool,
    Float,
    Text,
    Raw,
}

/// One entry of a select menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Widget kind plus its kind-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Header,
    Static,
    Select { options: Vec<SelectOption> },
    Checkbox,
    Editor { rows: u32 },
    Hidden,
    Button,
    FilePicker {
        max_bytes: u64,
        accepted_types: Vec<String>,
    },
}

/// Disable a field while another field holds a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisabledIf {
    pub dependency: String,
    pub value: String,
}

/// A single form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_if: Option<DisabledIf>,
    /// Help string identifier shown next to the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// A constant keeps its value even when a different one is submitted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub constant: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            default: None,
            param_type: None,
            disabled_if: None,
            help: None,
            constant: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    pub fn disabled_if(mut self, dependency: impl Into<String>, value: impl Into<String>) -> Self {
        self.disabled_if = Some(DisabledIf {
            dependency: dependency.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }
}

/// The full, ordered field list of a form.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormDefinition {
    pub fields: Vec<Field>,
    /// Buttons that reload the form instead of submitting it.
    pub no_submit_buttons: Vec<String>,
}

impl FormDefinition {
    /// Look up a field by its (indexed) name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in render order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

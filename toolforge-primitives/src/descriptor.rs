//! Self-describing tool metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AccessLevel, FieldMap};

/// Structured metadata a tool publishes about itself.
///
/// Only `id` and `access_level` carry meaning for the runtime. The schemas
/// and any extra UI fields are passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default)]
    access_level: AccessLevel,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    input_schema: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    output_schema: Value,
    #[serde(flatten)]
    extra: FieldMap,
}

impl ToolDescriptor {
    /// Starts building a [`ToolDescriptor`].
    #[must_use]
    pub fn builder(id: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            id: id.into(),
            name: None,
            description: None,
            category: None,
            access_level: AccessLevel::default(),
            input_schema: Value::Null,
            output_schema: Value::Null,
            extra: FieldMap::new(),
        }
    }

    /// Returns the unique tool identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name, falling back to the id when none was given.
    #[must_use]
    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the optional category.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the required access level, already coerced to a valid value.
    #[must_use]
    pub const fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Returns the declared input schema.
    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the declared output schema.
    #[must_use]
    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Returns fields the runtime does not interpret.
    #[must_use]
    pub fn extra(&self) -> &FieldMap {
        &self.extra
    }
}

/// Builder for [`ToolDescriptor`].
#[derive(Debug)]
pub struct ToolDescriptorBuilder {
    id: String,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    access_level: AccessLevel,
    input_schema: Value,
    output_schema: Value,
    extra: FieldMap,
}

impl ToolDescriptorBuilder {
    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets an optional description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an optional category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the required access level.
    #[must_use]
    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Sets the required access level from a declared string, coercing
    /// unrecognised values to [`AccessLevel::Normal`].
    #[must_use]
    pub fn declared_level(mut self, raw: &str) -> Self {
        self.access_level = AccessLevel::coerce(Some(raw));
        self
    }

    /// Sets the input field schema.
    #[must_use]
    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Sets the output field schema.
    #[must_use]
    pub fn output_schema(mut self, schema: Value) -> Self {
        self.output_schema = schema;
        self
    }

    /// Adds an opaque passthrough field.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Consumes the builder and returns the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] when the id is empty.
    pub fn build(self) -> crate::Result<ToolDescriptor> {
        if self.id.trim().is_empty() {
            return Err(crate::Error::InvalidDescriptor {
                reason: "descriptor id cannot be empty".into(),
            });
        }

        Ok(ToolDescriptor {
            name: self.name.unwrap_or_default(),
            id: self.id,
            description: self.description,
            category: self.category,
            access_level: self.access_level,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
            extra: self.extra,
        })
    }
}

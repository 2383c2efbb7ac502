//! Field metadata consulted when indexing documents and evaluating filters.

use serde::{Deserialize, Serialize};
use sift_common::{Result, error::Error, verify_arg};

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int32,
    Int64,
    Float,
    Bool,
    String,
}

/// Schema entry for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// The field holds an array of values of `kind`.
    #[serde(default)]
    pub is_array: bool,
    /// Whether the field participates in the index at all.
    #[serde(default = "default_index")]
    pub index: bool,
    /// Tokenizer applied to string values, see `sift_text::create_tokenizer`.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
}

fn default_index() -> bool {
    true
}

fn default_tokenizer() -> String {
    "unicode-word".to_string()
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_array: false,
            index: true,
            tokenizer: default_tokenizer(),
        }
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn unindexed(mut self) -> Self {
        self.index = false;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Into<String>) -> Self {
        self.tokenizer = tokenizer.into();
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind, FieldKind::Int32 | FieldKind::Int64)
    }

    pub fn is_float(&self) -> bool {
        self.kind == FieldKind::Float
    }

    pub fn is_bool(&self) -> bool {
        self.kind == FieldKind::Bool
    }

    pub fn is_string(&self) -> bool {
        self.kind == FieldKind::String
    }

    /// Numeric, float and bool fields share the range-tree representation.
    pub fn is_numeric(&self) -> bool {
        !self.is_string()
    }
}

/// Ordered collection of field schemas with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            verify_arg!(field_name, !field.name.is_empty());
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(Error::invalid_arg(
                    "fields",
                    format!("duplicate field `{}`", field.name),
                ));
            }
        }
        Ok(Self { fields })
    }

    /// Parses a schema from a JSON array of field definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let fields: Vec<FieldSchema> = serde_json::from_str(json)
            .map_err(|e| Error::invalid_arg("schema", e.to_string()))?;
        Self::new(fields)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_json() {
        let schema = Schema::from_json(
            r#"[
                {"name": "title", "type": "string"},
                {"name": "tags", "type": "string", "is_array": true, "tokenizer": "trivial"},
                {"name": "price", "type": "float"},
                {"name": "internal", "type": "int64", "index": false}
            ]"#,
        )
        .unwrap();

        let title = schema.field("title").unwrap();
        assert!(title.is_string() && title.index && !title.is_array);
        assert_eq!(title.tokenizer, "unicode-word");

        let tags = schema.field("tags").unwrap();
        assert!(tags.is_array);
        assert_eq!(tags.tokenizer, "trivial");

        assert!(schema.field("price").unwrap().is_float());
        assert!(!schema.field("internal").unwrap().index);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let result = Schema::new(vec![
            FieldSchema::new("a", FieldKind::Int32),
            FieldSchema::new("a", FieldKind::Bool),
        ]);
        assert!(result.is_err());
        assert!(Schema::from_json(r#"[{"name": "a", "type": "decimal"}]"#).is_err());
    }
}

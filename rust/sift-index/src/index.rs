//! In-memory index of one collection.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sift_common::{Result, error::Error};
use sift_text::{
    FieldTokenizer, TokenOffset, Tokenizer, TokenizerOptions, create_tokenizer, normalize_term,
};

use crate::{FieldSchema, NumTree, Schema, SeqIdSet, TokenIndex, float_to_i64};

/// Index-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Non-alphanumeric characters kept inside terms.
    pub symbols_to_index: Vec<char>,
    /// Characters that always split terms.
    pub token_separators: Vec<char>,
    /// Postings with up to this many documents stay in the compact encoding.
    pub compact_posting_threshold: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            symbols_to_index: Vec::new(),
            token_separators: Vec::new(),
            compact_posting_threshold: 16,
        }
    }
}

impl IndexOptions {
    fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            symbols_to_index: self.symbols_to_index.clone(),
            token_separators: self.token_separators.clone(),
        }
    }
}

/// Field values of one document, converted and validated before any structure
/// is touched.
enum StagedField {
    Numeric(Vec<i64>),
    Tokens(AHashMap<String, Vec<TokenOffset>>),
}

/// Numeric trees, term dictionaries and the sequence-id set of a collection.
pub struct Index {
    schema: Schema,
    options: IndexOptions,
    tokenizers: AHashMap<String, FieldTokenizer>,
    numeric: AHashMap<String, NumTree>,
    tokens: AHashMap<String, TokenIndex>,
    seq_ids: SeqIdSet,
}

impl Index {
    /// Name of the synthetic field whose filter matches every document.
    pub const SEQ_IDS_FIELD: &'static str = "$SEQ_IDS";

    pub fn new(schema: Schema, options: IndexOptions) -> Result<Self> {
        let tokenizer_options = options.tokenizer_options();
        let mut tokenizers = AHashMap::new();
        let mut numeric = AHashMap::new();
        let mut tokens = AHashMap::new();

        for field in schema.fields().iter().filter(|field| field.index) {
            if field.is_string() {
                let tokenizer = create_tokenizer(&field.tokenizer, &tokenizer_options)?;
                tokenizers.insert(field.name.clone(), tokenizer);
                tokens.insert(field.name.clone(), TokenIndex::new());
            } else {
                numeric.insert(field.name.clone(), NumTree::new());
            }
        }

        Ok(Self {
            schema,
            options,
            tokenizers,
            numeric,
            tokens,
            seq_ids: SeqIdSet::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.schema.field(name)
    }

    pub fn field_is_indexed(&self, name: &str) -> bool {
        self.numeric.contains_key(name) || self.tokens.contains_key(name)
    }

    pub fn numeric_index(&self, name: &str) -> Option<&NumTree> {
        self.numeric.get(name)
    }

    pub fn token_index(&self, name: &str) -> Option<&TokenIndex> {
        self.tokens.get(name)
    }

    pub fn seq_ids(&self) -> &SeqIdSet {
        &self.seq_ids
    }

    /// Splits `value` into normalized terms using the tokenizer of string field
    /// `field`. Returns no terms for fields without a tokenizer.
    pub fn tokenize(&self, field: &str, value: &str) -> Vec<String> {
        match self.tokenizers.get(field) {
            Some(tokenizer) => tokenizer.tokenize(value).map(normalize_term).collect(),
            None => Vec::new(),
        }
    }

    /// Adds a JSON document under `seq_id`. Missing and `null` fields are skipped.
    pub fn index_document(&mut self, seq_id: u32, document: &Value) -> Result<()> {
        let staged = self.stage_document(document)?;
        let threshold = self.options.compact_posting_threshold;

        for (name, field) in staged {
            match field {
                StagedField::Numeric(values) => {
                    if let Some(tree) = self.numeric.get_mut(&name) {
                        values.into_iter().for_each(|value| tree.insert(value, seq_id));
                    }
                }
                StagedField::Tokens(terms) => {
                    if let Some(index) = self.tokens.get_mut(&name) {
                        for (term, offsets) in terms {
                            index.upsert(&term, seq_id, &offsets, threshold);
                        }
                    }
                }
            }
        }

        self.seq_ids.insert(seq_id);
        log::trace!("indexed document {seq_id}");
        Ok(())
    }

    /// Removes a previously indexed document. `document` must hold the values it
    /// was indexed with.
    pub fn remove_document(&mut self, seq_id: u32, document: &Value) -> Result<()> {
        let staged = self.stage_document(document)?;

        for (name, field) in staged {
            match field {
                StagedField::Numeric(values) => {
                    if let Some(tree) = self.numeric.get_mut(&name) {
                        values.into_iter().for_each(|value| tree.remove(value, seq_id));
                    }
                }
                StagedField::Tokens(terms) => {
                    if let Some(index) = self.tokens.get_mut(&name) {
                        terms.keys().for_each(|term| index.erase(term, seq_id));
                    }
                }
            }
        }

        self.seq_ids.remove(seq_id);
        Ok(())
    }

    fn stage_document(&self, document: &Value) -> Result<Vec<(String, StagedField)>> {
        let Value::Object(object) = document else {
            return Err(Error::invalid_arg("document", "expected a JSON object"));
        };

        let mut staged = Vec::new();
        for field in self.schema.fields().iter().filter(|field| field.index) {
            let value = match object.get(&field.name) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            let elements: Vec<&Value> = if field.is_array {
                match value {
                    Value::Array(items) => items.iter().collect(),
                    _ => {
                        return Err(Error::invalid_arg(
                            &field.name,
                            "expected an array value",
                        ));
                    }
                }
            } else {
                vec![value]
            };

            let entry = if field.is_string() {
                StagedField::Tokens(self.stage_strings(field, &elements)?)
            } else {
                StagedField::Numeric(
                    elements
                        .iter()
                        .map(|element| numeric_value(field, element))
                        .collect::<Result<_>>()?,
                )
            };
            staged.push((field.name.clone(), entry));
        }
        Ok(staged)
    }

    fn stage_strings(
        &self,
        field: &FieldSchema,
        elements: &[&Value],
    ) -> Result<AHashMap<String, Vec<TokenOffset>>> {
        let mut terms: AHashMap<String, Vec<TokenOffset>> = AHashMap::new();
        for (element, value) in elements.iter().enumerate() {
            let Some(text) = value.as_str() else {
                return Err(Error::invalid_arg(&field.name, "expected a string value"));
            };
            let tokens = self.tokenize(&field.name, text);
            let last = tokens.len().saturating_sub(1);
            for (position, token) in tokens.into_iter().enumerate() {
                let offset = TokenOffset::new(element as u32, position as u32, position == last);
                terms.entry(token).or_default().push(offset);
            }
        }
        Ok(terms)
    }
}

/// Converts a JSON scalar into the canonical range-tree value of `field`.
fn numeric_value(field: &FieldSchema, value: &Value) -> Result<i64> {
    let converted = if field.is_integer() {
        value.as_i64().filter(|v| {
            field.kind != crate::FieldKind::Int32 || i32::try_from(*v).is_ok()
        })
    } else if field.is_float() {
        value.as_f64().map(|v| float_to_i64(v as f32))
    } else {
        value.as_bool().map(i64::from)
    };

    converted.ok_or_else(|| {
        Error::invalid_arg(
            &field.name,
            format!("value {value} does not fit field type {:?}", field.kind),
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Comparator, FieldKind};

    fn products() -> Index {
        let schema = Schema::new(vec![
            FieldSchema::new("title", FieldKind::String),
            FieldSchema::new("tags", FieldKind::String).array(),
            FieldSchema::new("stock", FieldKind::Int32),
            FieldSchema::new("price", FieldKind::Float),
            FieldSchema::new("active", FieldKind::Bool),
            FieldSchema::new("notes", FieldKind::String).unindexed(),
        ])
        .unwrap();
        Index::new(schema, IndexOptions::default()).unwrap()
    }

    #[test]
    fn test_index_document() {
        let mut index = products();
        index
            .index_document(
                3,
                &json!({
                    "title": "Blue Suede Shoes",
                    "tags": ["music", "rock and roll"],
                    "stock": 12,
                    "price": 19.5,
                    "active": true,
                    "notes": "not indexed",
                }),
            )
            .unwrap();

        assert_eq!(index.seq_ids().uncompress(), vec![3]);
        assert!(index.field_is_indexed("title"));
        assert!(!index.field_is_indexed("notes"));
        assert!(!index.field_is_indexed("unknown"));

        let title = index.token_index("title").unwrap();
        assert_eq!(title.lookup("suede").unwrap().ids(), vec![3]);
        assert!(title.lookup("Suede").is_none());

        let tags = index.token_index("tags").unwrap();
        assert_eq!(tags.num_terms(), 4);

        let stock = index.numeric_index("stock").unwrap();
        assert_eq!(stock.search(Comparator::Equals, 12), vec![3]);
        let price = index.numeric_index("price").unwrap();
        assert_eq!(price.search(Comparator::Equals, float_to_i64(19.5)), vec![3]);
        let active = index.numeric_index("active").unwrap();
        assert_eq!(active.search(Comparator::Equals, 1), vec![3]);
    }

    #[test]
    fn test_type_mismatch_leaves_index_untouched() {
        let mut index = products();
        let result = index.index_document(1, &json!({"title": "ok", "stock": "twelve"}));
        assert!(result.is_err());
        assert_eq!(index.seq_ids().num_ids(), 0);
        assert_eq!(index.token_index("title").unwrap().num_terms(), 0);

        assert!(index.index_document(1, &json!({"tags": "single"})).is_err());
        assert!(index.index_document(1, &json!({"stock": 1_i64 << 40})).is_err());
        assert!(index.index_document(1, &json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_remove_document() {
        let mut index = products();
        let doc = json!({"title": "red shoes", "stock": 4});
        index.index_document(1, &doc).unwrap();
        index.index_document(2, &json!({"title": "red hat", "stock": 4})).unwrap();
        index.remove_document(1, &doc).unwrap();

        let title = index.token_index("title").unwrap();
        assert!(title.lookup("shoes").is_none());
        assert_eq!(title.lookup("red").unwrap().ids(), vec![2]);
        assert_eq!(
            index.numeric_index("stock").unwrap().search(Comparator::Equals, 4),
            vec![2]
        );
        assert_eq!(index.seq_ids().uncompress(), vec![2]);
    }

    #[test]
    fn test_unknown_tokenizer_is_rejected() {
        let schema =
            Schema::new(vec![FieldSchema::new("title", FieldKind::String).with_tokenizer("nope")])
                .unwrap();
        assert!(Index::new(schema, IndexOptions::default()).is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options: IndexOptions =
            serde_json::from_str(r#"{"symbols_to_index": ["+"], "compact_posting_threshold": 2}"#)
                .unwrap();
        assert_eq!(options.symbols_to_index, vec!['+']);
        assert!(options.token_separators.is_empty());
        assert_eq!(options.compact_posting_threshold, 2);
    }
}

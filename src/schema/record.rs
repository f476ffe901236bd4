use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::types::{IndexMode, StoreMode};

/// Declared storage/indexing policy for one field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPolicy {
    pub store: StoreMode,
    pub index: IndexMode,
    pub boost: f32,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        FieldPolicy {
            store: StoreMode::Stored,
            index: IndexMode::Verbatim,
            boost: 1.0,
        }
    }
}

impl FieldPolicy {
    pub fn stored() -> Self {
        FieldPolicy::default()
    }

    pub fn tokenized() -> Self {
        FieldPolicy {
            index: IndexMode::Tokenized,
            ..FieldPolicy::default()
        }
    }

    pub fn store(mut self, store: StoreMode) -> Self {
        self.store = store;
        self
    }

    pub fn index(mut self, index: IndexMode) -> Self {
        self.index = index;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &str) -> Result<()> + Send + Sync>;

/// One field of a record schema: name, policy, and string accessors.
pub struct FieldSpec<T> {
    name: String,
    policy: FieldPolicy,
    get: Getter<T>,
    set: Setter<T>,
}

impl<T> FieldSpec<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    pub fn read(&self, record: &T) -> Option<String> {
        (self.get)(record)
    }

    pub fn write(&self, record: &mut T, value: &str) -> Result<()> {
        (self.set)(record, value)
    }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Ordered, case-insensitively keyed field table for a record type.
///
/// Built once per type at registration time and immutable afterwards; field
/// order is the declaration order and is deterministic.
pub struct RecordSchema<T> {
    fields: Vec<FieldSpec<T>>,
    by_name: HashMap<String, usize>,
}

impl<T> RecordSchema<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Case-insensitive lookup by field name.
    pub fn lookup(&self, name: &str) -> Option<&FieldSpec<T>> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.fields[i])
    }
}

impl<T> fmt::Debug for RecordSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`RecordSchema`], replacing per-field attribute annotations
/// with an explicit one-time declaration step.
pub struct SchemaBuilder<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> SchemaBuilder<T> {
    /// Declare a field with raw string accessors.
    pub fn field<G, S>(mut self, name: &str, policy: FieldPolicy, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<String> + Send + Sync + 'static,
        S: Fn(&mut T, String) + Send + Sync + 'static,
    {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            policy,
            get: Box::new(get),
            set: Box::new(move |record, value| {
                set(record, value.to_string());
                Ok(())
            }),
        });
        self
    }

    /// Declare a field whose value parses through its own type. An empty
    /// stored value leaves the field unset; a non-empty value the type
    /// cannot parse surfaces as a type-conversion error.
    pub fn parsed_field<V, G, S>(mut self, name: &str, policy: FieldPolicy, get: G, set: S) -> Self
    where
        V: FromStr + ToString,
        V::Err: fmt::Display,
        G: Fn(&T) -> Option<V> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let field = name.to_string();
        self.fields.push(FieldSpec {
            name: name.to_string(),
            policy,
            get: Box::new(move |record| get(record).map(|v| v.to_string())),
            set: Box::new(move |record, value| {
                if value.is_empty() {
                    return Ok(());
                }
                let parsed = value
                    .parse::<V>()
                    .map_err(|e| Error::conversion(&field, e))?;
                set(record, parsed);
                Ok(())
            }),
        });
        self
    }

    pub fn build(self) -> RecordSchema<T> {
        let by_name = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.to_lowercase(), i))
            .collect();
        RecordSchema {
            fields: self.fields,
            by_name,
        }
    }
}

/// A caller-supplied record type that maps onto index documents.
///
/// The field literally named `id` is the primary key; an unset key is
/// replaced by a generated identifier when the record is mapped.
pub trait IndexRecord: Default + Send + Sync + 'static {
    /// Build the schema descriptor for this type. Called once per type per
    /// registry; the result is cached for the registry's lifetime.
    fn schema() -> RecordSchema<Self>;

    /// Index name used when none is given explicitly; defaults to the type's
    /// unqualified name.
    fn index_name() -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: Option<String>,
        name: Option<String>,
        phone: Option<i64>,
    }

    impl IndexRecord for Sample {
        fn schema() -> RecordSchema<Self> {
            RecordSchema::builder()
                .field(
                    "id",
                    FieldPolicy::default(),
                    |s: &Sample| s.id.clone(),
                    |s, v| s.id = Some(v),
                )
                .field(
                    "Name",
                    FieldPolicy::tokenized().boost(2.0),
                    |s: &Sample| s.name.clone(),
                    |s, v| s.name = Some(v),
                )
                .parsed_field(
                    "Phone",
                    FieldPolicy::default(),
                    |s: &Sample| s.phone,
                    |s, v| s.phone = Some(v),
                )
                .build()
        }
    }

    #[test]
    fn declaration_order_is_preserved() {
        let schema = Sample::schema();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["id", "Name", "Phone"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let schema = Sample::schema();
        assert!(schema.lookup("name").is_some());
        assert!(schema.lookup("NAME").is_some());
        assert!(schema.lookup("pHoNe").is_some());
        assert!(schema.lookup("missing").is_none());
    }

    #[test]
    fn default_policy_is_stored_verbatim() {
        let policy = FieldPolicy::default();
        assert_eq!(policy.store, StoreMode::Stored);
        assert_eq!(policy.index, IndexMode::Verbatim);
        assert_eq!(policy.boost, 1.0);
        assert_eq!(FieldPolicy::stored(), policy);
    }

    #[test]
    fn parsed_field_surfaces_conversion_errors() {
        let schema = Sample::schema();
        let mut sample = Sample::default();
        let phone = schema.lookup("phone").unwrap();
        phone.write(&mut sample, "12345").unwrap();
        assert_eq!(sample.phone, Some(12345));

        let err = phone.write(&mut sample, "not a number").unwrap_err();
        assert!(matches!(err, Error::TypeConversion { ref field, .. } if field == "Phone"));
    }

    #[test]
    fn empty_stored_value_leaves_parsed_field_unset() {
        let schema = Sample::schema();
        let mut sample = Sample::default();
        schema.lookup("phone").unwrap().write(&mut sample, "").unwrap();
        assert_eq!(sample.phone, None);
    }

    #[test]
    fn default_index_name_is_type_name() {
        assert_eq!(Sample::index_name(), "Sample");
    }
}

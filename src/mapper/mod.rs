//! Conversion between typed records and engine-neutral documents.

use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::types::{DocField, Document};
use crate::oid::ObjectId;
use crate::schema::record::{IndexRecord, RecordSchema};

/// Key field name; an unset key is replaced by a generated identifier.
pub const KEY_FIELD: &str = "id";

/// Field name that, when present, overrides the document-level boost.
pub const BOOST_FIELD: &str = "boost";

/// Maps records of one type to documents and back through the type's schema.
pub struct DocumentMapper<T: IndexRecord> {
    schema: Arc<RecordSchema<T>>,
}

impl<T: IndexRecord> DocumentMapper<T> {
    pub fn new(schema: Arc<RecordSchema<T>>) -> Self {
        DocumentMapper { schema }
    }

    pub fn schema(&self) -> &RecordSchema<T> {
        &self.schema
    }

    /// Convert a record to a document, one field per schema entry in
    /// declaration order. An unset key field gets a fresh identifier; any
    /// other unset field becomes the empty string.
    pub fn to_document(&self, record: &T) -> Result<Document> {
        let mut doc = Document::new();
        for spec in self.schema.fields() {
            let raw = spec.read(record);
            let value = match raw {
                None if spec.name() == KEY_FIELD => ObjectId::new_id(),
                None => String::new(),
                Some(v) => v,
            };

            if spec.name() == BOOST_FIELD && !value.is_empty() {
                doc.boost = value
                    .parse::<f32>()
                    .map_err(|e| Error::conversion(BOOST_FIELD, e))?;
            }

            let policy = spec.policy();
            doc.push(DocField {
                name: spec.name().to_string(),
                value,
                store: policy.store,
                index: policy.index,
                boost: policy.boost,
            });
        }
        Ok(doc)
    }

    /// Convert a document back to a record. Document fields with no schema
    /// counterpart are ignored; a value the target field cannot parse is a
    /// type-conversion error.
    pub fn to_record(&self, doc: &Document) -> Result<T> {
        let mut record = T::default();
        for field in doc.fields() {
            if let Some(spec) = self.schema.lookup(&field.name) {
                spec.write(&mut record, &field.value)?;
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{IndexMode, StoreMode};
    use crate::schema::record::FieldPolicy;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: Option<String>,
        name: Option<String>,
        phone: Option<i64>,
        money: Option<f64>,
    }

    impl IndexRecord for Person {
        fn schema() -> RecordSchema<Self> {
            RecordSchema::builder()
                .field(
                    "id",
                    FieldPolicy::default(),
                    |p: &Person| p.id.clone(),
                    |p, v| p.id = Some(v),
                )
                .field(
                    "Name",
                    FieldPolicy::tokenized().boost(2.0),
                    |p: &Person| p.name.clone(),
                    |p, v| p.name = Some(v),
                )
                .parsed_field(
                    "Phone",
                    FieldPolicy::default(),
                    |p: &Person| p.phone,
                    |p, v| p.phone = Some(v),
                )
                .parsed_field(
                    "Money",
                    FieldPolicy::default().store(StoreMode::Stored),
                    |p: &Person| p.money,
                    |p, v| p.money = Some(v),
                )
                .build()
        }
    }

    fn mapper() -> DocumentMapper<Person> {
        DocumentMapper::new(Arc::new(Person::schema()))
    }

    #[test]
    fn round_trip_preserves_values() {
        let person = Person {
            id: Some("5f3a0c1db2e4f6a8d0c2e4f6".to_string()),
            name: Some("Ada Lovelace".to_string()),
            phone: Some(5550100),
            money: Some(12.5),
        };
        let mapper = mapper();
        let doc = mapper.to_document(&person).unwrap();
        let back = mapper.to_record(&doc).unwrap();
        assert_eq!(back, person);
    }

    #[test]
    fn unset_key_gets_a_fresh_identifier() {
        let person = Person {
            name: Some("no key".to_string()),
            ..Person::default()
        };
        let mapper = mapper();
        let doc = mapper.to_document(&person).unwrap();
        let id = doc.get("id").unwrap();
        assert_eq!(id.len(), 24);
        assert!(crate::oid::ObjectId::try_parse(id).is_some());

        let back = mapper.to_record(&doc).unwrap();
        assert!(back.id.is_some());
    }

    #[test]
    fn unset_non_key_fields_become_empty_strings() {
        let person = Person::default();
        let doc = mapper().to_document(&person).unwrap();
        assert_eq!(doc.get("Name"), Some(""));
        assert_eq!(doc.get("Phone"), Some(""));
    }

    #[test]
    fn field_order_mirrors_schema_order() {
        let doc = mapper().to_document(&Person::default()).unwrap();
        let names: Vec<_> = doc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "Name", "Phone", "Money"]);
    }

    #[test]
    fn policy_is_carried_onto_document_fields() {
        let doc = mapper().to_document(&Person::default()).unwrap();
        let name = &doc.fields()[1];
        assert_eq!(name.index, IndexMode::Tokenized);
        assert_eq!(name.boost, 2.0);
        assert_eq!(doc.boost, 1.0);
    }

    #[test]
    fn unknown_document_fields_are_ignored() {
        let mut doc = Document::new();
        doc.push(DocField {
            name: "nonexistent".to_string(),
            value: "anything".to_string(),
            store: StoreMode::Stored,
            index: IndexMode::Verbatim,
            boost: 1.0,
        });
        doc.push(DocField {
            name: "NAME".to_string(), // case-insensitive match
            value: "kept".to_string(),
            store: StoreMode::Stored,
            index: IndexMode::Verbatim,
            boost: 1.0,
        });
        let back = mapper().to_record(&doc).unwrap();
        assert_eq!(back.name.as_deref(), Some("kept"));
        assert!(back.id.is_none());
    }

    #[test]
    fn unparsable_value_is_a_conversion_error() {
        let mut doc = Document::new();
        doc.push(DocField {
            name: "Phone".to_string(),
            value: "not a number".to_string(),
            store: StoreMode::Stored,
            index: IndexMode::Verbatim,
            boost: 1.0,
        });
        let err = mapper().to_record(&doc).unwrap_err();
        assert!(matches!(err, Error::TypeConversion { ref field, .. } if field == "Phone"));
    }

    #[derive(Debug, Default)]
    struct Boosted {
        id: Option<String>,
        boost: Option<String>,
    }

    impl IndexRecord for Boosted {
        fn schema() -> RecordSchema<Self> {
            RecordSchema::builder()
                .field(
                    "id",
                    FieldPolicy::default(),
                    |b: &Boosted| b.id.clone(),
                    |b, v| b.id = Some(v),
                )
                .field(
                    "boost",
                    FieldPolicy::default(),
                    |b: &Boosted| b.boost.clone(),
                    |b, v| b.boost = Some(v),
                )
                .build()
        }
    }

    #[test]
    fn boost_field_overrides_document_boost() {
        let mapper = DocumentMapper::new(Arc::new(Boosted::schema()));
        let doc = mapper
            .to_document(&Boosted {
                id: None,
                boost: Some("3.5".to_string()),
            })
            .unwrap();
        assert_eq!(doc.boost, 3.5);

        // unset boost field keeps the default weight
        let doc = mapper.to_document(&Boosted::default()).unwrap();
        assert_eq!(doc.boost, 1.0);

        let err = mapper
            .to_document(&Boosted {
                id: None,
                boost: Some("heavy".to_string()),
            })
            .unwrap_err();
        assert!(matches!(err, Error::TypeConversion { ref field, .. } if field == "boost"));
    }
}

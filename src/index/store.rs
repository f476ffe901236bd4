use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema as EngineSchema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::{DocAddress, Index, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, trace};

use crate::analysis::tokenizer::{AnalyzerBridge, Tokenizer};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::{DocField, Document, IndexMode, StoreMode};
use crate::index::query::{QueryInfo, QueryOutput, QueryPageInfo, SortOrder, SortSpec};
use crate::mapper::{DocumentMapper, KEY_FIELD};
use crate::schema::record::{IndexRecord, RecordSchema};

/// Name the per-index analyzer is registered under.
const ANALYZER_NAME: &str = "record_text";

/// Advisory lock file the engine leaves behind when a writer dies.
const WRITER_LOCK_FILE: &str = ".tantivy-writer.lock";

/// Access facade for one named on-disk index, bound to one record type.
///
/// Every mutating operation runs acquire-mutex → open-writer → change →
/// commit → drop-writer → release-mutex, with release guaranteed on error
/// paths by the guard's scope. Read operations open a fresh searcher per
/// call and never touch the mutex, so they see whatever the latest commit
/// was at searcher-open time.
pub struct IndexStore<T: IndexRecord> {
    index_name: String,
    path: PathBuf,
    index: Index,
    schema: Arc<RecordSchema<T>>,
    mapper: DocumentMapper<T>,
    fields: HashMap<String, Field>,
    id_field: Field,
    write_mutex: Arc<Mutex<()>>,
    writer_heap_bytes: usize,
}

impl<T: IndexRecord> IndexStore<T> {
    pub(crate) fn open(
        config: &Config,
        index_name: &str,
        schema: Arc<RecordSchema<T>>,
        write_mutex: Arc<Mutex<()>>,
        analyzer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        let path = config.index_path(index_name);
        fs::create_dir_all(&path)?;

        let index = match Index::open_in_dir(&path) {
            Ok(index) => index,
            Err(_) => {
                debug!(index = index_name, path = %path.display(), "creating index");
                Index::create_in_dir(&path, engine_schema(&schema))?
            }
        };
        index.tokenizers().register(
            ANALYZER_NAME,
            AnalyzerBridge::new(analyzer).into_analyzer(),
        );

        // field handles come from the schema the index was created with
        let stored_schema = index.schema();
        let mut fields = HashMap::new();
        for spec in schema.fields() {
            if let Ok(handle) = stored_schema.get_field(spec.name()) {
                fields.insert(spec.name().to_lowercase(), handle);
            }
        }
        let id_field = *fields
            .get(KEY_FIELD)
            .ok_or_else(|| Error::UnknownField(KEY_FIELD.to_string()))?;

        Ok(IndexStore {
            index_name: index_name.to_string(),
            path,
            index,
            mapper: DocumentMapper::new(schema.clone()),
            schema,
            fields,
            id_field,
            write_mutex,
            writer_heap_bytes: config.writer_heap_bytes,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn schema(&self) -> &RecordSchema<T> {
        &self.schema
    }

    pub fn mapper(&self) -> &DocumentMapper<T> {
        &self.mapper
    }

    // ---- write path -----------------------------------------------------

    pub fn insert(&self, record: &T) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        let doc = self.mapper.to_document(record)?;
        writer.add_document(self.to_engine_doc(&doc))?;
        writer.commit()?;
        debug!(index = %self.index_name, "inserted document");
        Ok(())
    }

    pub fn insert_many<'a, I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        let mut added = 0;
        for record in records {
            let doc = self.mapper.to_document(record)?;
            writer.add_document(self.to_engine_doc(&doc))?;
            added += 1;
        }
        writer.commit()?;
        debug!(index = %self.index_name, added, "inserted documents");
        Ok(added)
    }

    /// Replace the stored document whose key matches the record's key.
    /// Delete-by-key plus add in one transaction; the count of documents
    /// carrying that key is unchanged.
    pub fn update(&self, record: &T) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        self.apply_update(&mut writer, record)?;
        writer.commit()?;
        debug!(index = %self.index_name, "updated document");
        Ok(())
    }

    pub fn update_many<'a, I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        let mut updated = 0;
        for record in records {
            self.apply_update(&mut writer, record)?;
            updated += 1;
        }
        writer.commit()?;
        debug!(index = %self.index_name, updated, "updated documents");
        Ok(updated)
    }

    pub fn delete_by_id(&self, id: &str) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        writer.delete_term(Term::from_field_text(self.id_field, id));
        writer.commit()?;
        debug!(index = %self.index_name, id, "deleted document");
        Ok(())
    }

    pub fn delete_by_ids<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        for id in ids {
            writer.delete_term(Term::from_field_text(self.id_field, id.as_ref()));
        }
        writer.commit()?;
        Ok(())
    }

    pub fn delete_by_term(&self, field: &str, value: &str) -> Result<()> {
        self.delete_by_terms(&[(field, value)])
    }

    pub fn delete_by_terms(&self, terms: &[(&str, &str)]) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        for (field, value) in terms {
            let handle = self.field(field)?;
            writer.delete_term(Term::from_field_text(handle, value));
        }
        writer.commit()?;
        Ok(())
    }

    /// Delete every document matching a predicate. Matching keys are
    /// resolved through a fresh searcher inside the write mutex, then
    /// removed in the same transaction.
    pub fn delete_by_query(&self, query: &dyn Query) -> Result<usize> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        let searcher = self.searcher()?;
        let total = searcher.search(query, &Count)?;
        if total == 0 {
            return Ok(0);
        }
        let hits = searcher.search(query, &TopDocs::with_limit(total))?;
        let mut deleted = 0;
        for (_score, address) in hits {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) {
                writer.delete_term(Term::from_field_text(self.id_field, id));
                deleted += 1;
            }
        }
        writer.commit()?;
        debug!(index = %self.index_name, deleted, "deleted by query");
        Ok(deleted)
    }

    pub fn delete_all(&self) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        writer.delete_all_documents()?;
        writer.commit()?;
        debug!(index = %self.index_name, "deleted all documents");
        Ok(())
    }

    /// Merge all searchable segments into one. Document count and stored
    /// field values are unchanged.
    pub fn optimize(&self) -> Result<()> {
        let _guard = self.write_mutex.lock();
        let mut writer = self.open_writer()?;
        let segment_ids: Vec<_> = self
            .searcher()?
            .segment_readers()
            .iter()
            .map(|reader| reader.segment_id())
            .collect();
        if segment_ids.len() > 1 {
            let merge = writer.merge(&segment_ids);
            writer.commit()?;
            merge.wait()?;
            writer.wait_merging_threads()?;
            debug!(index = %self.index_name, merged = segment_ids.len(), "optimized index");
        }
        Ok(())
    }

    // ---- read path ------------------------------------------------------

    /// Point lookup by key. `return_fields` optionally restricts which
    /// stored fields are materialized (comma-separated names).
    pub fn get_by_id(&self, id: &str, return_fields: Option<&str>) -> Result<Option<T>> {
        let searcher = self.searcher()?;
        let query = TermQuery::new(
            Term::from_field_text(self.id_field, id),
            IndexRecordOption::Basic,
        );
        let hits = searcher.search(&query, &TopDocs::with_limit(1))?;
        let Some(&(_score, address)) = hits.first() else {
            return Ok(None);
        };
        let doc: TantivyDocument = searcher.doc(address)?;
        let projection = parse_projection(return_fields);
        let neutral = self.to_neutral_doc(&doc, projection.as_ref());
        trace!(index = %self.index_name, id, "point lookup hit");
        Ok(Some(self.mapper.to_record(&neutral)?))
    }

    /// Total hits for a predicate.
    pub fn count(&self, query: &dyn Query) -> Result<usize> {
        Ok(self.searcher()?.search(query, &Count)?)
    }

    /// Total documents currently searchable.
    pub fn num_docs(&self) -> Result<u64> {
        Ok(self.searcher()?.num_docs())
    }

    /// Top-N query.
    pub fn query(&self, info: QueryInfo) -> Result<QueryOutput<T>> {
        self.run_query(
            info.query,
            info.filter,
            info.sort,
            0,
            info.return_count,
            info.return_fields.as_deref(),
        )
    }

    /// Paged query: `total` counts every match, the page is the slice
    /// `[skip, min(skip + take, total))`.
    pub fn query_page(&self, info: QueryPageInfo) -> Result<QueryOutput<T>> {
        self.run_query(
            info.query,
            info.filter,
            info.sort,
            info.skip,
            info.take,
            info.return_fields.as_deref(),
        )
    }

    /// Query parser over the given default fields, with declared field
    /// boosts applied.
    pub fn query_parser(&self, default_fields: &[&str]) -> Result<QueryParser> {
        let mut handles = Vec::with_capacity(default_fields.len());
        for name in default_fields {
            handles.push(self.field(name)?);
        }
        let mut parser = QueryParser::for_index(&self.index, handles);
        for spec in self.schema.fields() {
            let boost = spec.policy().boost;
            if boost != 1.0 {
                if let Some(&handle) = self.fields.get(&spec.name().to_lowercase()) {
                    parser.set_field_boost(handle, boost);
                }
            }
        }
        Ok(parser)
    }

    /// Verbatim term predicate on a named field.
    pub fn term_query(&self, field: &str, value: &str) -> Result<Box<dyn Query>> {
        let handle = self.field(field)?;
        Ok(Box::new(TermQuery::new(
            Term::from_field_text(handle, value),
            IndexRecordOption::Basic,
        )))
    }

    // ---- internals ------------------------------------------------------

    fn run_query(
        &self,
        query: Box<dyn Query>,
        filter: Option<Box<dyn Query>>,
        sort: Option<SortSpec>,
        skip: usize,
        take: usize,
        return_fields: Option<&str>,
    ) -> Result<QueryOutput<T>> {
        let query: Box<dyn Query> = match filter {
            Some(filter) => Box::new(BooleanQuery::new(vec![
                (Occur::Must, query),
                (Occur::Must, filter),
            ])),
            None => query,
        };

        let searcher = self.searcher()?;
        let total = searcher.search(&query, &Count)?;

        // a field sort has to rank every match; relevance order only needs
        // the page's worth of hits
        let fetch = if sort.is_some() {
            total
        } else {
            (skip + take).min(total)
        };
        if fetch == 0 || skip >= total || take == 0 {
            return Ok(QueryOutput {
                total,
                records: Vec::new(),
            });
        }

        let hits = searcher.search(&query, &TopDocs::with_limit(fetch))?;
        let mut docs = Vec::with_capacity(hits.len());
        for (_score, address) in hits {
            let address: DocAddress = address;
            let doc: TantivyDocument = searcher.doc(address)?;
            docs.push(doc);
        }

        if let Some(sort) = &sort {
            let handle = self.field(&sort.field)?;
            docs.sort_by_cached_key(|doc| {
                doc.get_first(handle)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            });
            if sort.order == SortOrder::Desc {
                docs.reverse();
            }
        }

        let projection = parse_projection(return_fields);
        let mut records = Vec::new();
        for doc in docs.into_iter().skip(skip).take(take) {
            let neutral = self.to_neutral_doc(&doc, projection.as_ref());
            records.push(self.mapper.to_record(&neutral)?);
        }
        trace!(index = %self.index_name, total, returned = records.len(), "query");
        Ok(QueryOutput { total, records })
    }

    /// Open the engine writer, clearing a stale advisory lock first.
    ///
    /// If a previous writer process crashed mid-transaction its lock file
    /// survives; removing it lets the next writer proceed. This is unsound
    /// when a second live writer exists in another process, so single-process
    /// writing is a precondition of this facade.
    fn open_writer(&self) -> Result<IndexWriter> {
        let lock_path = self.path.join(WRITER_LOCK_FILE);
        if lock_path.exists() {
            fs::remove_file(&lock_path)?;
        }
        Ok(self.index.writer::<TantivyDocument>(self.writer_heap_bytes)?)
    }

    /// Fresh reader/searcher; sees the latest commit as of this call.
    fn searcher(&self) -> Result<Searcher> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(reader.searcher())
    }

    fn apply_update(&self, writer: &mut IndexWriter, record: &T) -> Result<()> {
        // the key is read off the record itself; mapping a keyless record
        // would mint a fresh id and turn the update into an insert
        let id = self
            .schema
            .lookup(KEY_FIELD)
            .and_then(|spec| spec.read(record))
            .filter(|v| !v.is_empty())
            .ok_or(Error::MissingKey)?;
        let doc = self.mapper.to_document(record)?;
        writer.delete_term(Term::from_field_text(self.id_field, &id));
        writer.add_document(self.to_engine_doc(&doc))?;
        Ok(())
    }

    fn field(&self, name: &str) -> Result<Field> {
        self.fields
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    fn to_engine_doc(&self, doc: &Document) -> TantivyDocument {
        let mut engine_doc = TantivyDocument::default();
        for field in doc.fields() {
            if let Some(&handle) = self.fields.get(&field.name.to_lowercase()) {
                engine_doc.add_text(handle, &field.value);
            }
        }
        engine_doc
    }

    fn to_neutral_doc(
        &self,
        engine_doc: &TantivyDocument,
        projection: Option<&HashSet<String>>,
    ) -> Document {
        let mut doc = Document::new();
        for spec in self.schema.fields() {
            let policy = spec.policy();
            if policy.store != StoreMode::Stored {
                continue;
            }
            let lower = spec.name().to_lowercase();
            if let Some(projection) = projection {
                if !projection.contains(&lower) {
                    continue;
                }
            }
            let Some(&handle) = self.fields.get(&lower) else {
                continue;
            };
            if let Some(value) = engine_doc.get_first(handle).and_then(|v| v.as_str()) {
                doc.push(DocField {
                    name: spec.name().to_string(),
                    value: value.to_string(),
                    store: policy.store,
                    index: policy.index,
                    boost: policy.boost,
                });
            }
        }
        doc
    }
}

/// Schema for a fresh index, derived from the record's field policies.
fn engine_schema<T>(schema: &RecordSchema<T>) -> EngineSchema {
    let mut builder = EngineSchema::builder();
    for spec in schema.fields() {
        let policy = spec.policy();
        let mut options = TextOptions::default();
        if policy.store == StoreMode::Stored {
            options = options.set_stored();
        }
        options = match policy.index {
            IndexMode::NotIndexed => options,
            IndexMode::Verbatim => options.set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("raw")
                    .set_index_option(IndexRecordOption::Basic),
            ),
            IndexMode::Tokenized => options.set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(ANALYZER_NAME)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            ),
            IndexMode::TokenizedNoNorms => options.set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(ANALYZER_NAME)
                    .set_index_option(IndexRecordOption::WithFreqs)
                    .set_fieldnorms(false),
            ),
        };
        builder.add_text_field(spec.name(), options);
    }
    builder.build()
}

fn parse_projection(return_fields: Option<&str>) -> Option<HashSet<String>> {
    return_fields.map(|list| {
        list.split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    })
}

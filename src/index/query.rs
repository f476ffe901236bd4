use tantivy::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Order results by a stored field's value instead of relevance.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        SortSpec {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        SortSpec {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// Top-N query: predicate plus optional sort, filter and field projection.
pub struct QueryInfo {
    pub query: Box<dyn Query>,
    pub sort: Option<SortSpec>,
    pub filter: Option<Box<dyn Query>>,
    pub return_count: usize,
    /// Comma-separated stored-field names to materialize; `None` means all.
    pub return_fields: Option<String>,
}

impl QueryInfo {
    pub fn new(query: Box<dyn Query>, return_count: usize) -> Self {
        QueryInfo {
            query,
            sort: None,
            filter: None,
            return_count,
            return_fields: None,
        }
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn filter(mut self, filter: Box<dyn Query>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fields(mut self, fields: &str) -> Self {
        self.return_fields = Some(fields.to_string());
        self
    }
}

/// Skip/take paged query.
pub struct QueryPageInfo {
    pub query: Box<dyn Query>,
    pub sort: Option<SortSpec>,
    pub filter: Option<Box<dyn Query>>,
    pub skip: usize,
    pub take: usize,
    pub return_fields: Option<String>,
}

impl QueryPageInfo {
    pub fn new(query: Box<dyn Query>, skip: usize, take: usize) -> Self {
        QueryPageInfo {
            query,
            sort: None,
            filter: None,
            skip,
            take,
            return_fields: None,
        }
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn filter(mut self, filter: Box<dyn Query>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fields(mut self, fields: &str) -> Self {
        self.return_fields = Some(fields.to_string());
        self
    }
}

/// Query result: total matching hits and the materialized page.
#[derive(Debug)]
pub struct QueryOutput<T> {
    pub total: usize,
    pub records: Vec<T>,
}

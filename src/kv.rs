// Generic indexed key-value interface

use eyre::Result;
use serde_json::{Map, Value};
use std::fmt;

/// Partition key attribute
pub const PK: &str = "PK";

/// Sort key attribute
pub const SK: &str = "SK";

/// Attribute the secondary index is partitioned on
pub const CONTEXT_ATTR: &str = "context";

/// One row of the table: composite key plus free-form attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub pk: String,
    pub sk: String,
    pub attrs: Map<String, Value>,
}

impl Row {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
            attrs: Map::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// String attribute, `None` if absent or not a string
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }
}

/// Which key layout a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// Base table, partitioned on `PK`
    Table,
    /// `GSI1`, partitioned on `context`, ranged on `SK`
    Context,
}

impl Index {
    pub fn name(self) -> Option<&'static str> {
        match self {
            Index::Table => None,
            Index::Context => Some("GSI1"),
        }
    }

    pub fn partition_attr(self) -> &'static str {
        match self {
            Index::Table => PK,
            Index::Context => CONTEXT_ATTR,
        }
    }
}

/// Key condition: exact partition match plus optional `begins_with` on `SK`
#[derive(Debug, Clone)]
pub struct Query {
    pub index: Index,
    pub partition: String,
    pub sort_prefix: Option<String>,
}

impl Query {
    pub fn table(partition: impl Into<String>) -> Self {
        Self {
            index: Index::Table,
            partition: partition.into(),
            sort_prefix: None,
        }
    }

    pub fn context(context: impl Into<String>) -> Self {
        Self {
            index: Index::Context,
            partition: context.into(),
            sort_prefix: None,
        }
    }

    pub fn begins_with(mut self, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(prefix.into());
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attr = self.index.partition_attr();
        write!(f, "{} = {:?}", attr, self.partition)?;
        if let Some(prefix) = &self.sort_prefix {
            write!(f, " and begins_with({}, {:?})", SK, prefix)?;
        }
        if let Some(name) = self.index.name() {
            write!(f, " on {}", name)?;
        }
        Ok(())
    }
}

/// A single page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    /// Rows in ascending sort key order
    pub items: Vec<Row>,
    /// More rows matched than fit in the page
    pub truncated: bool,
}

/// Storage contract the TODO façade is written against
pub trait KvStore {
    /// Upsert by (PK, SK)
    fn put_item(&mut self, row: &Row) -> Result<()>;

    /// Point lookup
    fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Row>>;

    /// Delete by (PK, SK); deleting a missing row is not an error
    fn delete_item(&mut self, pk: &str, sk: &str) -> Result<()>;

    /// Single-page range query; no pagination follow-through
    fn query(&self, query: &Query) -> Result<QueryOutput>;
}

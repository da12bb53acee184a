//! Test doubles for running the pipeline without a server.
//!
//! [`MockExecutor`] answers the state query and the catalog query from
//! canned data; [`MockFactory`] hands out copies of one for each run.

use crate::connection::ConnectionFactory;
use crate::error::ExtractionError;
use crate::executor::CatalogExecutor;
use crate::schema::{CatalogRow, ColumnDescriptor};
use std::cell::Cell;
use std::rc::Rc;

/// A catalog row for table `table` in schema `dbo`.
pub fn catalog_row(table: &str, column: ColumnDescriptor) -> CatalogRow {
    CatalogRow {
        schema_name: "dbo".to_string(),
        table_name: table.to_string(),
        column,
    }
}

/// `Employees(Id int identity, Name nvarchar(100) null, ManagerId int null FK)`
pub fn employees_rows() -> Vec<CatalogRow> {
    vec![
        catalog_row(
            "Employees",
            ColumnDescriptor::new("Id", "int", false)
                .with_max_length(4)
                .primary_key()
                .identity(),
        ),
        catalog_row(
            "Employees",
            ColumnDescriptor::new("Name", "nvarchar", true).with_max_length(200),
        ),
        catalog_row(
            "Employees",
            ColumnDescriptor::new("ManagerId", "int", true)
                .with_max_length(4)
                .references("Employees", "Id"),
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct MockExecutor {
    state: Option<String>,
    rows: Vec<CatalogRow>,
    query_error: Option<String>,
    catalog_queries: usize,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// An `ONLINE` database with no user tables.
    pub fn new() -> Self {
        Self {
            state: Some("ONLINE".to_string()),
            rows: Vec::new(),
            query_error: None,
            catalog_queries: 0,
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    /// The state query finds no such database.
    pub fn without_database(mut self) -> Self {
        self.state = None;
        self
    }

    pub fn with_rows(mut self, rows: Vec<CatalogRow>) -> Self {
        self.rows = rows;
        self
    }

    /// The catalog query fails with [`ExtractionError::Query`].
    pub fn failing_query(mut self, message: &str) -> Self {
        self.query_error = Some(message.to_string());
        self
    }

    pub fn catalog_queries(&self) -> usize {
        self.catalog_queries
    }
}

impl CatalogExecutor for MockExecutor {
    fn database_state(&mut self, _database_name: &str) -> Result<Option<String>, ExtractionError> {
        Ok(self.state.clone())
    }

    fn catalog_rows(&mut self) -> Result<Vec<CatalogRow>, ExtractionError> {
        self.catalog_queries += 1;
        match &self.query_error {
            Some(message) => Err(ExtractionError::Query(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

/// Executor handed out by [`MockFactory`]; counts its own release.
#[derive(Debug)]
pub struct TrackedExecutor {
    inner: MockExecutor,
    released: Rc<Cell<usize>>,
}

impl CatalogExecutor for TrackedExecutor {
    fn database_state(&mut self, database_name: &str) -> Result<Option<String>, ExtractionError> {
        self.inner.database_state(database_name)
    }

    fn catalog_rows(&mut self) -> Result<Vec<CatalogRow>, ExtractionError> {
        self.inner.catalog_rows()
    }
}

impl Drop for TrackedExecutor {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

/// Opens a fresh copy of a template [`MockExecutor`] per run.
#[derive(Debug, Clone)]
pub struct MockFactory {
    template: MockExecutor,
    refuse: Option<String>,
    opened: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl MockFactory {
    pub fn new(template: MockExecutor) -> Self {
        Self {
            template,
            refuse: None,
            opened: Rc::new(Cell::new(0)),
            released: Rc::new(Cell::new(0)),
        }
    }

    /// A factory whose database contains `rows`.
    pub fn with_rows(rows: Vec<CatalogRow>) -> Self {
        Self::new(MockExecutor::new().with_rows(rows))
    }

    /// Every `open` fails with [`ExtractionError::Connect`].
    pub fn refusing(message: &str) -> Self {
        let mut factory = Self::new(MockExecutor::new());
        factory.refuse = Some(message.to_string());
        factory
    }

    pub fn opened(&self) -> usize {
        self.opened.get()
    }

    pub fn released(&self) -> usize {
        self.released.get()
    }
}

impl ConnectionFactory for MockFactory {
    type Executor = TrackedExecutor;

    fn open(&self, _database_name: &str) -> Result<TrackedExecutor, ExtractionError> {
        if let Some(message) = &self.refuse {
            return Err(ExtractionError::Connect(message.clone()));
        }
        self.opened.set(self.opened.get() + 1);
        Ok(TrackedExecutor {
            inner: self.template.clone(),
            released: Rc::clone(&self.released),
        })
    }
}

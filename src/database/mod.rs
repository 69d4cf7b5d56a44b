//! # Database Coordinator
//!
//! The `Database` struct is the public entry point: it parses each
//! statement, resolves the target table through a process-wide registry of
//! open handles, translates the parsed arguments into storage calls, and
//! formats result rows as strings.
//!
//! ## Statement Pipeline
//!
//! ```text
//! SQL String
//!     │
//!     ▼
//! sql::parse → Statement (typed command + structured args)
//!     │
//!     ▼
//! registry lookup (open + cache on first reference)
//!     │
//!     ▼
//! coercion: untyped literals → Values, WHERE → Filter::Single,
//!           JOIN → child scan → Filter::Range on the parent
//!     │
//!     ▼
//! one Table operation → count or Vec<Row>
//!     │
//!     ▼
//! ExecuteResult (counts, or rows as cell strings)
//! ```
//!
//! A table handle moves `Created → Open` on first use and stays cached
//! until [`Database::cleanup`], which syncs and closes every open file.

mod builder;
mod convert;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{ensure, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::cancel::CancelToken;
use crate::sql::{
    self, CreateTableArgs, DeleteArgs, InsertArgs, JoinClause, SelectArgs, Statement, UpdateArgs,
};
use crate::storage::{Filter, RangeOp, Table};
use crate::types::{FieldValue, RowInput};

pub use builder::DatabaseBuilder;

/// Outcome of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    CreateTable { name: String },
    Insert { rows_affected: usize },
    Delete { rows_affected: usize },
    Update { rows_affected: usize },
    Select { rows: Vec<Vec<String>> },
}

/// An open database: a base directory plus the registry of open tables.
pub struct Database {
    base_dir: PathBuf,
    tables: RwLock<HashMap<String, Arc<Table>>>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Opens (or creates) a database rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Database> {
        Self::builder().path(path).open()
    }

    pub(crate) fn with_base_dir(base_dir: PathBuf) -> Database {
        Database {
            base_dir,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Parses and executes one SQL statement.
    pub fn execute(&self, statement: &str) -> Result<ExecuteResult> {
        self.execute_with_cancel(statement, &CancelToken::never())
    }

    /// Parses and executes one SQL statement, polling `cancel` at the
    /// storage layer's safe points.
    pub fn execute_with_cancel(
        &self,
        statement: &str,
        cancel: &CancelToken,
    ) -> Result<ExecuteResult> {
        match sql::parse(statement)? {
            Statement::CreateTable(args) => self.create_table(args),
            Statement::Select(args) => self.select(args, cancel),
            Statement::Insert(args) => self.insert(args, cancel),
            Statement::Delete(args) => self.delete(args, cancel),
            Statement::Update(args) => self.update(args, cancel),
        }
    }

    /// Syncs and closes every open table. The registry is emptied; tables
    /// reopen lazily if the database is used again.
    pub fn cleanup(&self) -> Result<()> {
        let mut tables = self.tables.write();
        for (_, table) in tables.drain() {
            table.sync()?;
        }
        Ok(())
    }

    /// Returns the cached handle for `name`, opening the table on first
    /// reference.
    fn table(&self, name: &str) -> Result<Arc<Table>> {
        if let Some(table) = self.tables.read().get(name) {
            return Ok(table.clone());
        }

        let mut tables = self.tables.write();
        if let Some(table) = tables.get(name) {
            return Ok(table.clone());
        }
        let table = Arc::new(Table::open(&self.base_dir, name)?);
        tables.insert(name.to_string(), table.clone());
        Ok(table)
    }

    fn create_table(&self, args: CreateTableArgs) -> Result<ExecuteResult> {
        let mut tables = self.tables.write();
        ensure!(
            !tables.contains_key(&args.table),
            "table \"{}\" already exists",
            args.table
        );

        let table = Arc::new(Table::create(&self.base_dir, &args.table, args.fields)?);
        tables.insert(args.table.clone(), table);

        Ok(ExecuteResult::CreateTable { name: args.table })
    }

    fn insert(&self, args: InsertArgs, cancel: &CancelToken) -> Result<ExecuteResult> {
        let table = self.table(&args.table)?;

        let input = match &args.columns {
            None => {
                ensure!(
                    args.values.len() == table.fields().len(),
                    "mismatched number of values to fields: {} values, {} fields",
                    args.values.len(),
                    table.fields().len()
                );
                let values = table
                    .fields()
                    .iter()
                    .zip(&args.values)
                    .map(|(field, raw)| convert::coerce(raw, field, table.name()))
                    .collect::<Result<Vec<_>>>()?;
                RowInput::Positional(values)
            }
            Some(columns) => {
                let keyed = columns
                    .iter()
                    .zip(&args.values)
                    .map(|(column, raw)| {
                        let field = table.field_with_name(column)?;
                        let value = convert::coerce(raw, field, table.name())?;
                        Ok(FieldValue::new(column.clone(), value))
                    })
                    .collect::<Result<Vec<_>>>()?;
                RowInput::Keyed(keyed)
            }
        };

        let rows_affected = table.insert_row(input, cancel)?;
        Ok(ExecuteResult::Insert { rows_affected })
    }

    fn select(&self, args: SelectArgs, cancel: &CancelToken) -> Result<ExecuteResult> {
        let table = self.table(&args.table)?;

        let mut filters = Vec::new();
        for join in &args.joins {
            filters.push(self.semi_join_filter(&table, join, cancel)?);
        }
        if let Some(clause) = &args.filter {
            filters.push(convert::filter_from_where(&table, clause)?);
        }

        let rows = table.rows(&args.fields, &filters, cancel)?;
        Ok(ExecuteResult::Select {
            rows: rows.iter().map(convert::format_row).collect(),
        })
    }

    /// Turns one JOIN clause into a value-set filter on the parent scan:
    /// scan the child (applying the join's own WHERE), collect the
    /// child-side column of the ON equation, and accept parent rows whose
    /// column matches any collected value.
    fn semi_join_filter(
        &self,
        parent: &Table,
        join: &JoinClause,
        cancel: &CancelToken,
    ) -> Result<Filter> {
        parent.field_with_name(&join.parent_field)?;

        let child = self.table(&join.child)?;
        let mut child_filters = Vec::new();
        if let Some(clause) = &join.filter {
            child_filters.push(convert::filter_from_where(&child, clause)?);
        }

        let child_rows = child.rows(
            std::slice::from_ref(&join.child_field),
            &child_filters,
            cancel,
        )?;
        let values = child_rows
            .into_iter()
            .filter_map(|mut row| row.values.pop())
            .collect();

        Ok(Filter::Range {
            field: join.parent_field.clone(),
            op: RangeOp::Eq,
            values,
        })
    }

    fn delete(&self, args: DeleteArgs, cancel: &CancelToken) -> Result<ExecuteResult> {
        let table = self.table(&args.table)?;

        let mut filters = Vec::new();
        if let Some(clause) = &args.filter {
            filters.push(convert::filter_from_where(&table, clause)?);
        }

        let rows_affected = table.delete_rows(&filters, cancel)?;
        Ok(ExecuteResult::Delete { rows_affected })
    }

    fn update(&self, args: UpdateArgs, cancel: &CancelToken) -> Result<ExecuteResult> {
        let table = self.table(&args.table)?;

        let values = args
            .assignments
            .iter()
            .map(|assignment| {
                let field = table.field_with_name(&assignment.field)?;
                let value = convert::coerce(&assignment.value, field, table.name())?;
                Ok(FieldValue::new(assignment.field.clone(), value))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut filters = Vec::new();
        if let Some(clause) = &args.filter {
            filters.push(convert::filter_from_where(&table, clause)?);
        }

        let rows_affected = table.update_rows(&values, &filters, cancel)?;
        Ok(ExecuteResult::Update { rows_affected })
    }
}

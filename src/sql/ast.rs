//! Typed command values produced by the parser.
//!
//! A parsed statement is exactly one [`Statement`] variant carrying a
//! fully-structured argument record. Literal payloads stay as raw strings
//! (`UntypedValue` in spirit): the coordinator coerces them against the
//! target field's primitive, because only it knows the schema.

use crate::storage::Operator;
use crate::types::Field;

/// One executable SQL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableArgs),
    Select(SelectArgs),
    Insert(InsertArgs),
    Delete(DeleteArgs),
    Update(UpdateArgs),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableArgs {
    pub table: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectArgs {
    pub table: String,
    /// Requested column names; empty when `all_fields` is set.
    pub fields: Vec<String>,
    /// True for `SELECT *`.
    pub all_fields: bool,
    pub joins: Vec<JoinClause>,
    pub filter: Option<WhereClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertArgs {
    pub table: String,
    /// Explicit column list, if one was written. `None` means the values
    /// are positional over all fields in declaration order.
    pub columns: Option<Vec<String>>,
    /// Raw value literals, quote groups already unwrapped.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteArgs {
    pub table: String,
    pub filter: Option<WhereClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateArgs {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub filter: Option<WhereClause>,
}

/// One `field = value` pair from an UPDATE SET list.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: String,
    pub value: String,
}

/// A three-token comparison from a WHERE clause. The value stays untyped
/// until the coordinator resolves the field's primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

/// Join position modifier. Parsed and recorded; execution treats every
/// join as a semi-join against the child table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinLocation {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

/// `[loc] JOIN child ON parent.field = child.field [WHERE ...]`.
/// The attached WHERE applies to the child-table scan.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub location: JoinLocation,
    pub child: String,
    pub parent_field: String,
    pub child_field: String,
    pub filter: Option<WhereClause>,
}

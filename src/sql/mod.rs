//! # SQL Processing
//!
//! Hand-written tokenizer and grammar for the supported statement surface.
//!
//! ## Module Structure
//!
//! - `token`: group-token kinds, the keyword set, the symbol set
//! - `lexer`: normalization pass and the single-pass group tokenizer
//! - `ast`: typed command values with structured argument records
//! - `parser`: command discrimination and per-command argument capture
//!
//! ## Pipeline
//!
//! ```text
//! "SELECT name FROM users WHERE id = 1"
//!     │ normalize (quote-aware)
//!     ▼
//! "SELECT name FROM users WHERE id=1"
//!     │ tokenize
//!     ▼
//! [Value(SELECT)] [Value(name)] [Value(FROM)] [Value(users)]
//! [Value(WHERE)] [Value(id)] [SymbolGroup(=)] [Value(1)]
//!     │ parse
//!     ▼
//! Statement::Select(SelectArgs { table, fields, joins, filter })
//! ```
//!
//! Syntax and shallow semantic errors (unknown operator, duplicate insert
//! column, malformed field declaration) are reported here. Deep semantic
//! errors (unknown column, type mismatch) are deferred to the coordinator,
//! which owns the schemas.

mod ast;
mod lexer;
mod parser;
mod token;

pub use ast::{
    Assignment, CreateTableArgs, DeleteArgs, InsertArgs, JoinClause, JoinLocation, SelectArgs,
    Statement, UpdateArgs, WhereClause,
};
pub use lexer::{normalize, tokenize};
pub use parser::{parse, validate};
pub use token::{Keyword, Token};

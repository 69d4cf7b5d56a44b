//! # RowDB - Embedded Fixed-Width Row Database
//!
//! RowDB is an embedded SQL database for a single process. Each table lives
//! in its own backing file as a dense array of fixed-width rows behind a
//! self-describing header, and a hand-written tokenizer/parser turns SQL
//! statements into typed commands that the coordinator maps onto storage
//! operations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │       Public API (Database)         │
//! ├─────────────────────────────────────┤
//! │   SQL Layer (Lexer/Parser → AST)    │
//! ├─────────────────────────────────────┤
//! │  Coordinator (registry, coercion,   │
//! │   semi-join filters, formatting)    │
//! ├─────────────────────────────────────┤
//! │  Storage Engine (Table: scan,       │
//! │   insert, compacting delete,        │
//! │   in-place update)                  │
//! ├─────────────────────────────────────┤
//! │  Positional File I/O (read_at /     │
//! │   write_at, one file per table)     │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! One file per table at `<base_dir>/<table>-db`:
//!
//! ```text
//! Offset          Size                    Description
//! 0               8                       header length, little-endian u64
//! 8               header_len - 8          serialized schema (name + fields)
//! header_len      row_count * row_bytes   dense fixed-width rows
//! ```
//!
//! Cell widths are fixed per type: strings 1024 bytes (NUL-padded UTF-8),
//! ints and floats 8 bytes little-endian, bools 1 byte. Rows are dense:
//! deleting shifts the survivors toward the file start, so row index `k`
//! always sits at `header_len + k * row_bytes`.
//!
//! ## SQL Surface
//!
//! ```text
//! CREATE TABLE <name> (<col> <type> [, <col> <type>]*)
//! INSERT INTO <name> [(<col>, ...)] VALUES (<v>, ...)
//! SELECT {*|<col>, ...} FROM <name>
//!        [<loc>? JOIN <child> ON <t>.<col> = <t>.<col> [WHERE ...]]*
//!        [WHERE <col> <op> <val>]
//! UPDATE <name> SET <col>=<v> [, <col>=<v>]* [WHERE <col> <op> <val>]
//! DELETE FROM <name> [WHERE <col> <op> <val>]
//! ```
//!
//! Types: `string`, `int`, `float`, `bool`. Operators: `= != < <= > >=`.
//! Keywords are case-insensitive, identifiers case-sensitive.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowdb::Database;
//!
//! let db = Database::open("./database")?;
//!
//! db.execute("CREATE TABLE users (id int, name string)")?;
//! db.execute("INSERT INTO users VALUES (1, \"Alice\")")?;
//!
//! let result = db.execute("SELECT name FROM users WHERE id = 1")?;
//! db.cleanup()?;
//! ```
//!
//! ## Concurrency
//!
//! Every `Table` owns a reader/writer lock covering the file and its
//! geometry counters. Scans run under the shared lock, mutations under the
//! exclusive lock; update holds the exclusive lock across its scan and
//! write phases. A [`CancelToken`] threaded through every storage operation
//! is polled between rows and between compaction chunks.
//!
//! ## Module Overview
//!
//! - [`types`]: primitives, fields, runtime values, the cell codec
//! - [`sql`]: tokenizer, statement grammar, typed command AST
//! - [`storage`]: table files, filters, scan/insert/delete/update
//! - [`database`]: coordinator, open-table registry, result formatting
//! - [`cancel`]: cooperative cancellation token
//! - [`config`]: layout constants and tunables

pub mod cancel;
pub mod config;
pub mod database;
pub mod sql;
pub mod storage;
pub mod types;

pub use cancel::CancelToken;
pub use database::{Database, DatabaseBuilder, ExecuteResult};
pub use storage::{Filter, Operator, RangeOp, Table};
pub use types::{Field, FieldValue, Primitive, Row, RowInput, Value};

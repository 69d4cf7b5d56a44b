//! # Type System
//!
//! The primitives a table can store, the fields that make up a schema, and
//! the runtime [`Value`] representation together with its fixed-width cell
//! codec.
//!
//! Every primitive has a byte width known at compile time; a row is the
//! concatenation of its cells in declared field order, so the whole row
//! geometry (`row_bytes`, cell offsets) derives from the schema alone.

mod primitive;
mod value;

pub use primitive::Primitive;
pub use value::{Field, FieldValue, Row, RowInput, Value};

//! The table handle and its storage operations.
//!
//! A `Table` owns the backing file and a reader/writer lock that guards
//! every byte of it, together with the derived geometry: `row_bytes` (sum
//! of the fixed cell widths), `header_bytes` (length of the serialized
//! header region), and the live `row_count` / `file_size` pair.
//!
//! Deleting compacts: the survivors between deleted rows form contiguous
//! chunks that all shift by the same number of row slots toward the file
//! start. Chunks above the 5 MiB cap are split at their midpoint until
//! they fit, then moved in ascending order with positional I/O so shifted
//! content never lands on a survivor range that has not been read yet.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use eyre::{bail, ensure, eyre, Result, WrapErr};
use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::cancel::CancelToken;
use crate::config::{COMPACT_CHUNK_BYTES, LENGTH_PREFIX_BYTES, TABLE_FILE_SUFFIX};
use crate::storage::filter::Filter;
use crate::storage::header::TableHeader;
use crate::types::{Field, FieldValue, Primitive, Row, RowInput, Value};

/// Mutable file geometry, updated together under the table lock.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    row_count: u64,
    file_size: u64,
}

/// An open table: schema, backing file, and row geometry.
#[derive(Debug)]
pub struct Table {
    name: String,
    fields: Vec<Field>,
    file: File,
    path: PathBuf,
    row_bytes: u64,
    header_bytes: u64,
    state: RwLock<Geometry>,
}

/// A contiguous run of surviving rows `[start, end)` that moves `shift`
/// row slots toward the file start during compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShiftChunk {
    start: u64,
    end: u64,
    shift: u64,
}

fn table_file_path(base_dir: &Path, name: &str) -> PathBuf {
    base_dir.join(format!("{}{}", name, TABLE_FILE_SUFFIX))
}

impl Table {
    /// Creates the backing file for a new table and writes its header.
    /// Fails if a table with this name already has a file.
    pub fn create(base_dir: &Path, name: &str, fields: Vec<Field>) -> Result<Table> {
        ensure!(!fields.is_empty(), "table must have at least one field");
        let mut seen = HashSet::new();
        for field in &fields {
            ensure!(
                seen.insert(field.name.as_str()),
                "duplicate field name: {}",
                field.name
            );
        }
        drop(seen);

        fs::create_dir_all(base_dir).wrap_err_with(|| {
            format!(
                "failed to create database directory '{}'",
                base_dir.display()
            )
        })?;

        let path = table_file_path(base_dir, name);
        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("table \"{}\" already exists", name)
            }
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("failed to create table file '{}'", path.display()))
            }
        };

        let header = TableHeader::new(name, fields.clone()).encode()?;
        file.write_all_at(&header, 0)
            .wrap_err_with(|| format!("failed to write table header to '{}'", path.display()))?;

        let header_bytes = header.len() as u64;
        Ok(Table {
            name: name.to_string(),
            row_bytes: row_bytes_for(&fields),
            fields,
            file,
            path,
            header_bytes,
            state: RwLock::new(Geometry {
                row_count: 0,
                file_size: header_bytes,
            }),
        })
    }

    /// Opens an existing table file and derives its geometry from the
    /// header and the file size.
    pub fn open(base_dir: &Path, name: &str) -> Result<Table> {
        let path = table_file_path(base_dir, name);
        let file = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                bail!("table \"{}\" does not exist", name)
            }
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("failed to open table file '{}'", path.display()))
            }
        };

        let mut prefix = [0u8; LENGTH_PREFIX_BYTES as usize];
        file.read_exact_at(&mut prefix, 0)
            .map_err(|e| eyre!("corrupted table file '{}': no header length: {}", path.display(), e))?;
        let header_bytes = u64::from_le_bytes(prefix);
        ensure!(
            header_bytes > LENGTH_PREFIX_BYTES,
            "corrupted table file '{}': header length {} is impossible",
            path.display(),
            header_bytes
        );

        let mut schema = vec![0u8; (header_bytes - LENGTH_PREFIX_BYTES) as usize];
        file.read_exact_at(&mut schema, LENGTH_PREFIX_BYTES)
            .map_err(|e| eyre!("corrupted table file '{}': short header: {}", path.display(), e))?;
        let header = TableHeader::decode(&schema)
            .wrap_err_with(|| format!("corrupted table file '{}'", path.display()))?;
        ensure!(
            !header.fields.is_empty(),
            "corrupted table file '{}': empty field list",
            path.display()
        );

        let row_bytes = row_bytes_for(&header.fields);
        let file_size = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat table file '{}'", path.display()))?
            .len();
        ensure!(
            file_size >= header_bytes,
            "corrupted table file '{}': {} bytes is smaller than its header",
            path.display(),
            file_size
        );

        let data_bytes = file_size - header_bytes;
        ensure!(
            data_bytes % row_bytes == 0,
            "corrupted table file '{}': {} data bytes is not a whole number of {}-byte rows",
            path.display(),
            data_bytes,
            row_bytes
        );

        Ok(Table {
            name: header.name,
            fields: header.fields,
            file,
            path,
            row_bytes,
            header_bytes,
            state: RwLock::new(Geometry {
                row_count: data_bytes / row_bytes,
                file_size,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_bytes(&self) -> u64 {
        self.row_bytes
    }

    pub fn header_bytes(&self) -> u64 {
        self.header_bytes
    }

    pub fn row_count(&self) -> u64 {
        self.state.read().row_count
    }

    pub fn file_size(&self) -> u64 {
        self.state.read().file_size
    }

    pub fn field_with_name(&self, field_name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == field_name)
            .ok_or_else(|| eyre!("{}.{} does not exist", self.name, field_name))
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.fields.iter().any(|f| f.name == field_name)
    }

    pub fn has_field_with_type(&self, field_name: &str, primitive: Primitive) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == field_name && f.primitive == primitive)
    }

    /// Flushes the backing file to disk.
    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_all()
            .wrap_err_with(|| format!("failed to sync table file '{}'", self.path.display()))
    }

    /// Appends one whole row. Positional values cover the fields in
    /// declaration order; keyed values may name any subset of fields, and
    /// every uncovered cell is written as zero bytes. Returns the number
    /// of rows written, which is always 1.
    pub fn insert_row(&self, values: RowInput, cancel: &CancelToken) -> Result<usize> {
        let mut buf = Vec::with_capacity(self.row_bytes as usize);

        match &values {
            RowInput::Positional(positional) => {
                ensure!(
                    positional.len() <= self.fields.len(),
                    "row has {} values but table \"{}\" has {} fields",
                    positional.len(),
                    self.name,
                    self.fields.len()
                );
                for (i, field) in self.fields.iter().enumerate() {
                    match positional.get(i) {
                        Some(value) => self.encode_cell(field, value, &mut buf)?,
                        None => zero_fill(field, &mut buf),
                    }
                }
            }
            RowInput::Keyed(keyed) => {
                let mut seen = HashSet::new();
                for fv in keyed {
                    self.field_with_name(&fv.field)?;
                    ensure!(
                        seen.insert(fv.field.as_str()),
                        "cannot insert into the same column twice: {}",
                        fv.field
                    );
                }
                for field in &self.fields {
                    match keyed.iter().find(|fv| fv.field == field.name) {
                        Some(fv) => self.encode_cell(field, &fv.value, &mut buf)?,
                        None => zero_fill(field, &mut buf),
                    }
                }
            }
        }
        debug_assert_eq!(buf.len() as u64, self.row_bytes);

        cancel.bail_if_cancelled()?;

        let mut state = self.state.write();
        self.file
            .write_all_at(&buf, state.file_size)
            .wrap_err_with(|| format!("failed to append row to '{}'", self.path.display()))?;
        state.file_size += self.row_bytes;
        state.row_count += 1;

        Ok(1)
    }

    /// Scans every row and returns the ones every filter accepts, with
    /// their on-disk indices. The shared lock is held for the whole scan;
    /// returned rows are owned by the caller.
    pub fn rows_that_match(&self, filters: &[Filter], cancel: &CancelToken) -> Result<Vec<Row>> {
        self.validate_filters(filters)?;
        let state = self.state.read();
        self.scan_locked(&state, filters, cancel)
    }

    /// Scans with filters, then projects each row to the requested fields
    /// in schema order. An empty field list means all fields.
    pub fn rows(&self, fields: &[String], filters: &[Filter], cancel: &CancelToken) -> Result<Vec<Row>> {
        for name in fields {
            ensure!(self.has_field(name), "{}.{} does not exist", self.name, name);
        }

        let matched = self.rows_that_match(filters, cancel)?;
        if fields.is_empty() {
            return Ok(matched);
        }

        let selected: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| fields.iter().any(|n| *n == f.name))
            .map(|(i, _)| i)
            .collect();

        Ok(matched
            .into_iter()
            .map(|row| Row {
                values: selected.iter().map(|&i| row.values[i].clone()).collect(),
                index: row.index,
            })
            .collect())
    }

    /// Deletes every matching row and compacts the file. An empty filter
    /// list truncates straight to the header. Returns the deleted count.
    pub fn delete_rows(&self, filters: &[Filter], cancel: &CancelToken) -> Result<usize> {
        if filters.is_empty() {
            let mut state = self.state.write();
            let removed = state.row_count;
            self.file
                .set_len(self.header_bytes)
                .wrap_err_with(|| format!("failed to truncate '{}'", self.path.display()))?;
            state.row_count = 0;
            state.file_size = self.header_bytes;
            return Ok(removed as usize);
        }

        self.validate_filters(filters)?;
        cancel.bail_if_cancelled()?;

        let mut state = self.state.write();
        let matched = self.scan_locked(&state, filters, cancel)?;
        if matched.is_empty() {
            return Ok(0);
        }
        let deleted: Vec<u64> = matched.iter().map(|row| row.index).collect();

        let cap_rows = (COMPACT_CHUNK_BYTES / self.row_bytes).max(1);
        let mut chunks = Vec::new();
        for chunk in survivor_chunks(&deleted, state.row_count) {
            split_chunk(chunk, cap_rows, &mut chunks);
        }

        for chunk in &chunks {
            cancel.bail_if_cancelled()?;
            let byte_len = (chunk.end - chunk.start) * self.row_bytes;
            let mut buf = vec![0u8; byte_len as usize];
            let src = self.header_bytes + chunk.start * self.row_bytes;
            let dst = self.header_bytes + (chunk.start - chunk.shift) * self.row_bytes;
            self.file.read_exact_at(&mut buf, src).map_err(|e| {
                eyre!(
                    "corrupted table file '{}': unreadable rows {}..{}: {}",
                    self.path.display(),
                    chunk.start,
                    chunk.end,
                    e
                )
            })?;
            self.file
                .write_all_at(&buf, dst)
                .wrap_err_with(|| format!("failed to shift rows in '{}'", self.path.display()))?;
        }

        let removed = deleted.len() as u64;
        state.row_count -= removed;
        state.file_size -= removed * self.row_bytes;
        self.file
            .set_len(state.file_size)
            .wrap_err_with(|| format!("failed to truncate '{}'", self.path.display()))?;

        Ok(removed as usize)
    }

    /// Rewrites every matching row with the keyed overrides applied.
    /// Rows whose overridden cells already hold the new values are left
    /// untouched and not counted. The exclusive lock covers both the scan
    /// and the writes, so the matched indices cannot go stale.
    pub fn update_rows(
        &self,
        values: &[FieldValue],
        filters: &[Filter],
        cancel: &CancelToken,
    ) -> Result<usize> {
        ensure!(!values.is_empty(), "update requires at least one value");
        let mut seen = HashSet::new();
        for fv in values {
            let field = self.field_with_name(&fv.field)?;
            ensure!(
                fv.value.primitive() == field.primitive,
                "{}.{} must be of type {}",
                self.name,
                field.name,
                field.primitive
            );
            ensure!(
                seen.insert(fv.field.as_str()),
                "cannot SET the same column twice: {}",
                fv.field
            );
        }
        self.validate_filters(filters)?;
        cancel.bail_if_cancelled()?;

        let state = self.state.write();
        let matched = self.scan_locked(&state, filters, cancel)?;

        let mut buf = Vec::with_capacity(self.row_bytes as usize);
        let mut updated = 0;
        for row in &matched {
            buf.clear();
            let mut changed = false;
            for (i, field) in self.fields.iter().enumerate() {
                let cell = match values.iter().find(|fv| fv.field == field.name) {
                    Some(fv) => {
                        if fv.value != row.values[i] {
                            changed = true;
                        }
                        &fv.value
                    }
                    None => &row.values[i],
                };
                cell.encode_into(&mut buf);
            }
            if !changed {
                continue;
            }

            cancel.bail_if_cancelled()?;
            let offset = self.header_bytes + row.index * self.row_bytes;
            self.file
                .write_all_at(&buf, offset)
                .wrap_err_with(|| format!("failed to rewrite row in '{}'", self.path.display()))?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Reads and filters all rows. The caller must hold the table lock in
    /// either mode; `geometry` is the locked-in view of the file.
    fn scan_locked(
        &self,
        geometry: &Geometry,
        filters: &[Filter],
        cancel: &CancelToken,
    ) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut buf = vec![0u8; self.row_bytes as usize];

        for index in 0..geometry.row_count {
            cancel.bail_if_cancelled()?;

            let offset = self.header_bytes + index * self.row_bytes;
            self.file.read_exact_at(&mut buf, offset).map_err(|e| {
                eyre!(
                    "corrupted table file '{}': row {} unreadable: {}",
                    self.path.display(),
                    index,
                    e
                )
            })?;

            let mut values = Vec::with_capacity(self.fields.len());
            let mut keep = true;
            let mut cell_start = 0;
            for field in &self.fields {
                let width = field.primitive.size() as usize;
                let cell = Value::decode(field.primitive, &buf[cell_start..cell_start + width])
                    .wrap_err_with(|| {
                        format!("corrupted table file '{}'", self.path.display())
                    })?;
                cell_start += width;

                for filter in filters {
                    if filter.field() == field.name && !filter.matches(&cell) {
                        keep = false;
                        break;
                    }
                }
                if !keep {
                    break;
                }
                values.push(cell);
            }

            if keep {
                rows.push(Row { values, index });
            }
        }

        Ok(rows)
    }

    /// Rejects filters naming unknown fields or carrying values of the
    /// wrong primitive.
    fn validate_filters(&self, filters: &[Filter]) -> Result<()> {
        for filter in filters {
            let field = self.field_with_name(filter.field())?;
            let check = |value: &Value| -> Result<()> {
                ensure!(
                    value.primitive() == field.primitive,
                    "filter on {}.{} expects type {}, got {}",
                    self.name,
                    field.name,
                    field.primitive,
                    value.primitive()
                );
                Ok(())
            };
            match filter {
                Filter::Single { value, .. } => check(value)?,
                Filter::Range { values, .. } => {
                    for value in values {
                        check(value)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn encode_cell(&self, field: &Field, value: &Value, buf: &mut Vec<u8>) -> Result<()> {
        ensure!(
            value.primitive() == field.primitive,
            "{}.{} must be of type {}",
            self.name,
            field.name,
            field.primitive
        );
        value.encode_into(buf);
        Ok(())
    }
}

fn row_bytes_for(fields: &[Field]) -> u64 {
    fields.iter().map(|f| f.primitive.size()).sum()
}

fn zero_fill(field: &Field, buf: &mut Vec<u8>) {
    buf.resize(buf.len() + field.primitive.size() as usize, 0);
}

/// Builds the shift chunks for one delete: each maximal run of survivors
/// between deleted indices, carrying the count of deletions before it.
/// The run before the first deletion has shift 0 and is omitted; it does
/// not move. `deleted` must be sorted ascending, which scan order
/// guarantees.
fn survivor_chunks(deleted: &[u64], row_count: u64) -> Vec<ShiftChunk> {
    let mut chunks = Vec::new();
    let mut run_start = 0;

    for (i, &d) in deleted.iter().enumerate() {
        let shift = i as u64;
        if d > run_start && shift > 0 {
            chunks.push(ShiftChunk {
                start: run_start,
                end: d,
                shift,
            });
        }
        run_start = d + 1;
    }

    let shift = deleted.len() as u64;
    if run_start < row_count {
        chunks.push(ShiftChunk {
            start: run_start,
            end: row_count,
            shift,
        });
    }

    chunks
}

/// Splits a chunk at its midpoint until every piece is at most `cap_rows`
/// rows; the halves inherit the parent's shift. Output order stays
/// ascending, which the compaction loop depends on.
fn split_chunk(chunk: ShiftChunk, cap_rows: u64, out: &mut Vec<ShiftChunk>) {
    if chunk.end - chunk.start <= cap_rows {
        out.push(chunk);
        return;
    }
    let mid = chunk.start + (chunk.end - chunk.start) / 2;
    split_chunk(
        ShiftChunk {
            start: chunk.start,
            end: mid,
            shift: chunk.shift,
        },
        cap_rows,
        out,
    );
    split_chunk(
        ShiftChunk {
            start: mid,
            end: chunk.end,
            shift: chunk.shift,
        },
        cap_rows,
        out,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_fields() -> Vec<Field> {
        vec![
            Field::new("id", Primitive::Int),
            Field::new("name", Primitive::Str),
        ]
    }

    fn insert_pair(table: &Table, id: i64, name: &str) {
        table
            .insert_row(
                RowInput::Positional(vec![Value::Int(id), Value::Str(name.to_string())]),
                &CancelToken::never(),
            )
            .unwrap();
    }

    #[test]
    fn create_then_open_preserves_the_schema() {
        let dir = tempdir().unwrap();

        let created = Table::create(dir.path(), "users", test_fields()).unwrap();
        assert_eq!(created.row_count(), 0);
        assert_eq!(created.file_size(), created.header_bytes());
        assert_eq!(created.row_bytes(), 8 + 1024);

        let opened = Table::open(dir.path(), "users").unwrap();
        assert_eq!(opened.name(), "users");
        assert_eq!(opened.fields(), created.fields());
        assert_eq!(opened.header_bytes(), created.header_bytes());
        assert_eq!(opened.row_count(), 0);
    }

    #[test]
    fn create_twice_fails_with_table_exists() {
        let dir = tempdir().unwrap();
        Table::create(dir.path(), "users", test_fields()).unwrap();

        let err = Table::create(dir.path(), "users", test_fields()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn open_missing_table_fails() {
        let dir = tempdir().unwrap();
        let err = Table::open(dir.path(), "ghost").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn create_rejects_duplicate_field_names() {
        let dir = tempdir().unwrap();
        let fields = vec![
            Field::new("id", Primitive::Int),
            Field::new("id", Primitive::Str),
        ];
        let err = Table::create(dir.path(), "t", fields).unwrap_err();
        assert!(err.to_string().contains("duplicate field name"));
    }

    #[test]
    fn insert_appends_exactly_one_row() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        insert_pair(&table, 1, "a");
        insert_pair(&table, 2, "b");

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.file_size(),
            table.header_bytes() + 2 * table.row_bytes()
        );

        let rows = table.rows_that_match(&[], &CancelToken::never()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], Value::Int(1));
        assert_eq!(rows[1].values[1], Value::Str("b".to_string()));
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn positional_insert_rejects_too_many_values() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        let err = table
            .insert_row(
                RowInput::Positional(vec![Value::Int(1), Value::Str("a".into()), Value::Int(2)]),
                &CancelToken::never(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("has 2 fields"));
    }

    #[test]
    fn keyed_insert_zero_fills_missing_cells() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        table
            .insert_row(
                RowInput::Keyed(vec![FieldValue::new("id", Value::Int(5))]),
                &CancelToken::never(),
            )
            .unwrap();

        let rows = table.rows_that_match(&[], &CancelToken::never()).unwrap();
        assert_eq!(rows[0].values[0], Value::Int(5));
        assert_eq!(rows[0].values[1], Value::Str(String::new()));
    }

    #[test]
    fn keyed_insert_rejects_unknown_field() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        let err = table
            .insert_row(
                RowInput::Keyed(vec![FieldValue::new("ghost", Value::Int(5))]),
                &CancelToken::never(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("users.ghost does not exist"));
    }

    #[test]
    fn insert_rejects_type_mismatch() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        let err = table
            .insert_row(
                RowInput::Positional(vec![Value::Str("oops".into()), Value::Str("a".into())]),
                &CancelToken::never(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("users.id must be of type int"));
    }

    #[test]
    fn scan_filters_reject_unknown_field_and_wrong_type() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();

        let unknown = Filter::Single {
            field: "ghost".to_string(),
            op: crate::storage::Operator::Eq,
            value: Value::Int(1),
        };
        let err = table
            .rows_that_match(&[unknown], &CancelToken::never())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let mistyped = Filter::Single {
            field: "id".to_string(),
            op: crate::storage::Operator::Eq,
            value: Value::Str("1".to_string()),
        };
        let err = table
            .rows_that_match(&[mistyped], &CancelToken::never())
            .unwrap_err();
        assert!(err.to_string().contains("expects type int"));
    }

    #[test]
    fn delete_compacts_and_preserves_survivor_order() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        for i in 0..6 {
            insert_pair(&table, i, &format!("row{}", i));
        }

        // delete ids 2 and 5
        let filter = Filter::Range {
            field: "id".to_string(),
            op: crate::storage::RangeOp::Eq,
            values: vec![Value::Int(2), Value::Int(5)],
        };
        let removed = table
            .delete_rows(&[filter], &CancelToken::never())
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(table.row_count(), 4);
        assert_eq!(
            table.file_size(),
            table.header_bytes() + 4 * table.row_bytes()
        );

        let rows = table.rows_that_match(&[], &CancelToken::never()).unwrap();
        let ids: Vec<&Value> = rows.iter().map(|r| &r.values[0]).collect();
        assert_eq!(
            ids,
            [&Value::Int(0), &Value::Int(1), &Value::Int(3), &Value::Int(4)]
        );
        let indices: Vec<u64> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn delete_without_filters_truncates_to_the_header() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        for i in 0..3 {
            insert_pair(&table, i, "x");
        }

        let removed = table.delete_rows(&[], &CancelToken::never()).unwrap();
        assert_eq!(removed, 3);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.file_size(), table.header_bytes());
    }

    #[test]
    fn delete_with_no_matches_returns_zero() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        insert_pair(&table, 1, "a");

        let filter = Filter::Single {
            field: "id".to_string(),
            op: crate::storage::Operator::Eq,
            value: Value::Int(99),
        };
        assert_eq!(
            table.delete_rows(&[filter], &CancelToken::never()).unwrap(),
            0
        );
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn update_counts_only_rows_that_changed() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        insert_pair(&table, 1, "a");
        insert_pair(&table, 2, "b");

        let set = vec![FieldValue::new("name", Value::Str("Z".to_string()))];
        let filter = Filter::Single {
            field: "id".to_string(),
            op: crate::storage::Operator::Eq,
            value: Value::Int(2),
        };

        let updated = table
            .update_rows(&set, std::slice::from_ref(&filter), &CancelToken::never())
            .unwrap();
        assert_eq!(updated, 1);

        // same statement again: the cell already holds the value
        let updated = table
            .update_rows(&set, std::slice::from_ref(&filter), &CancelToken::never())
            .unwrap();
        assert_eq!(updated, 0);

        let rows = table.rows_that_match(&[], &CancelToken::never()).unwrap();
        assert_eq!(rows[0].values[1], Value::Str("a".to_string()));
        assert_eq!(rows[1].values[1], Value::Str("Z".to_string()));
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn projection_follows_schema_order() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        insert_pair(&table, 7, "g");

        // request in reverse order; projection still returns id first
        let rows = table
            .rows(
                &["name".to_string(), "id".to_string()],
                &[],
                &CancelToken::never(),
            )
            .unwrap();
        assert_eq!(rows[0].values, vec![Value::Int(7), Value::Str("g".into())]);

        let err = table
            .rows(&["ghost".to_string()], &[], &CancelToken::never())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn cancelled_token_aborts_a_scan() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        insert_pair(&table, 1, "a");

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = table.rows_that_match(&[], &cancel).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn survivor_chunks_skip_the_unmoved_prefix() {
        // rows 0..6, deleting 2 and 5: [0,2) never moves, [3,5) shifts by
        // one slot, and nothing survives past index 5
        let chunks = survivor_chunks(&[2, 5], 6);
        assert_eq!(
            chunks,
            vec![ShiftChunk {
                start: 3,
                end: 5,
                shift: 1
            }]
        );
    }

    #[test]
    fn survivor_chunks_handle_leading_and_trailing_deletes() {
        // rows 0..5, deleting 0 and 4
        let chunks = survivor_chunks(&[0, 4], 5);
        assert_eq!(
            chunks,
            vec![ShiftChunk {
                start: 1,
                end: 4,
                shift: 1
            }]
        );
    }

    #[test]
    fn survivor_chunks_for_adjacent_deletes() {
        // rows 0..8, deleting 1,2,3
        let chunks = survivor_chunks(&[1, 2, 3], 8);
        assert_eq!(
            chunks,
            vec![ShiftChunk {
                start: 4,
                end: 8,
                shift: 3
            }]
        );
    }

    #[test]
    fn split_chunk_bounds_every_piece() {
        let mut out = Vec::new();
        split_chunk(
            ShiftChunk {
                start: 0,
                end: 10,
                shift: 2,
            },
            3,
            &mut out,
        );

        assert!(out.iter().all(|c| c.end - c.start <= 3));
        assert!(out.iter().all(|c| c.shift == 2));
        // pieces are contiguous and ascending
        assert_eq!(out.first().unwrap().start, 0);
        assert_eq!(out.last().unwrap().end, 10);
        for pair in out.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn corrupt_file_size_is_detected_on_open() {
        let dir = tempdir().unwrap();
        let table = Table::create(dir.path(), "users", test_fields()).unwrap();
        insert_pair(&table, 1, "a");
        let path = table.path().to_path_buf();
        drop(table);

        // chop a few bytes off the last row
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        file.set_len(len - 3).unwrap();
        drop(file);

        let err = Table::open(dir.path(), "users").unwrap_err();
        assert!(err.to_string().contains("not a whole number"));
    }
}

//! Table header serialization.
//!
//! The header is self-describing: the first eight bytes hold the total
//! header length (prefix included) as a little-endian u64, so a reader can
//! size the schema region before knowing anything about the table.
//!
//! ```text
//! Offset  Size  Description
//! 0       8     header length, little-endian u64, counts itself
//! 8       2     table name length, little-endian u16
//! 10      n     table name, UTF-8
//! 10+n    2     field count, little-endian u16
//! ...           per field: name length (u16), name bytes, type tag (u8)
//! ```

use eyre::{ensure, Result};

use crate::config::LENGTH_PREFIX_BYTES;
use crate::types::{Field, Primitive};

/// The schema half of a table file: its name and ordered field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub name: String,
    pub fields: Vec<Field>,
}

impl TableHeader {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Serializes the full header, length prefix included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; LENGTH_PREFIX_BYTES as usize];

        write_str(&mut buf, &self.name, "table name")?;

        ensure!(
            self.fields.len() <= u16::MAX as usize,
            "too many fields: {}",
            self.fields.len()
        );
        buf.extend_from_slice(&(self.fields.len() as u16).to_le_bytes());
        for field in &self.fields {
            write_str(&mut buf, &field.name, "field name")?;
            buf.push(field.primitive.as_tag());
        }

        let total = buf.len() as u64;
        buf[..LENGTH_PREFIX_BYTES as usize].copy_from_slice(&total.to_le_bytes());

        Ok(buf)
    }

    /// Deserializes the schema region (the bytes after the length prefix).
    pub fn decode(bytes: &[u8]) -> Result<TableHeader> {
        let mut cursor = Cursor { bytes, pos: 0 };

        let name = cursor.read_str()?;
        let field_count = cursor.read_u16()?;

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let field_name = cursor.read_str()?;
            let tag = cursor.read_u8()?;
            fields.push(Field::new(field_name, Primitive::try_from(tag)?));
        }
        ensure!(
            cursor.pos == bytes.len(),
            "corrupted table header: {} trailing bytes",
            bytes.len() - cursor.pos
        );

        Ok(TableHeader { name, fields })
    }
}

fn write_str(buf: &mut Vec<u8>, s: &str, what: &str) -> Result<()> {
    ensure!(
        s.len() <= u16::MAX as usize,
        "{} is too long: {} bytes",
        what,
        s.len()
    );
    buf.extend_from_slice(&(s.len() as u16).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8]> {
        ensure!(
            self.pos + n <= self.bytes.len(),
            "corrupted table header: truncated at byte {}",
            self.pos
        );
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn read_str(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let raw = self.take(len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| eyre::eyre!("corrupted table header: invalid UTF-8 name: {}", e))?;
        Ok(s.to_string())
    }
}

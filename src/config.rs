//! Layout constants and tunables.
//!
//! Everything here is fixed at compile time. The cell widths define the
//! on-disk row geometry and must never change for existing table files.

/// Fixed byte width of a string cell: UTF-8 bytes, NUL-padded.
pub const STRING_CELL_BYTES: u64 = 1024;

/// Advisory logical length of a string cell. Enforcement is by byte
/// length, not character count.
pub const STRING_MAX_CHARS: usize = 256;

/// Byte width of an int cell (little-endian i64).
pub const INT_CELL_BYTES: u64 = 8;

/// Byte width of a float cell (little-endian IEEE-754 binary64).
pub const FLOAT_CELL_BYTES: u64 = 8;

/// Byte width of a bool cell (0x00 or 0x01).
pub const BOOL_CELL_BYTES: u64 = 1;

/// Width of the header length prefix at file offset 0.
pub const LENGTH_PREFIX_BYTES: u64 = 8;

/// Upper bound on the byte size of a single survivor chunk moved during
/// delete compaction. Oversized chunks are split until they fit.
pub const COMPACT_CHUNK_BYTES: u64 = 5 * 1024 * 1024;

/// Default directory for table files when none is configured.
pub const DEFAULT_BASE_DIR: &str = "./database";

/// Suffix appended to the table name to form its file name.
pub const TABLE_FILE_SUFFIX: &str = "-db";

//! Database builder.
//!
//! Configures where table files live before opening the coordinator.
//! `Database::open(path)` is the common shorthand; the builder exists for
//! callers that want the default base directory spelled out or configured
//! from elsewhere.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};

use crate::config::DEFAULT_BASE_DIR;
use crate::database::Database;

/// Builder for configuring and opening a [`Database`].
pub struct DatabaseBuilder {
    base_dir: Option<PathBuf>,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Sets the directory table files live in. Created if absent.
    /// Defaults to `./database`.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.base_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Opens the database, creating the base directory if needed.
    pub fn open(self) -> Result<Database> {
        let base_dir = self
            .base_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));

        fs::create_dir_all(&base_dir).wrap_err_with(|| {
            format!(
                "failed to create database directory '{}'",
                base_dir.display()
            )
        })?;

        Ok(Database::with_base_dir(base_dir))
    }
}

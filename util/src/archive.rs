//! CSV archiving functionality
//!
//! Any `Serialize` record with flat fields (no nested structs or sequences)
//! can be written into an archive, one row per record.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fs::File;
use std::path::Path;
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,

    /// Number of records written so far
    num_records: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateFileError(std::io::Error),

    #[error("Cannot write a record to the archive: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive: {0}")]
    FlushError(std::io::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        Self::from_file_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given file, truncating it if it
    /// already exists.
    pub fn from_file_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let file = File::create(path).map_err(ArchiveError::CreateFileError)?;

        let writer = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer,
            num_records: 0
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer.serialize(record).map_err(ArchiveError::WriteError)?;
        self.num_records += 1;

        Ok(())
    }

    /// Serialise all records from an iterator, flushing once at the end.
    pub fn serialise_all<T, I>(&mut self, records: I) -> Result<(), ArchiveError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>
    {
        for r in records {
            self.serialise(r)?;
        }

        self.flush()
    }

    /// Flush buffered records to the file.
    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        self.writer.flush().map_err(ArchiveError::FlushError)
    }

    /// Number of records written so far.
    pub fn num_records(&self) -> usize {
        self.num_records
    }
}

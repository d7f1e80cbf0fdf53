use crate::core::io::containers::RawReference;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading reference-structure file formats.
///
/// Implementors handle format-specific parsing; the engine consumes the
/// format-neutral [`RawReference`] they produce. Writing is deliberately not
/// part of the interface: the metric engine never serializes structures.
pub trait ReferenceFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a raw reference configuration from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<RawReference, Self::Error>;

    /// Reads a raw reference configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<RawReference, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

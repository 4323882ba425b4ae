//! Error types for roster parsing and deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a roster or generating a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the DOCX roster document.
    #[error("DOCX parsing error: {0}")]
    DocxParseError(String),

    /// Failed to parse the PPTX template structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// The roster table is missing a required column.
    #[error("Roster header error: {0}")]
    HeaderError(String),

    /// The roster contains no teams after aggregation.
    #[error("Roster is empty: no team rows found")]
    EmptyRoster,

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (DOCX and PPTX are ZIP packages).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),
}

//! DOCX (OOXML) roster table extractor.
//!
//! Reads .docx files, which are ZIP archives containing XML documents,
//! and lifts their tables into raw rows of cell text.

pub mod reader;

pub use reader::DocxTableReader;
